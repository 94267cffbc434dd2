use axum::Router;

use crate::controllers::home_controller;

pub mod home_routes;

pub fn app() -> Router {
    let router = Router::new();

    let router = home_routes::add_routes(router);

    router.fallback(home_controller::not_found)
}
