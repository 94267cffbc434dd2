use axum::{routing::get, Router};

use crate::controllers::home_controller;

pub fn add_routes(router: Router) -> Router {
    router
        .route("/", get(home_controller::home))
        .route("/health", get(home_controller::health))
}
