pub mod home_controller;
