pub mod app;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod feed;
pub mod geo;
pub mod logging;
pub mod models;
pub mod routes;
mod test_utils;

pub const VERSION: &str = "0.1.0";
