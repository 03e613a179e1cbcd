pub mod config;
pub mod navigate;
pub mod routes;
