pub mod admin;
pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod report;
pub mod seeds;
pub mod services;
pub mod store;
pub mod utils;
