pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
