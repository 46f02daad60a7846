#![doc = "The `taskflow` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, authentication, services, routing and error"]
#![doc = "handling for the TaskFlow backend. The binary (`main.rs`) only reads"]
#![doc = "configuration, builds an [`state::AppState`] and mounts [`routes::config`]."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
