//! HTTP front end for the postscrape engine.
pub mod config;
pub mod platform;
pub mod routes;

pub use config::{BrowserOverrides, ConfigError, ServerConfig};
pub use routes::{build_router, AppState, VERSION};
