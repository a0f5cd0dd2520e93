pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

// Re-export handler functions for testing
pub use handlers::{
    get_config, get_health_check, passthrough_handler, reload_config, sample_handler, AppState,
};
pub use routes::create_router;
