mod app;
pub mod auth;
pub mod config;
mod logging;
mod middleware;
pub mod routes;
mod state;
mod sweep;

pub use app::Server;
pub use logging::init_tracing;
pub use state::AppState;
