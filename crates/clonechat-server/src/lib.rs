//! Clone Chat HTTP gateway: router, shared state and operator commands.

pub mod commands;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
