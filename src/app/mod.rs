// Application layer: HTTP surface for the authentication module.

pub mod demos;
pub mod presenter;
pub mod server;

pub use server::{build_router, AppState};
