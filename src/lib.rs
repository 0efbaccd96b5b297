pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServerConfig;

pub use app::{build_router, AppState};
pub use config::AppConfig;
pub use core::{form::Form, handler::handle};
pub use utils::error::{AppError, Result};
