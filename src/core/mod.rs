pub mod events;
pub mod form;
pub mod handler;
pub mod router;
pub mod services;
pub mod view;

pub use crate::domain::model::{FormSpec, RenderDecision, RequestMethod, SubmittedData};
pub use crate::domain::ports::Renderer;
pub use crate::utils::error::Result;
