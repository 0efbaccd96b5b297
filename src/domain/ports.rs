use crate::domain::model::ViewModel;
use crate::utils::error::Result;

/// Turns a view model into a response body.
pub trait Renderer: Send + Sync {
    fn render(&self, model: &ViewModel) -> Result<String>;

    fn content_type(&self) -> &'static str;
}
