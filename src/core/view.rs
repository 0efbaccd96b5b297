use crate::domain::model::ViewModel;
use crate::domain::ports::Renderer;
use crate::utils::error::{AppError, Result};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context, Tera};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Inline(String),
}

impl TemplateSource {
    fn load(&self) -> Result<String> {
        match self {
            TemplateSource::File(path) => Ok(std::fs::read_to_string(path)?),
            TemplateSource::Inline(text) => Ok(text.clone()),
        }
    }
}

/// Maps template names to their sources.
#[derive(Debug, Clone, Default)]
pub struct TemplateMapResolver {
    map: BTreeMap<String, TemplateSource>,
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("../../templates/layout.html")),
    ("index", include_str!("../../templates/index.html")),
    ("auth/form", include_str!("../../templates/auth/form.html")),
    ("auth/welcome", include_str!("../../templates/auth/welcome.html")),
    ("tintin", include_str!("../../templates/tintin.html")),
];

impl TemplateMapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut resolver = Self::new();
        for (name, text) in BUILTIN_TEMPLATES {
            resolver.add(name, TemplateSource::Inline(text.to_string()));
        }
        resolver
    }

    /// Replaces every known template for which `<dir>/<name>.html` exists.
    pub fn with_directory(mut self, dir: &Path) -> Self {
        let names: Vec<String> = self.map.keys().cloned().collect();
        for name in names {
            let candidate = dir.join(format!("{}.html", name));
            if candidate.is_file() {
                tracing::debug!("Template '{}' overridden by {}", name, candidate.display());
                self.map.insert(name, TemplateSource::File(candidate));
            }
        }
        self
    }

    pub fn add(&mut self, name: &str, source: TemplateSource) {
        self.map.insert(name.to_string(), source);
    }

    pub fn resolve(&self, name: &str) -> Option<&TemplateSource> {
        self.map.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

/// Renders a view model through its named template.
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new(resolver: &TemplateMapResolver) -> Result<Self> {
        let mut sources = Vec::new();
        for name in resolver.names() {
            if let Some(source) = resolver.resolve(name) {
                sources.push((name.to_string(), source.load()?));
            }
        }

        let mut tera = Tera::default();
        // 模板名稱沒有副檔名，所有模板都要跳脫 HTML
        tera.autoescape_on(vec![""]);
        tera.add_raw_templates(sources)?;

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, model: &ViewModel) -> Result<String> {
        let name = model.template().ok_or_else(|| AppError::TemplateNotFound {
            name: "<unset>".to_string(),
        })?;
        if !self.has_template(name) {
            return Err(AppError::TemplateNotFound {
                name: name.to_string(),
            });
        }

        let context = Context::from_serialize(model.variables())?;
        Ok(self.tera.render(name, &context)?)
    }

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

/// Serializes the view variables; the template name is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, model: &ViewModel) -> Result<String> {
        Ok(serde_json::to_string(model.variables())?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// Request details a rendering strategy can look at.
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub accept: Option<String>,
}

impl ViewRequest {
    pub fn wants_json(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.contains("application/json"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewResponse {
    pub content: String,
    pub content_type: String,
}

pub struct RenderedOutput<'a> {
    pub model: &'a ViewModel,
    pub result: String,
    pub content_type: &'static str,
}

type RenderingStrategy =
    Box<dyn Fn(&ViewModel, &ViewRequest) -> Option<Arc<dyn Renderer>> + Send + Sync>;
type ResponseStrategy = Box<dyn Fn(&mut ViewResponse, &RenderedOutput<'_>) + Send + Sync>;

/// Picks a renderer through rendering strategies and hands the result to
/// response strategies. Without response strategies the rendered text and
/// its content type are copied into the response as-is.
#[derive(Default)]
pub struct View {
    rendering: Vec<(i32, RenderingStrategy)>,
    response: Vec<(i32, ResponseStrategy)>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rendering_strategy<F>(&mut self, priority: i32, strategy: F)
    where
        F: Fn(&ViewModel, &ViewRequest) -> Option<Arc<dyn Renderer>> + Send + Sync + 'static,
    {
        self.rendering.push((priority, Box::new(strategy)));
        self.rendering.sort_by_key(|(p, _)| Reverse(*p));
    }

    pub fn add_response_strategy<F>(&mut self, priority: i32, strategy: F)
    where
        F: Fn(&mut ViewResponse, &RenderedOutput<'_>) + Send + Sync + 'static,
    {
        self.response.push((priority, Box::new(strategy)));
        self.response.sort_by_key(|(p, _)| Reverse(*p));
    }

    pub fn render(&self, model: &ViewModel, request: &ViewRequest) -> Result<ViewResponse> {
        let renderer = self
            .rendering
            .iter()
            .find_map(|(_, strategy)| strategy(model, request))
            .ok_or(AppError::NoRenderer)?;

        let output = RenderedOutput {
            model,
            result: renderer.render(model)?,
            content_type: renderer.content_type(),
        };

        let mut response = ViewResponse::default();
        if self.response.is_empty() {
            response.content = output.result.clone();
            response.content_type = output.content_type.to_string();
        } else {
            for (_, strategy) in &self.response {
                strategy(&mut response, &output);
            }
        }

        tracing::debug!(
            "Rendered view {:?} as {} ({} bytes)",
            model.template(),
            output.content_type,
            response.content.len()
        );
        Ok(response)
    }
}
