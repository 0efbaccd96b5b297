//! Small standalone walkthroughs of the support facilities, driven by the
//! `framework-demo` binary.

use crate::core::events::EventManager;
use crate::core::router::SegmentRoute;
use crate::core::services::{CountedHandle, InstanceCounter, ServiceSlot};
use crate::core::view::{
    JsonRenderer, TemplateMapResolver, TemplateRenderer, TemplateSource, View, ViewRequest,
};
use crate::domain::model::ViewModel;
use crate::domain::ports::Renderer;
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Two listeners on `Lundi`; the priority 2 one answers first.
pub fn event_demo() -> Vec<String> {
    let events = EventManager::new();
    events.attach("Lundi", 1, |e| Some(format!("Bonjour {}", e.param(0).unwrap_or(""))));
    events.attach("Lundi", 2, |_| Some("Ciao".to_string()));

    events
        .trigger("Lundi", None, vec![",nous sommes lundi".to_string()])
        .responses()
        .to_vec()
}

pub fn controller_route() -> Result<SegmentRoute> {
    SegmentRoute::builder("/:controller")
        .constraint("controller", "[A-Za-z]+")
        .build()
}

pub fn route_demo(uri: &str) -> Result<bool> {
    let route = controller_route()?;
    let matched = route.match_uri(uri)?;
    tracing::debug!("Route '{}' against {}: {:?}", route.pattern(), uri, matched);
    Ok(matched.is_some())
}

pub struct Promotion {
    _live: CountedHandle,
}

/// Fetches the promotion service twice and reports the live count after the
/// first fetch, after the second fetch, and once the first instance is released.
pub fn service_demo(shared: bool) -> Vec<usize> {
    let counter = InstanceCounter::new();
    let factory_counter = counter.clone();
    let factory = move || Promotion {
        _live: factory_counter.acquire(),
    };
    let slot = if shared {
        ServiceSlot::shared(factory)
    } else {
        ServiceSlot::per_call(factory)
    };

    let mut counts = Vec::new();
    let first = slot.get();
    counts.push(counter.current());
    let second = slot.get();
    counts.push(counter.current());
    drop(first);
    counts.push(counter.current());
    drop(second);
    counts
}

fn tintin_model() -> ViewModel {
    let mut model = ViewModel::new()
        .with_variable("nom", "tintin")
        .with_variable("title", "tintin")
        .with_variable("description", "bande dessinée")
        .with_variable("link", "http://manewa.fr");
    model.set_template("tintin");
    model
}

fn tintin_resolver(template: Option<&Path>) -> TemplateMapResolver {
    let mut resolver = TemplateMapResolver::builtin();
    if let Some(path) = template {
        resolver.add("tintin", TemplateSource::File(path.to_path_buf()));
    }
    resolver
}

pub fn view_demo(template: Option<&Path>) -> Result<String> {
    TemplateRenderer::new(&tintin_resolver(template))?.render(&tintin_model())
}

pub fn json_view_demo() -> Result<String> {
    JsonRenderer.render(&tintin_model())
}

/// Same page rendered through a `View`: one rendering strategy hands out the
/// template renderer, one response strategy copies the result into the response.
pub fn strategy_view_demo(template: Option<&Path>) -> Result<String> {
    let renderer: Arc<dyn Renderer> = Arc::new(TemplateRenderer::new(&tintin_resolver(template))?);

    let mut view = View::new();
    view.add_rendering_strategy(1, move |_, _| Some(Arc::clone(&renderer)));
    view.add_response_strategy(1, |response, output| {
        response.content = output.result.clone();
        response.content_type = output.content_type.to_string();
    });

    let model = ViewModel::new()
        .with_template("tintin")
        .with_variable("nom", "tintin");
    Ok(view.render(&model, &ViewRequest::default())?.content)
}
