use crate::app::presenter;
use crate::config::AppConfig;
use crate::core::events::EventManager;
use crate::core::form::Form;
use crate::core::handler::handle;
use crate::core::services::ServiceSlot;
use crate::core::view::{JsonRenderer, TemplateMapResolver, TemplateRenderer, View, ViewRequest};
use crate::domain::model::{RenderDecision, RequestMethod, SubmittedData, ViewModel};
use crate::domain::ports::Renderer;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::Validate;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form as FormBody, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const EVENT_FORM_DISPLAYED: &str = "auth.form.displayed";
pub const EVENT_LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const EVENT_LOGIN_FAILED: &str = "auth.login.failed";

/// Everything the handlers need, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub form: Arc<ServiceSlot<Form>>,
    pub view: Arc<View>,
    pub events: Arc<EventManager>,
}

impl AppState {
    /// 先驗證整份配置，之後 `build_router` 拿到的路徑必定可用
    pub fn bootstrap(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let form = Form::new(config.form.clone(), config.form_action())?;

        let mut resolver = TemplateMapResolver::builtin();
        if let Some(dir) = config.template_dir() {
            resolver = resolver.with_directory(&dir);
        }
        let templates: Arc<dyn Renderer> = Arc::new(TemplateRenderer::new(&resolver)?);
        let json: Arc<dyn Renderer> = Arc::new(JsonRenderer);

        let mut view = View::new();
        view.add_rendering_strategy(10, move |_, request| {
            request.wants_json().then(|| Arc::clone(&json))
        });
        view.add_rendering_strategy(1, move |_, _| Some(Arc::clone(&templates)));

        let events = EventManager::new();
        attach_audit_listeners(&events);

        tracing::info!(
            "Form '{}' ready on {} ({} fields)",
            form.spec().name,
            form.action(),
            form.spec().elements.len()
        );

        Ok(Self {
            form: Arc::new(ServiceSlot::from_instance(form)),
            view: Arc::new(view),
            events: Arc::new(events),
        })
    }
}

pub fn attach_audit_listeners(events: &EventManager) {
    events.attach(EVENT_FORM_DISPLAYED, 0, |e| {
        tracing::debug!("📝 Login form displayed ({})", e.target().unwrap_or("-"));
        None
    });
    events.attach(EVENT_LOGIN_SUCCEEDED, 0, |e| {
        tracing::info!("✅ Login accepted for '{}'", e.param(0).unwrap_or(""));
        None
    });
    events.attach(EVENT_LOGIN_FAILED, 0, |e| {
        tracing::warn!(
            "❌ Login rejected for '{}' (invalid: {})",
            e.param(0).unwrap_or(""),
            e.param(1).unwrap_or("")
        );
        None
    });
}

pub fn build_router(state: AppState) -> Router {
    let action = state.form.get().action().to_string();

    Router::new()
        .route("/", get(index))
        .route(&action, get(show_form).post(submit_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {} (Category: {:?})", self, self.category());
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

fn view_request(headers: &HeaderMap) -> ViewRequest {
    ViewRequest {
        accept: headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

fn render(state: &AppState, model: &ViewModel, headers: &HeaderMap) -> Result<Response> {
    let rendered = state.view.render(model, &view_request(headers))?;
    Ok((
        [(header::CONTENT_TYPE, rendered.content_type)],
        rendered.content,
    )
        .into_response())
}

fn publish(state: &AppState, form: &Form, method: RequestMethod, decision: &RenderDecision) {
    let target = Some(form.spec().name.clone());
    match decision {
        RenderDecision::RenderSuccess(welcome) => {
            state
                .events
                .trigger(EVENT_LOGIN_SUCCEEDED, target, vec![welcome.login.clone()]);
        }
        RenderDecision::RenderForm(_) if method == RequestMethod::Get => {
            state.events.trigger(EVENT_FORM_DISPLAYED, target, vec![]);
        }
        RenderDecision::RenderForm(form_state) => {
            let login = form_state
                .values
                .get(form.identity_field())
                .unwrap_or_default()
                .to_string();
            let fields = form_state
                .errors
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(",");
            state
                .events
                .trigger(EVENT_LOGIN_FAILED, target, vec![login, fields]);
        }
    }
}

fn respond(
    state: &AppState,
    method: RequestMethod,
    submitted: Option<&SubmittedData>,
    headers: &HeaderMap,
) -> Result<Response> {
    let form = state.form.get();
    let decision = handle(method, &form, submitted);
    publish(state, &form, method, &decision);

    let model = presenter::decision_view(&form, &decision)?;
    render(state, &model, headers)
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let form = state.form.get();
    render(&state, &presenter::index_view(&form), &headers)
}

async fn show_form(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    respond(&state, RequestMethod::Get, None, &headers)
}

async fn submit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    FormBody(data): FormBody<SubmittedData>,
) -> Result<Response> {
    respond(&state, RequestMethod::Post, Some(&data), &headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[test]
    fn test_bootstrap_with_defaults() {
        let state = AppState::bootstrap(&AppConfig::default()).unwrap();
        assert_eq!(state.form.get().action(), "/form");
        assert_eq!(state.events.listener_count(EVENT_LOGIN_FAILED), 1);
    }

    #[test]
    fn test_bootstrap_rejects_invalid_form() {
        let mut config = AppConfig::default();
        config.form.identity_field = "missing".to_string();
        assert!(AppState::bootstrap(&config).is_err());
    }

    #[test]
    fn test_bootstrap_rejects_unusable_form_action() {
        for action in ["form", "/", "/:x"] {
            let mut config = AppConfig::default();
            config.server.form_action = action.to_string();
            assert!(
                matches!(
                    AppState::bootstrap(&config),
                    Err(AppError::InvalidConfigValueError { ref field, .. }) if field == "server.form_action"
                ),
                "action {:?} should be rejected",
                action
            );
        }
    }

    #[tokio::test]
    async fn test_app_error_maps_to_json_500() {
        let response = AppError::NoRenderer.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], AppError::NoRenderer.to_string());
    }

    #[tokio::test]
    async fn test_view_without_renderer_answers_500() {
        let mut state = AppState::bootstrap(&AppConfig::default()).unwrap();
        state.view = Arc::new(View::new());
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/form").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].is_string());
    }

    #[test]
    fn test_outcomes_are_published() {
        let state = AppState::bootstrap(&AppConfig::default()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in [EVENT_FORM_DISPLAYED, EVENT_LOGIN_SUCCEEDED, EVENT_LOGIN_FAILED] {
            let seen = Arc::clone(&seen);
            state.events.attach(name, 5, move |e| {
                seen.lock().unwrap().push((e.name().to_string(), e.params().to_vec()));
                None
            });
        }

        let headers = HeaderMap::new();
        respond(&state, RequestMethod::Get, None, &headers).unwrap();
        let ok: SubmittedData = [("log", "tintin"), ("mdp", "x")].into_iter().collect();
        respond(&state, RequestMethod::Post, Some(&ok), &headers).unwrap();
        let bad: SubmittedData = [("log", "tintin1"), ("mdp", "x")].into_iter().collect();
        respond(&state, RequestMethod::Post, Some(&bad), &headers).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, EVENT_FORM_DISPLAYED);
        assert_eq!(seen[1], (EVENT_LOGIN_SUCCEEDED.to_string(), vec!["tintin".to_string()]));
        assert_eq!(
            seen[2],
            (
                EVENT_LOGIN_FAILED.to_string(),
                vec!["tintin1".to_string(), "log".to_string()]
            )
        );
    }
}
