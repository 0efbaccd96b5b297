use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mini_module::{build_router, AppConfig, AppState};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::bootstrap(&AppConfig::default()).unwrap();
    build_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/form")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_page() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert!(body.contains("Bonjour tintin"));
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let request = Request::builder().uri("/form").body(Body::empty()).unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="log""#));
    assert!(body.contains(r#"type="password""#));
    assert!(body.contains(r#"value="Suite""#));
    assert!(body.contains(r#"value="Inscrit toi""#));
    assert!(!body.contains("class=\"errors\""));
}

#[tokio::test]
async fn test_valid_login_renders_welcome() {
    let (status, _, body) = send(app(), post_form("log=tintin&mdp=secret&submit=Suite")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Bienvenue tintin"));
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_invalid_login_re_renders_form_with_errors() {
    let (status, _, body) = send(app(), post_form("log=tintin1&mdp=secret")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"value="tintin1""#));
    assert!(body.contains("The input contains non alphabetic characters"));
    // 密碼不回填
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_empty_submission_reports_empty_login() {
    let (_, _, body) = send(app(), post_form("")).await;
    assert!(body.contains("The input is an empty string"));
}

#[tokio::test]
async fn test_json_negotiation() {
    let request = Request::builder()
        .method("POST")
        .uri("/form")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, "application/json")
        .body(Body::from("log=Haddock&mdp=x"))
        .unwrap();
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value, serde_json::json!({ "login": "Haddock" }));

    let request = Request::builder()
        .method("POST")
        .uri("/form")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, "application/json")
        .body(Body::from("log=Haddock1&mdp=x"))
        .unwrap();
    let (_, _, body) = send(app(), request).await;
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["form"]["action"], "/form");
    assert_eq!(
        value["errors"]["log"],
        serde_json::json!(["The input contains non alphabetic characters"])
    );
    assert_eq!(value["form"]["fields"][0]["value"], "Haddock1");
}

#[tokio::test]
async fn test_repeated_valid_posts_are_identical() {
    let app = app();
    let (_, _, first) = send(app.clone(), post_form("log=Milou&mdp=os")).await;
    let (_, _, second) = send(app, post_form("log=Milou&mdp=os")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unsupported_method_is_rejected() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/form")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
