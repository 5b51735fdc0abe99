use super::*;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

type Reply = (StatusCode, &'static str, String);

#[derive(Clone)]
struct ServerState {
    reply: Reply,
    seen: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn handle_register(
    axum::extract::State(state): axum::extract::State<ServerState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.seen.lock().await.push(payload);
    let (status, content_type, body) = state.reply.clone();
    (status, [("content-type", content_type)], body)
}

async fn spawn_register_server(
    reply: Reply,
) -> anyhow::Result<(String, Arc<Mutex<Vec<serde_json::Value>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        reply,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route(REGISTER_ROUTE, post(handle_register))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), seen))
}

fn json_reply(status: StatusCode, body: serde_json::Value) -> Reply {
    (status, "application/json", body.to_string())
}

fn sample_request() -> RegistrationRequest {
    RegistrationRequest {
        full_name: Some("Asha Roy".to_string()),
        whatsapp_number: Some("9876543210".to_string()),
        email: Some("asha@example.com".to_string()),
        interest: Some("general".to_string()),
        message: None,
    }
}

#[test]
fn endpoint_joins_register_route() {
    let client = HttpRegistrationClient::new("http://localhost:8080").expect("client");
    assert_eq!(
        client.endpoint().as_str(),
        "http://localhost:8080/api/register"
    );
    assert!(HttpRegistrationClient::new("not a url").is_err());
}

#[tokio::test]
async fn created_with_email_sent() {
    let (url, seen) = spawn_register_server(json_reply(
        StatusCode::CREATED,
        serde_json::json!({ "message": "Registration successful", "emailSent": true }),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let receipt = client.submit(&sample_request()).await.expect("submit");
    assert_eq!(receipt.email, EmailStatus::Sent);

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["fullName"], "Asha Roy");
    assert_eq!(seen[0]["interest"], "general");
    assert!(seen[0].get("message").is_none());
}

#[tokio::test]
async fn created_with_email_failure_keeps_detail() {
    let (url, _) = spawn_register_server(json_reply(
        StatusCode::CREATED,
        serde_json::json!({
            "message": "Registration successful",
            "emailSent": false,
            "emailError": "provider rejected the message",
        }),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let receipt = client.submit(&sample_request()).await.expect("submit");
    assert_eq!(
        receipt.email,
        EmailStatus::Failed {
            error: Some("provider rejected the message".to_string())
        }
    );
}

#[tokio::test]
async fn created_without_email_fields_is_unknown() {
    let (url, _) = spawn_register_server(json_reply(
        StatusCode::CREATED,
        serde_json::json!({ "message": "Registration successful" }),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let receipt = client.submit(&sample_request()).await.expect("submit");
    assert_eq!(receipt.email, EmailStatus::Unknown);
}

#[tokio::test]
async fn created_with_non_object_json_body_is_success() {
    for raw in ["true", "null", "[\"ok\"]", "\"saved\""] {
        let (url, _) = spawn_register_server((
            StatusCode::CREATED,
            "application/json",
            raw.to_string(),
        ))
        .await
        .expect("spawn server");
        let client = HttpRegistrationClient::new(&url).expect("client");

        let receipt = client
            .submit(&sample_request())
            .await
            .unwrap_or_else(|err| panic!("body {raw} failed: {err:?}"));
        assert_eq!(receipt.email, EmailStatus::Unknown, "body {raw}");
    }
}

#[tokio::test]
async fn created_with_mistyped_email_flag_is_unknown() {
    let (url, _) = spawn_register_server(json_reply(
        StatusCode::CREATED,
        serde_json::json!({ "message": "Registration successful", "emailSent": "yes" }),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let receipt = client.submit(&sample_request()).await.expect("submit");
    assert_eq!(receipt.email, EmailStatus::Unknown);
}

#[tokio::test]
async fn json_error_body_is_surfaced() {
    let (url, _) = spawn_register_server(json_reply(
        StatusCode::BAD_REQUEST,
        serde_json::json!({ "error": "Missing required fields" }),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let err = client.submit(&sample_request()).await.expect_err("must fail");
    assert_eq!(
        err,
        SubmissionError::Server {
            status: 400,
            message: "Missing required fields".to_string()
        }
    );
    assert_eq!(err.user_message(), "Missing required fields");
}

#[tokio::test]
async fn json_error_without_message_falls_back() {
    for body in [
        serde_json::json!({}),
        serde_json::json!({ "error": "" }),
        serde_json::json!({ "error": "   " }),
        serde_json::json!(null),
    ] {
        let (url, _) =
            spawn_register_server(json_reply(StatusCode::INTERNAL_SERVER_ERROR, body.clone()))
                .await
                .expect("spawn server");
        let client = HttpRegistrationClient::new(&url).expect("client");

        let err = client.submit(&sample_request()).await.expect_err("must fail");
        assert_eq!(err.user_message(), REGISTER_FAILED, "body {body}");
    }
}

#[tokio::test]
async fn non_json_response_is_opaque_failure() {
    let (url, _) = spawn_register_server((
        StatusCode::BAD_GATEWAY,
        "text/html",
        "<html>upstream down</html>".to_string(),
    ))
    .await
    .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let err = client.submit(&sample_request()).await.expect_err("must fail");
    assert_eq!(
        err,
        SubmissionError::Server {
            status: 502,
            message: "Bad Gateway".to_string()
        }
    );
}

#[tokio::test]
async fn success_status_with_non_json_body_is_still_a_failure() {
    let (url, _) = spawn_register_server((StatusCode::OK, "text/plain", "ok".to_string()))
        .await
        .expect("spawn server");
    let client = HttpRegistrationClient::new(&url).expect("client");

    let err = client.submit(&sample_request()).await.expect_err("must fail");
    assert!(matches!(err, SubmissionError::Server { status: 200, .. }));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpRegistrationClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(2))
        .expect("client");
    let err = client.submit(&sample_request()).await.expect_err("must fail");
    assert!(matches!(err, SubmissionError::Transport(_)));
    assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE);
}
