//! Exercises the real hyper transport against a local HTTP server.

use std::convert::Infallible;
use std::net::SocketAddr;

use gemini_adapter::{AdapterError, GeminiAdapter, GeminiConfig};
use hyper::body::to_bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::{Value, json};

async fn handle(request: Request<Body>) -> Result<Response<Body>, Infallible> {
    let query = request.uri().query().unwrap_or_default().to_owned();
    let path = request.uri().path().to_owned();
    let bytes = to_bytes(request.into_body()).await.unwrap_or_default();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    if query != "key=good-key" {
        let reply = json!({ "error": { "code": 400, "message": "API key not valid." } });
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Body::from(reply.to_string()))
            .unwrap());
    }

    let prompt = body
        .pointer("/contents/0/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let reply = json!({
        "candidates": [{ "content": { "parts": [{ "text": format!("{path} <- {prompt}") }] } }]
    });
    Ok(Response::new(Body::from(reply.to_string())))
}

fn spawn_server() -> SocketAddr {
    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = Server::try_bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .expect("bind local server")
        .serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn adapter(addr: SocketAddr) -> GeminiAdapter {
    let config = GeminiConfig::default()
        .with_base_url(format!("http://{addr}"))
        .expect("local URL");
    GeminiAdapter::new(config)
}

#[tokio::test]
async fn round_trips_prompt_over_http() {
    let addr = spawn_server();
    let text = adapter(addr)
        .generate("good-key", "capital of France?")
        .await
        .expect("generated text");

    assert_eq!(
        text,
        "/v1beta/models/gemini-pro:generateContent <- capital of France?"
    );
}

#[tokio::test]
async fn surfaces_remote_error_message() {
    let addr = spawn_server();
    let err = adapter(addr)
        .generate("wrong-key", "hello")
        .await
        .expect_err("rejected key");

    assert_eq!(err, AdapterError::request("API key not valid."));
    assert_eq!(err.to_block_text(), "Error: API key not valid.");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let config = GeminiConfig::default()
        .with_base_url("http://127.0.0.1:1")
        .expect("local URL");
    let err = GeminiAdapter::new(config)
        .generate("good-key", "hello")
        .await
        .expect_err("connection refused");

    assert!(matches!(err, AdapterError::Transport { .. }));
}
