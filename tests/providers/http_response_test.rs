//! HTTP response checking and error-body condensing tests.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bedside::config::GenerationConfig;
use bedside::providers::ollama::OllamaProvider;
use bedside::providers::{check_http_response, CompletionProvider, ProviderError};

async fn serve_once(status_line: &str, body: &str) -> String {
    let listener_result = TcpListener::bind("127.0.0.1:0").await;
    assert!(listener_result.is_ok());
    let listener = match listener_result {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };

    let addr_result = listener.local_addr();
    assert!(addr_result.is_ok());
    let addr = match addr_result {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        let accepted = listener.accept().await;
        if let Ok((mut socket, _)) = accepted {
            let mut read_buf = [0_u8; 4096];
            let _ = socket.read(&mut read_buf).await;

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    format!("http://{addr}")
}

fn test_provider(base_url: &str) -> OllamaProvider {
    let provider_result = OllamaProvider::new(
        base_url,
        "virtual-patient",
        GenerationConfig::default(),
        Duration::from_secs(5),
    );
    match provider_result {
        Ok(provider) => provider,
        Err(err) => panic!("provider should build: {err}"),
    }
}

#[tokio::test]
async fn check_http_response_passes_success_body_through() {
    let url = serve_once("200 OK", r#"{"response": "hello"}"#).await;

    let response = match reqwest::get(url).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    let body = match check_http_response(response).await {
        Ok(body) => body,
        Err(err) => panic!("success status should pass through: {err}"),
    };
    assert_eq!(body, r#"{"response": "hello"}"#);
}

#[tokio::test]
async fn check_http_response_surfaces_status_and_collapsed_body() {
    let url = serve_once("500 Internal Server Error", "model   not\n\nloaded").await;

    let response = match reqwest::get(url).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    let checked = check_http_response(response).await;
    match checked {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn check_http_response_truncates_long_error_body() {
    let body = "x".repeat(400);
    let url = serve_once("500 Internal Server Error", &body).await;

    let response = match reqwest::get(url).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };

    let checked = check_http_response(response).await;
    match checked {
        Err(ProviderError::HttpStatus { body, .. }) => {
            assert!(body.ends_with("...[truncated]"));
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn provider_complete_parses_generate_response() {
    let url = serve_once("200 OK", r#"{"response": "My back hurts.", "done": true}"#).await;
    let provider = test_provider(&url);

    let completion = provider.complete("prompt").await;
    match completion {
        Ok(text) => assert_eq!(text, "My back hurts."),
        Err(err) => panic!("completion should succeed: {err}"),
    }
}

#[tokio::test]
async fn provider_complete_maps_error_status() {
    let url = serve_once("500 Internal Server Error", "boom").await;
    let provider = test_provider(&url);

    let completion = provider.complete("prompt").await;
    match completion {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn provider_connect_failure_is_detected() {
    // Nothing listens on port 9; the connection is refused immediately.
    let provider = test_provider("http://127.0.0.1:9");

    let completion = provider.complete("prompt").await;
    match completion {
        Err(err) => assert!(err.is_connect()),
        Ok(_) => panic!("completion should fail against a closed port"),
    }
}
