use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use tutorbot_provider::{
    build_request, extract_reply_text, CompletionClient, CompletionClientConfig, ProviderError,
    ProviderErrorKind,
};

const PATH: &str = "/openai/v1/chat/completions";

fn client_for(server: &Server) -> CompletionClient {
    CompletionClient::new(CompletionClientConfig {
        api_key: "gsk-test".to_string(),
        endpoint: format!("{}{}", server.url(), PATH),
        request_timeout: None,
    })
    .expect("client")
}

fn completion_body(choices: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1_718_000_000u64,
        "model": "mixtral-8x7b-32768",
        "choices": choices,
        "usage": {
            "queue_time": 0.02,
            "prompt_tokens": 14,
            "prompt_time": 0.001,
            "completion_tokens": 9,
            "completion_time": 0.015,
            "total_tokens": 23,
            "total_time": 0.016
        },
        "system_fingerprint": "fp_abc",
        "x_groq": {"id": "req_123"}
    })
}

#[tokio::test]
async fn test_successful_completion_returns_first_choice() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer gsk-test")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "model": "mixtral-8x7b-32768",
            "messages": [{"role": "user", "content": "What is band 7?"}],
            "stream": false,
            "temperature": 0.7,
            "max_tokens": 50
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            completion_body(json!([
                {"index": 0, "message": {"role": "assistant", "content": "A good user."}, "logprobs": null, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "Another take."}, "finish_reason": "length"}
            ]))
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .get_completion(&build_request("What is band 7?"))
        .await
        .unwrap();

    assert_eq!(extract_reply_text(&response), "A good user.");
    assert_eq!(response.provider_metadata.id, "req_123");
    assert_eq!(response.usage.total_tokens, 23);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_choices_falls_back() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(completion_body(json!([])).to_string())
        .create_async()
        .await;

    let response = client_for(&server)
        .get_completion(&build_request("anything"))
        .await
        .unwrap();

    assert_eq!(extract_reply_text(&response), "No response generated");
}

#[tokio::test]
async fn test_non_200_status_carries_body_unmodified() {
    let body = "{\"error\":{\"message\":\"Invalid API Key\",\"type\":\"invalid_request_error\"}}\n";

    for status in [401usize, 429, 500, 201] {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_completion(&build_request("hi"))
            .await
            .unwrap_err();

        match err {
            ProviderError::ApiStatus { status: got, body: got_body } => {
                assert_eq!(got as usize, status);
                assert_eq!(got_body, body);
            }
            other => panic!("Expected ApiStatus for {}, got {:?}", status, other),
        }
    }
}

#[tokio::test]
async fn test_missing_usage_is_shape_error_with_raw_json() {
    let mut body = completion_body(json!([
        {"index": 0, "message": {"role": "assistant", "content": "hi"}}
    ]));
    body.as_object_mut().unwrap().remove("usage");

    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let err = client_for(&server)
        .get_completion(&build_request("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProviderErrorKind::ResponseShape);
    if let ProviderError::ResponseShape { raw, .. } = err {
        assert_eq!(raw, body);
    }
}

#[tokio::test]
async fn test_invalid_json_is_shape_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = client_for(&server)
        .get_completion(&build_request("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProviderErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // Bind then drop a listener so the port is closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = CompletionClient::new(CompletionClientConfig {
        api_key: "gsk-test".to_string(),
        endpoint: format!("http://127.0.0.1:{}{}", port, PATH),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .unwrap();

    let err = client
        .get_completion(&build_request("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProviderErrorKind::Network);
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_request_timeout_surfaces_as_network_timeout() {
    // Accepts the connection but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let client = CompletionClient::new(CompletionClientConfig {
        api_key: "gsk-test".to_string(),
        endpoint: format!("http://{}{}", addr, PATH),
        request_timeout: Some(Duration::from_millis(200)),
    })
    .unwrap();

    let err = client
        .get_completion(&build_request("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProviderErrorKind::Network);
    assert!(err.is_timeout());
    server.abort();
}

/// Read one HTTP request off `socket`, headers and body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    use tokio::io::AsyncReadExt;

    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        received.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&received);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if received.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_truncated_error_body_keeps_status() {
    use tokio::io::AsyncWriteExt;

    // Promises a longer body than it sends, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });

    let client = CompletionClient::new(CompletionClientConfig {
        api_key: "gsk-test".to_string(),
        endpoint: format!("http://{}{}", addr, PATH),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .unwrap();

    let err = client
        .get_completion(&build_request("hi"))
        .await
        .unwrap_err();

    match err {
        ProviderError::ApiStatus { status, body } => {
            assert_eq!(status, 503);
            assert!(body.is_empty());
        }
        other => panic!("Expected ApiStatus, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let result = CompletionClient::new(CompletionClientConfig {
        api_key: String::new(),
        endpoint: format!("{}{}", server.url(), PATH),
        request_timeout: None,
    });

    assert!(matches!(result, Err(ProviderError::Configuration { .. })));
    mock.assert_async().await;
}
