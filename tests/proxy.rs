//! End-to-end tests: real proxy listener in front of a mock upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tokio::time::timeout;

mod common;

#[tokio::test]
async fn html_is_rewritten_end_to_end() {
    let backend_page = |backend: &str| {
        format!(
            "<html><head><title>Rustic</title><script>var folder = 1;</script></head>\
             <body><a href=\"https://{backend}/r/rust\">Python threads</a>\
             <img src=\"//{backend}/logo.png\"></body></html>"
        )
    };

    // The page has to mention the backend's own address, known only after binding.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = listener.local_addr().unwrap();
    let page = backend_page(&backend.to_string());
    tokio::spawn(async move {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        while let Ok((mut socket, _)) = listener.accept().await {
            let page = page.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
                     Server: upstream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    page.len(),
                    page
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;
    let res = common::client()
        .get(format!("http://{proxy}/r/rust"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    assert!(res.headers().get("server").is_none());

    let body = res.text().await.unwrap();
    assert!(body.contains(&format!("href=\"http://{proxy}/r/rust\"")), "{body}");
    assert!(body.contains(&format!("src=\"//{proxy}/logo.png\"")), "{body}");
    assert!(body.contains("Python\u{2122} threads"), "{body}");
    assert!(body.contains("<title>Rustic\u{2122}</title>"), "{body}");
    assert!(body.contains("var folder = 1;"), "{body}");
    assert!(!body.contains("folder\u{2122}"), "{body}");
}

#[tokio::test]
async fn non_html_bodies_pass_through_untouched() {
    let json = r#"{"kind":"Listing","link":"https://www.reddit.com/r/rust"}"#.to_string();
    let (backend, _) =
        common::start_mock_backend("200 OK", &[("Content-Type", "application/json")], json.clone())
            .await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/r/rust.json"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), json);
}

#[tokio::test]
async fn excluded_request_headers_never_reach_upstream() {
    let (backend, mut requests) =
        common::start_mock_backend("200 OK", &[], "ok".to_string()).await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    common::client()
        .get(format!("http://{proxy}/search?q=ferris&sort=new"))
        .header("Keep-Alive", "timeout=5")
        .header("X-Custom", "kept")
        .send()
        .await
        .unwrap();

    let seen = requests.recv().await.unwrap();
    assert_eq!(seen.request_line(), "GET /search?q=ferris&sort=new HTTP/1.1");
    assert_eq!(seen.header("host"), Some(backend.to_string().as_str()));
    assert_eq!(seen.header("x-custom"), Some("kept"));
    assert!(seen.header("keep-alive").is_none());
}

#[tokio::test]
async fn request_body_and_content_type_are_forwarded() {
    let (backend, mut requests) =
        common::start_mock_backend("201 Created", &[], String::new()).await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .post(format!("http://{proxy}/api/comment"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("text=hello&thing_id=t3_abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let seen = requests.recv().await.unwrap();
    assert!(seen.request_line().starts_with("POST /api/comment "));
    assert_eq!(
        seen.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(seen.body, b"text=hello&thing_id=t3_abc");
}

#[tokio::test]
async fn upstream_error_statuses_are_relayed() {
    let (backend, _) =
        common::start_mock_backend("404 Not Found", &[], "no such subreddit".to_string()).await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/r/doesnotexist"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "no such subreddit");
}

#[tokio::test]
async fn redirects_are_not_followed_when_disabled() {
    let (backend, _) = common::start_mock_backend(
        "302 Found",
        &[("Location", "/login")],
        String::new(),
    )
    .await;
    let mut config = common::config_for(backend);
    config.upstream.follow_redirects = false;
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{proxy}/submit"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/login");
}

#[tokio::test]
async fn unreachable_upstream_yields_proxy_error() {
    let mut config = common::config_for("127.0.0.1:1".parse().unwrap());
    config.upstream.timeout_secs = 2;
    let (proxy, _shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert!(res.text().await.unwrap().starts_with("Proxy Error: "));
}

#[tokio::test]
async fn server_stops_on_shutdown() {
    let (backend, _) = common::start_mock_backend("200 OK", &[], "ok".to_string()).await;
    let (proxy, shutdown) = common::start_proxy(common::config_for(backend)).await;

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(common::client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn non_html_bodies_stream_while_upstream_is_still_sending() {
    let release = Arc::new(Notify::new());
    let gate = release.clone();
    let backend = common::start_scripted_backend(move |mut socket| {
        let gate = gate.clone();
        async move {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                        Content-Length: 10\r\nConnection: close\r\n\r\n";
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(b"first").await;
            let _ = socket.flush().await;

            gate.notified().await;
            let _ = socket.write_all(b"-rest").await;
            let _ = socket.shutdown().await;
        }
    })
    .await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    let mut res = timeout(
        Duration::from_secs(5),
        common::client().get(format!("http://{proxy}/media/blob")).send(),
    )
    .await
    .expect("response head relayed before the upstream body completes")
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let mut received = Vec::new();
    while received.len() < 5 {
        let chunk = timeout(Duration::from_secs(5), res.chunk())
            .await
            .expect("first chunk relayed while the upstream stalls")
            .unwrap()
            .unwrap();
        received.extend_from_slice(&chunk);
    }
    assert_eq!(received, b"first");

    release.notify_one();
    while let Some(chunk) = res.chunk().await.unwrap() {
        received.extend_from_slice(&chunk);
    }
    assert_eq!(received, b"first-rest");
}

#[tokio::test]
async fn upstream_failure_after_head_keeps_upstream_status() {
    let backend = common::start_scripted_backend(|mut socket| async move {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                    Content-Length: 100\r\nConnection: close\r\n\r\npartial";
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await;
    let (proxy, _shutdown) = common::start_proxy(common::config_for(backend)).await;

    let res = common::client()
        .get(format!("http://{proxy}/media/truncated"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.is_err());
}
