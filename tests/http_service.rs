use scoretrail::models::SubjectId;
use scoretrail::service::{HttpReportService, ReportService, ServiceOptions};
use scoretrail::LoadError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one HTTP response; the handle yields the raw request head.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).to_string()
    });

    (base_url, handle)
}

fn client(base_url: String, token: Option<&str>) -> HttpReportService {
    HttpReportService::new(ServiceOptions {
        base_url,
        timeout_seconds: 5,
        auth_token: token.map(str::to_string),
    })
    .unwrap()
}

const VERSIONS_BODY: &str = r#"{"versions": [
    {"analysis_id": "an-2", "version": 2, "overall_score": 68,
     "created_at": "2024-02-01T00:00:00Z", "is_current": true},
    {"analysis_id": "an-1", "version": 1, "name": "Baseline", "overall_score": 55,
     "created_at": "2024-01-01T00:00:00Z"}
]}"#;

#[tokio::test]
async fn test_fetch_versions_request_and_decode() {
    let (base_url, server) = serve_once("200 OK", VERSIONS_BODY).await;
    let service = client(base_url, Some("secret-token"));

    let response = service
        .fetch_versions(&SubjectId::from("funnel-42"), Some("user-7"))
        .await
        .unwrap();

    assert_eq!(response.versions.len(), 2);
    assert_eq!(response.versions[1].name.as_deref(), Some("Baseline"));

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap();
    assert_eq!(
        request_line,
        "GET /api/subjects/funnel-42/versions?user_id=user-7 HTTP/1.1"
    );
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn test_fetch_without_user_has_no_query() {
    let (base_url, server) = serve_once("200 OK", r#"{"versions": []}"#).await;
    let service = client(base_url, None);

    let response = service
        .fetch_versions(&SubjectId::from("empty"), None)
        .await
        .unwrap();
    assert!(response.versions.is_empty());

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/subjects/empty/versions HTTP/1.1"));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_server_error_is_fetch_failed() {
    let (base_url, server) = serve_once("503 Service Unavailable", "maintenance").await;
    let service = client(base_url, None);

    let err = service
        .fetch_versions(&SubjectId::from("funnel-42"), None)
        .await
        .unwrap_err();

    let LoadError::FetchFailed { message } = err;
    assert!(message.contains("503"));
    assert!(message.contains("maintenance"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_malformed_body_is_fetch_failed() {
    let (base_url, server) = serve_once("200 OK", r#"{"versions": "nope"}"#).await;
    let service = client(base_url, None);

    let result = service
        .fetch_versions(&SubjectId::from("funnel-42"), None)
        .await;

    assert!(matches!(result, Err(LoadError::FetchFailed { .. })));
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_fetch_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let service = client(base_url, None);
    let err = service
        .fetch_versions(&SubjectId::from("funnel-42"), None)
        .await
        .unwrap_err();

    assert!(err.message().contains("Cannot connect"));
}
