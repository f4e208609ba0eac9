//! HTTP server for the built site and the lead endpoint.

use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{Router, routing::any};
use tower_http::services::ServeDir;
use tracing::info;

use crate::lead::{LeadState, Mailer, handle_lead};

/// Path of the lead endpoint.
pub const LEAD_PATH: &str = "/api/lead";

/// Create the router: `/api/lead` plus static files from `root`.
pub fn create_router<M: Mailer>(root: &Path, lead: LeadState<M>) -> Router {
    Router::new()
        .route(LEAD_PATH, any(handle_lead::<M>))
        .fallback_service(ServeDir::new(root))
        .with_state(Arc::new(lead))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "serving");
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex};

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::lead::{Email, LeadError, LeadSettings};

    #[derive(Debug, Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        fail: bool,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), LeadError> {
            if self.fail {
                return Err(LeadError::Provider {
                    status: 500,
                    body: "upstream down".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn settings() -> LeadSettings {
        LeadSettings {
            to: Some("owner@example.com".to_string()),
            from: Some("leads@example.com".to_string()),
            redirect: "/thanks/".to_string(),
            subject_prefix: "New Lead".to_string(),
            honeypot_field: "website".to_string(),
        }
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        fs::create_dir_all(dir.path().join("thanks")).unwrap();
        fs::write(dir.path().join("thanks/index.html"), "<h1>Thanks</h1>").unwrap();
        dir
    }

    fn post(content_type: &str, accept: Option<&str>, body: impl Into<Body>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(LEAD_PATH)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        builder.body(body.into()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_form_post_redirects_and_sends() {
        let dir = site();
        let state = LeadState::new(RecordingMailer::default(), settings());
        let router = create_router(dir.path(), state);

        let response = router
            .oneshot(post(
                "application/x-www-form-urlencoded",
                None,
                "name=Jane+Doe&phone=515-555-0100&city=Ames&roof=steep",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/thanks/");
    }

    #[tokio::test]
    async fn test_json_post_returns_json() {
        let dir = site();
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings()));

        let response = router
            .oneshot(post(
                "application/json",
                Some("application/json"),
                r#"{"name":"Jane","email":"jane@example.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);
    }

    #[tokio::test]
    async fn test_mailer_receives_lead() {
        let state = Arc::new(LeadState::new(RecordingMailer::default(), settings()));
        let router = Router::new()
            .route(LEAD_PATH, any(handle_lead::<RecordingMailer>))
            .with_state(state.clone());

        router
            .oneshot(post(
                "application/x-www-form-urlencoded",
                None,
                "name=Jane&email=jane%40example.com&town=Ankeny",
            ))
            .await
            .unwrap();

        let sent = state.mailer().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Lead: Jane (Ankeny)");
        assert_eq!(sent[0].reply_to.as_deref(), Some("jane@example.com"));
        assert!(sent[0].text.starts_with("Name: Jane\nEmail: jane@example.com\nPhone: -\nCity: Ankeny"));
    }

    #[tokio::test]
    async fn test_multipart_file_becomes_placeholder() {
        let state = Arc::new(LeadState::new(RecordingMailer::default(), settings()));
        let router = Router::new()
            .route(LEAD_PATH, any(handle_lead::<RecordingMailer>))
            .with_state(state.clone());

        let body = "--XBOUNDARY\r\n\
Content-Disposition: form-data; name=\"name\"\r\n\r\n\
Jane\r\n\
--XBOUNDARY\r\n\
Content-Disposition: form-data; name=\"phone\"\r\n\r\n\
515-555-0100\r\n\
--XBOUNDARY\r\n\
Content-Disposition: form-data; name=\"photo\"; filename=\"roof.jpg\"\r\n\
Content-Type: image/jpeg\r\n\r\n\
JPEGDATA\r\n\
--XBOUNDARY--\r\n";

        let response = router
            .oneshot(post(
                "multipart/form-data; boundary=XBOUNDARY",
                Some("application/json"),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = state.mailer().sent.lock().unwrap();
        assert!(sent[0].text.ends_with("Extra fields:\nphoto: [file]"));
    }

    #[tokio::test]
    async fn test_honeypot_pretends_success() {
        let state = Arc::new(LeadState::new(RecordingMailer::default(), settings()));
        let router = Router::new()
            .route(LEAD_PATH, any(handle_lead::<RecordingMailer>))
            .with_state(state.clone());

        let response = router
            .oneshot(post(
                "application/x-www-form-urlencoded",
                None,
                "name=Bot&email=bot%40spam.io&website=http%3A%2F%2Fspam.io",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.mailer().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_is_bad_request() {
        let dir = site();
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings()));

        let response = router
            .oneshot(post("application/x-www-form-urlencoded", None, "name=Jane"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            text_body(response).await,
            "Missing required fields: name and (email or phone)."
        );
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let dir = site();
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings()));

        let response = router
            .oneshot(post("text/plain", Some("application/json"), "name=Jane"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Unsupported Content-Type");
    }

    #[tokio::test]
    async fn test_missing_sender_is_server_error() {
        let dir = site();
        let mut settings = settings();
        settings.from = None;
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings));

        let response = router
            .oneshot(post(
                "application/json",
                Some("application/json"),
                r#"{"name":"Jane","phone":"1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Missing LEAD_FROM env var");
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let dir = site();
        let mailer = RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        };
        let router = create_router(dir.path(), LeadState::new(mailer, settings()));

        let response = router
            .oneshot(post(
                "application/x-www-form-urlencoded",
                None,
                "name=Jane&phone=1",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(text_body(response).await, "Resend error (500): upstream down");
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let dir = site();
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings()));

        let request = Request::builder()
            .uri(LEAD_PATH)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::builder()
            .method("PUT")
            .uri(LEAD_PATH)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(text_body(response).await, "Method Not Allowed.");
    }

    #[tokio::test]
    async fn test_serves_static_files() {
        let dir = site();
        let router = create_router(dir.path(), LeadState::new(RecordingMailer::default(), settings()));

        let request = Request::builder()
            .uri("/thanks/")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_body(response).await, "<h1>Thanks</h1>");
    }
}
