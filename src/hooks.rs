use actix::Addr;
use actix_web::{web, HttpRequest, HttpResponse};
use secstr::SecStr;

use crate::{
    event::{self, EventKind},
    logbook::{Append, Logbook},
    signature,
};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed parsing signature: {0}")]
    SignatureParse(#[from] signature::Error),
    #[error("signature doesn't match")]
    InvalidSignature,
    #[error("failed parsing payload: {0}")]
    Payload(#[from] event::ParseError),
    #[error("failed rendering event: {0}")]
    Render(#[from] askama::Error),
}

impl actix_web::ResponseError for HookError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            HookError::SignatureParse(_) => actix_web::http::StatusCode::FORBIDDEN,
            HookError::InvalidSignature => actix_web::http::StatusCode::FORBIDDEN,
            HookError::Payload(_) => actix_web::http::StatusCode::BAD_REQUEST,
            HookError::Render(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Default)]
pub struct HookConfig {
    pub secret: Option<SecStr>,
}

/// `POST <hook_path>`. Method and path mismatches never reach this handler:
/// the router answers those with 405 and 404.
///
/// The event-type check runs before signature verification, so an event we
/// don't care about is a 200 no-op even when the request isn't signed.
pub async fn github_hook(
    req: HttpRequest,
    body: web::Bytes,
    logbook: web::Data<Addr<Logbook>>,
) -> Result<HttpResponse, HookError> {
    let event_type = req
        .headers()
        .get("X-GitHub-Event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let kind = match EventKind::from_header(event_type) {
        Some(kind) => kind,
        None => {
            tracing::info!(event_type = event_type, "Skipping unsupported event type");
            return Ok(HttpResponse::Ok()
                .body(format!("event type `{}` is not supported", event_type)));
        }
    };

    let config = req
        .app_data::<HookConfig>()
        .map(|config| config.secret.as_ref())
        .unwrap_or(None);
    if let Some(secret) = config.filter(|secret| !secret.unsecure().is_empty()) {
        let provided = signature::Signature::from_headers(req.headers())?;
        if !signature::verify(secret.unsecure(), &body, &provided) {
            return Err(HookError::InvalidSignature);
        }
    }

    let events = event::parse(kind, &body)?;

    let mut out = String::new();
    for event in &events {
        let line = event.render()?;
        tracing::info!(
            repo = event.repo.as_str(),
            author = event.author.as_str(),
            "{}",
            line.trim_end(),
        );
        out.push_str(&line);
    }

    if !out.is_empty() {
        logbook.do_send(Append { text: out.clone() });
    }

    Ok(HttpResponse::Ok().body(out))
}

#[cfg(test)]
mod test {
    use actix::Actor as _;
    use actix_web::{http::StatusCode, test, App};
    use hmac::{Mac as _, NewMac as _};

    use super::*;

    const PUSH_BODY: &str = r#"{
        "ref": "refs/heads/main",
        "repository": {"name": "demo"},
        "commits": [
            {
                "author": {"name": "alice"},
                "message": "fix bug",
                "timestamp": "2021-01-01T00:00:00Z"
            }
        ]
    }"#;

    const PULL_REQUEST_BODY: &str = r#"{
        "action": "opened",
        "number": 42,
        "pull_request": {
            "number": 42,
            "title": "Add feature",
            "updated_at": "2021-02-03T04:05:06Z",
            "user": {"login": "carol"}
        },
        "repository": {"name": "demo"}
    }"#;

    fn hook_config(secret: Option<&str>) -> HookConfig {
        HookConfig {
            secret: secret.map(|s| SecStr::from(s)),
        }
    }

    fn signature_header(key: &[u8], body: &[u8]) -> String {
        let mut mac = hmac::Hmac::<sha1::Sha1>::new_varkey(key).unwrap();
        mac.update(body);
        format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
    }

    macro_rules! init_app {
        ($secret:expr) => {
            test::init_service(
                App::new()
                    .data(Logbook::new(None).start())
                    .app_data(hook_config($secret))
                    .route("/hook", web::post().to(github_hook)),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn should_reject_non_post_method() {
        let mut app = init_app!(None);

        let req = test::TestRequest::get().uri("/hook").to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_rt::test]
    async fn should_reject_unknown_path() {
        let mut app = init_app!(None);

        let req = test::TestRequest::post()
            .uri("/wrong-path")
            .header("X-GitHub-Event", "push")
            .set_payload(PUSH_BODY)
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn should_skip_unsupported_event_types() {
        let mut app = init_app!(None);

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "deploy")
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("deploy"));
        assert!(text.contains("not supported"));
    }

    #[actix_rt::test]
    async fn should_skip_unsupported_event_types_before_checking_signature() {
        let mut app = init_app!(Some("s3cr3t"));

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "deploy")
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn should_reject_wrong_signature() {
        let mut app = init_app!(Some("s3cr3t"));

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .header(
                "X-Hub-Signature",
                signature_header(b"not-the-secret", b"hello"),
            )
            .set_payload("hello")
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn should_reject_malformed_signature_header() {
        let mut app = init_app!(Some("s3cr3t"));

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .header("X-Hub-Signature", "sha1=wrongvalue")
            .set_payload("hello")
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn should_reject_missing_signature_when_secret_is_set() {
        let mut app = init_app!(Some("s3cr3t"));

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .set_payload(PUSH_BODY)
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn should_accept_signed_push_and_format_commits() {
        let mut app = init_app!(Some("s3cr3t"));

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .header(
                "X-Hub-Signature",
                signature_header(b"s3cr3t", PUSH_BODY.as_bytes()),
            )
            .set_payload(PUSH_BODY)
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "2021-01-01T00:00:00Z -- alice commit to demo/main\n\tfix bug\n"
        );
    }

    #[actix_rt::test]
    async fn should_format_pull_request_events() {
        let mut app = init_app!(None);

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "pull_request")
            .set_payload(PULL_REQUEST_BODY)
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body)
            .unwrap()
            .contains("opened Pull Request#42 to"));
    }

    #[actix_rt::test]
    async fn should_reject_malformed_payload() {
        let mut app = init_app!(None);

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .set_payload("not json")
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn should_return_empty_body_for_push_without_commits() {
        let mut app = init_app!(None);

        let req = test::TestRequest::post()
            .uri("/hook")
            .header("X-GitHub-Event", "push")
            .set_payload(r#"{"ref": "refs/heads/main", "commits": []}"#)
            .to_request();
        let resp = test::call_service(&mut app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(test::read_body(resp).await.is_empty());
    }
}
