use anyhow::{Result, anyhow};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::api::{ApiError, ApiResult, MailBackend};
use crate::domain::email::{ComposeDraft, Email, EmailId, EmailUpdate, Mailbox};

/// Either the `{"error": ...}` envelope the backend uses for logical
/// failures or the expected payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Failed { error: String },
    Ok(T),
}

pub struct HttpBackend {
    base: Url,
    client: Client,
}

impl HttpBackend {
    /// `timeout: None` leaves requests unbounded.
    pub fn new(
        base_url: &str,
        session_cookie: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        // a base without a trailing slash would lose its last segment on join
        let mut base = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid base_url '{base_url}': {e}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Url {
        // relative joins onto an http(s) base with a trailing slash cannot fail
        self.base
            .join(path)
            .unwrap_or_else(|_| self.base.clone())
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path);
        debug!("GET {url}");
        let resp = self.client.get(url).send()?;
        let (status, bytes) = read_response(resp)?;
        parse_reply(status, &bytes)
    }
}

impl MailBackend for HttpBackend {
    fn list_mailbox(&self, mailbox: &Mailbox) -> ApiResult<Vec<Email>> {
        self.get(&format!("emails/{}", mailbox.as_str()))
    }

    fn get_email(&self, id: EmailId) -> ApiResult<Email> {
        self.get(&format!("emails/{id}"))
    }

    fn send_email(&self, draft: &ComposeDraft) -> ApiResult<()> {
        let url = self.endpoint("emails");
        debug!("POST {url}");
        let resp = self.client.post(url).json(draft).send()?;
        let (status, bytes) = read_response(resp)?;
        parse_ack(status, &bytes, |s| s == StatusCode::CREATED)
    }

    fn update_email(&self, id: EmailId, update: EmailUpdate) -> ApiResult<()> {
        let url = self.endpoint(&format!("emails/{id}"));
        debug!("PUT {url} {update:?}");
        let resp = self.client.put(url).json(&update).send()?;
        let (status, bytes) = read_response(resp)?;
        parse_ack(status, &bytes, |s| s.is_success())
    }
}

fn read_response(resp: Response) -> ApiResult<(StatusCode, Vec<u8>)> {
    let status = resp.status();
    let bytes = resp.bytes()?.to_vec();
    Ok((status, bytes))
}

/// The backend reports logical errors as `{"error": ...}`, usually with a
/// 4xx status, so the body is inspected before the status.
fn parse_reply<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    match serde_json::from_slice::<Reply<T>>(bytes) {
        Ok(Reply::Failed { error }) => Err(ApiError::Backend(error)),
        Ok(Reply::Ok(value)) if status.is_success() => Ok(value),
        Ok(Reply::Ok(_)) => Err(ApiError::Status(status.as_u16())),
        Err(e) if status.is_success() => Err(ApiError::Decode(e)),
        Err(_) => Err(ApiError::Status(status.as_u16())),
    }
}

/// Writes carry no required body; success is judged by status alone.
fn parse_ack(
    status: StatusCode,
    bytes: &[u8],
    accepted: impl Fn(StatusCode) -> bool,
) -> ApiResult<()> {
    if accepted(status) {
        return Ok(());
    }
    match serde_json::from_slice::<Reply<serde_json::Value>>(bytes) {
        Ok(Reply::Failed { error }) => Err(ApiError::Backend(error)),
        _ => Err(ApiError::Status(status.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use tiny_http::{Response as ServerResponse, Server};

    /// What the local server saw for one request.
    #[derive(Debug)]
    struct Seen {
        method: String,
        path: String,
        cookie: Option<String>,
        body: String,
    }

    /// Answers one request per entry of `replies`, in order, and reports
    /// each request it received.
    fn serve(replies: Vec<(u16, &'static str)>) -> (String, Receiver<Seen>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api", server.server_addr());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in replies {
                let Ok(mut request) = server.recv() else { return };
                let mut sent = String::new();
                request.as_reader().read_to_string(&mut sent).unwrap();
                let cookie = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Cookie"))
                    .map(|h| h.value.as_str().to_string());
                let _ = tx.send(Seen {
                    method: request.method().to_string(),
                    path: request.url().to_string(),
                    cookie,
                    body: sent,
                });
                let _ = request.respond(ServerResponse::from_string(body).with_status_code(status));
            }
        });
        (base, rx)
    }

    fn json(body: &str) -> serde_json::Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn backend_requests_hit_the_documented_routes() {
        let email = r#"{"id":7,"sender":"a@x","recipients":["b@x"],"subject":"s",
            "body":"b","timestamp":"t","read":false,"archived":false}"#;
        let (base, seen) = serve(vec![
            (200, "[]"),
            (200, email),
            (201, r#"{"message":"Email sent successfully."}"#),
            (204, ""),
            (204, ""),
        ]);
        let backend = HttpBackend::new(&base, Some("session=abc"), None).unwrap();

        assert!(backend.list_mailbox(&Mailbox::Sent).unwrap().is_empty());
        let req = seen.recv().unwrap();
        assert_eq!((req.method.as_str(), req.path.as_str()), ("GET", "/api/emails/sent"));
        assert_eq!(req.cookie.as_deref(), Some("session=abc"));

        assert_eq!(backend.get_email(7).unwrap().id, 7);
        let req = seen.recv().unwrap();
        assert_eq!((req.method.as_str(), req.path.as_str()), ("GET", "/api/emails/7"));
        assert_eq!(req.cookie.as_deref(), Some("session=abc"));

        let draft = ComposeDraft::new("a@x, b@x", "Hello", "Body");
        backend.send_email(&draft).unwrap();
        let req = seen.recv().unwrap();
        assert_eq!((req.method.as_str(), req.path.as_str()), ("POST", "/api/emails"));
        assert_eq!(req.cookie.as_deref(), Some("session=abc"));
        assert_eq!(
            json(&req.body),
            serde_json::json!({"recipients": "a@x, b@x", "subject": "Hello", "body": "Body"})
        );

        backend.update_email(7, EmailUpdate::archived(true)).unwrap();
        let req = seen.recv().unwrap();
        assert_eq!((req.method.as_str(), req.path.as_str()), ("PUT", "/api/emails/7"));
        assert_eq!(req.cookie.as_deref(), Some("session=abc"));
        assert_eq!(json(&req.body), serde_json::json!({"archived": true}));

        backend.update_email(7, EmailUpdate::read(true)).unwrap();
        let req = seen.recv().unwrap();
        assert_eq!(json(&req.body), serde_json::json!({"read": true}));
    }

    #[test]
    fn backend_error_envelope_comes_back_over_the_wire() {
        let (base, seen) = serve(vec![
            (400, r#"{"error":"At least one recipient required."}"#),
        ]);
        let backend = HttpBackend::new(&base, None, None).unwrap();

        let err = backend.send_email(&ComposeDraft::default()).unwrap_err();
        assert_eq!(err.to_string(), "At least one recipient required.");
        assert_eq!(seen.recv().unwrap().cookie, None);
    }

    #[test]
    fn error_payload_wins_over_status() {
        let body = br#"{"error": "Invalid mailbox."}"#;
        let err = parse_reply::<Vec<Email>>(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, ApiError::Backend(ref m) if m == "Invalid mailbox."));
    }

    #[test]
    fn listing_parses() {
        let body = br#"[{"id":1,"sender":"a@x","recipients":["b@x"],"subject":"s",
            "body":"b","timestamp":"t","read":false,"archived":false}]"#;
        let emails = parse_reply::<Vec<Email>>(StatusCode::OK, body).unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].sender, "a@x");
    }

    #[test]
    fn garbage_is_decode_error_on_success_and_status_error_otherwise() {
        assert!(matches!(
            parse_reply::<Email>(StatusCode::OK, b"<html>"),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            parse_reply::<Email>(StatusCode::BAD_GATEWAY, b"<html>"),
            Err(ApiError::Status(502))
        ));
    }

    #[test]
    fn send_requires_created() {
        let created = |s: StatusCode| s == StatusCode::CREATED;
        let ok = parse_ack(
            StatusCode::CREATED,
            br#"{"message":"Email sent successfully."}"#,
            created,
        );
        assert!(ok.is_ok());

        let err = parse_ack(
            StatusCode::BAD_REQUEST,
            br#"{"error":"At least one recipient required."}"#,
            created,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "At least one recipient required.");
    }

    #[test]
    fn put_accepts_no_content() {
        assert!(parse_ack(StatusCode::NO_CONTENT, b"", |s| s.is_success()).is_ok());
        let missing = parse_ack(
            StatusCode::NOT_FOUND,
            br#"{"error":"Email not found."}"#,
            |s| s.is_success(),
        );
        assert!(matches!(missing, Err(ApiError::Backend(_))));
    }

    #[test]
    fn base_url_keeps_its_path() {
        let backend = HttpBackend::new("http://localhost:8000/mail", None, None).unwrap();
        assert_eq!(
            backend.endpoint("emails/inbox").as_str(),
            "http://localhost:8000/mail/emails/inbox"
        );
    }
}
