pub mod http;

use thiserror::Error;

use crate::domain::email::{ComposeDraft, Email, EmailId, EmailUpdate, Mailbox};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with an `{"error": ...}` payload.
    #[error("{0}")]
    Backend(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected response status {0}")]
    Status(u16),
}

impl ApiError {
    pub fn is_backend(&self) -> bool {
        matches!(self, ApiError::Backend(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The REST surface of the mail backend.
#[cfg_attr(test, mockall::automock)]
pub trait MailBackend: Send + Sync {
    /// `GET /emails/{mailbox}`
    fn list_mailbox(&self, mailbox: &Mailbox) -> ApiResult<Vec<Email>>;

    /// `GET /emails/{id}`
    fn get_email(&self, id: EmailId) -> ApiResult<Email>;

    /// `POST /emails`; succeeds only when the backend reports the email created.
    fn send_email(&self, draft: &ComposeDraft) -> ApiResult<()>;

    /// `PUT /emails/{id}` with a partial update.
    fn update_email(&self, id: EmailId, update: EmailUpdate) -> ApiResult<()>;
}
