use log::{debug, warn};

use crate::api::{ApiError, ApiResult, MailBackend};
use crate::controller::RequestToken;
use crate::domain::email::{ComposeDraft, Email, EmailId, EmailUpdate, Mailbox};

/// Network work requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    ListMailbox(Mailbox),
    Send(ComposeDraft),
    OpenEmail(EmailId),
    ToggleArchive(EmailId),
    Reply(EmailId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub token: RequestToken,
    pub kind: JobKind,
}

#[derive(Debug)]
pub enum Outcome {
    Listed { mailbox: Mailbox, emails: Vec<Email> },
    Sent,
    Opened(Email),
    /// `archived` is the flag as stored after the job; a failed write
    /// leaves it unchanged.
    ArchiveToggled { id: EmailId, archived: bool },
    ReplyLoaded(Email),
    Failed(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts for a failed `PUT`.
    pub write_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { write_retries: 1 }
    }
}

impl RetryPolicy {
    /// Backend-reported errors are final; only transport-level failures are retried.
    pub fn write(
        &self,
        backend: &dyn MailBackend,
        id: EmailId,
        update: EmailUpdate,
    ) -> ApiResult<()> {
        let mut attempt = 0;
        loop {
            match backend.update_email(id, update) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_backend() || attempt >= self.write_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    debug!("PUT /emails/{id} failed ({e}); retry {attempt}/{}", self.write_retries);
                }
            }
        }
    }
}

/// Runs every network step of `kind` in order. Writes are awaited before
/// the outcome is produced, so a rendered result always reflects them.
pub fn execute(kind: &JobKind, backend: &dyn MailBackend, retry: RetryPolicy) -> Outcome {
    let result = match kind {
        JobKind::ListMailbox(mailbox) => {
            backend
                .list_mailbox(mailbox)
                .map(|emails| Outcome::Listed {
                    mailbox: mailbox.clone(),
                    emails,
                })
        }
        JobKind::Send(draft) => backend.send_email(draft).map(|()| Outcome::Sent),
        JobKind::OpenEmail(id) => open_email(*id, backend, retry).map(Outcome::Opened),
        JobKind::ToggleArchive(id) => toggle_archive(*id, backend, retry),
        JobKind::Reply(id) => backend.get_email(*id).map(Outcome::ReplyLoaded),
    };
    result.unwrap_or_else(Outcome::Failed)
}

fn open_email(id: EmailId, backend: &dyn MailBackend, retry: RetryPolicy) -> ApiResult<Email> {
    let mut email = backend.get_email(id)?;
    if !email.read {
        match retry.write(backend, id, EmailUpdate::read(true)) {
            Ok(()) => email.read = true,
            Err(e) => warn!("could not mark email {id} as read: {e}"),
        }
    }
    Ok(email)
}

/// Read current state, compute the negation, write it. A write that still
/// fails after retries is logged and the old state is reported.
fn toggle_archive(
    id: EmailId,
    backend: &dyn MailBackend,
    retry: RetryPolicy,
) -> ApiResult<Outcome> {
    let current = backend.get_email(id)?;
    let wanted = !current.archived;
    let archived = match retry.write(backend, id, EmailUpdate::archived(wanted)) {
        Ok(()) => wanted,
        Err(e) => {
            warn!("could not set archived={wanted} on email {id}: {e}");
            current.archived
        }
    };
    Ok(Outcome::ArchiveToggled { id, archived })
}
