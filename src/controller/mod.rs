pub mod jobs;
pub mod view;

use log::{debug, error, info};

use crate::api::{ApiError, MailBackend};
use crate::controller::jobs::{Job, JobKind, Outcome, RetryPolicy};
use crate::controller::view::{MailboxListing, ReadPane};
use crate::domain::email::{ComposeDraft, EmailId, Mailbox};

pub use view::View;

/// Generation number attached to every request. Only the outcome of the
/// most recently issued request is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RequestToken(u64);

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Compose(Option<ComposeDraft>),
    LoadMailbox(Mailbox),
    Send,
    LoadEmail(EmailId),
    ToggleArchive(EmailId),
    Reply(EmailId),
}

/// Owns the visible view and everything rendered in it.
///
/// Network work is split in two: the operation methods return a [`Job`]
/// that the caller executes (inline or on a worker), and [`apply`] renders
/// the resulting [`Outcome`] if it is still the latest request.
///
/// [`apply`]: ViewController::apply
#[derive(Debug, Default)]
pub struct ViewController {
    view: View,
    draft: ComposeDraft,
    listing: Option<MailboxListing>,
    reading: Option<ReadPane>,
    notice: Option<String>,
    issued: RequestToken,
    pending: Option<RequestToken>,
    /// Send or archive toggle still on the wire. Cleared when its outcome
    /// arrives, stale or not.
    writing: Option<RequestToken>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first request of a session: the inbox.
    pub fn start(&mut self) -> Job {
        self.load_mailbox(Mailbox::Inbox)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_visible(&self, view: View) -> bool {
        self.view == view
    }

    pub fn draft(&self) -> &ComposeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ComposeDraft {
        &mut self.draft
    }

    pub fn listing(&self) -> Option<&MailboxListing> {
        self.listing.as_ref()
    }

    pub fn reading(&self) -> Option<&ReadPane> {
        self.reading.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_writing(&self) -> bool {
        self.writing.is_some()
    }

    /// Makes `view` the only visible view. In-flight requests issued before
    /// this no longer render.
    pub fn show_view(&mut self, view: View) {
        self.invalidate();
        self.activate(view);
    }

    /// Opens the compose form, empty or with `prefill`.
    pub fn compose_email(&mut self, prefill: Option<ComposeDraft>) {
        self.show_view(View::Compose);
        self.draft = prefill.unwrap_or_default();
    }

    pub fn load_mailbox(&mut self, mailbox: Mailbox) -> Job {
        self.issue(JobKind::ListMailbox(mailbox))
    }

    /// Submits the current draft. The form stays as-is until the backend
    /// answers. Refused while another write is in flight.
    pub fn send_email(&mut self) -> Option<Job> {
        let draft = self.draft.clone();
        self.issue_write(JobKind::Send(draft))
    }

    pub fn load_email(&mut self, id: EmailId) -> Job {
        self.issue(JobKind::OpenEmail(id))
    }

    /// Refused while another write is in flight, so two toggles never
    /// read the same state.
    pub fn toggle_archive(&mut self, id: EmailId) -> Option<Job> {
        self.issue_write(JobKind::ToggleArchive(id))
    }

    pub fn reply(&mut self, id: EmailId) -> Job {
        self.issue(JobKind::Reply(id))
    }

    pub fn dispatch(&mut self, command: Command) -> Option<Job> {
        match command {
            Command::Compose(prefill) => {
                self.compose_email(prefill);
                None
            }
            Command::LoadMailbox(mailbox) => Some(self.load_mailbox(mailbox)),
            Command::Send => self.send_email(),
            Command::LoadEmail(id) => Some(self.load_email(id)),
            Command::ToggleArchive(id) => self.toggle_archive(id),
            Command::Reply(id) => Some(self.reply(id)),
        }
    }

    /// Renders `outcome` if `token` is still current. May return a follow-up
    /// job (a successful send continues with the sent mailbox).
    pub fn apply(&mut self, token: RequestToken, outcome: Outcome) -> Option<Job> {
        if self.writing == Some(token) {
            self.writing = None;
        }
        if token != self.issued {
            debug!("discarding stale response {token:?} (latest {:?})", self.issued);
            return None;
        }
        self.pending = None;

        match outcome {
            Outcome::Listed { mailbox, emails } => {
                self.activate(View::MailboxList);
                self.listing = Some(MailboxListing::new(mailbox, &emails));
                None
            }
            Outcome::Sent => {
                info!("email sent");
                // nothing left to resend if the sent listing fails
                self.draft = ComposeDraft::default();
                Some(self.load_mailbox(Mailbox::Sent))
            }
            Outcome::Opened(email) => {
                self.activate(View::Read);
                self.reading = Some(ReadPane { email });
                None
            }
            Outcome::ArchiveToggled { id, archived } => {
                info!("email {id} archived={archived}");
                if let Some(pane) = self.reading.as_mut().filter(|p| p.email.id == id) {
                    pane.email.archived = archived;
                }
                None
            }
            Outcome::ReplyLoaded(original) => {
                self.compose_email(Some(ComposeDraft::reply_to(&original)));
                None
            }
            Outcome::Failed(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Dispatches `command` and runs it to completion against `backend`,
    /// including follow-up jobs.
    pub fn run(&mut self, command: Command, backend: &dyn MailBackend, retry: RetryPolicy) {
        let mut next = self.dispatch(command);
        while let Some(job) = next {
            let outcome = jobs::execute(&job.kind, backend, retry);
            next = self.apply(job.token, outcome);
        }
    }

    fn issue(&mut self, kind: JobKind) -> Job {
        self.invalidate();
        self.pending = Some(self.issued);
        debug!("issuing {:?} as {:?}", kind, self.issued);
        Job {
            token: self.issued,
            kind,
        }
    }

    fn issue_write(&mut self, kind: JobKind) -> Option<Job> {
        if let Some(token) = self.writing {
            debug!("refusing {kind:?} while {token:?} is writing");
            return None;
        }
        let job = self.issue(kind);
        self.writing = Some(job.token);
        Some(job)
    }

    fn invalidate(&mut self) {
        self.issued = RequestToken(self.issued.0 + 1);
        self.pending = None;
    }

    /// Switches panels without touching outstanding requests. Content of
    /// the panels being left is dropped.
    fn activate(&mut self, view: View) {
        if view != View::MailboxList {
            self.listing = None;
        }
        if view != View::Read {
            self.reading = None;
        }
        if view != View::Compose {
            self.draft = ComposeDraft::default();
        }
        self.view = view;
    }

    fn fail(&mut self, e: ApiError) {
        error!("request failed: {e}");
        self.notice = Some(format!("Sorry: {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMailBackend;
    use crate::domain::email::{Email, EmailUpdate};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn email(id: EmailId, subject: &str) -> Email {
        Email {
            id,
            sender: "sender@example.com".into(),
            recipients: vec!["first@example.com".into(), "second@example.com".into()],
            subject: subject.into(),
            body: "Body text".into(),
            timestamp: "Apr 04 2024, 10:30 AM".into(),
            read: true,
            archived: false,
        }
    }

    fn run(ctl: &mut ViewController, command: Command, backend: &MockMailBackend) {
        ctl.run(command, backend, RetryPolicy::default());
    }

    #[test]
    fn exactly_one_view_is_visible() {
        let mut ctl = ViewController::new();
        for v in View::ALL {
            ctl.show_view(v);
            let visible: Vec<View> = View::ALL.into_iter().filter(|w| ctl.is_visible(*w)).collect();
            assert_eq!(visible, vec![v]);
        }
    }

    #[test]
    fn compose_resets_or_prefills_draft() {
        let mut ctl = ViewController::new();
        ctl.compose_email(None);
        ctl.draft_mut().subject = "half written".into();
        ctl.compose_email(None);
        assert_eq!(ctl.draft(), &ComposeDraft::default());

        ctl.compose_email(Some(ComposeDraft::new("a@b", "S", "B")));
        assert_eq!(ctl.draft(), &ComposeDraft::new("a@b", "S", "B"));
    }

    #[test]
    fn sent_rows_are_labelled_by_first_recipient() {
        let mut backend = MockMailBackend::new();
        backend
            .expect_list_mailbox()
            .returning(|_| Ok(vec![email(1, "one"), email(2, "two")]));

        let mut ctl = ViewController::new();
        run(&mut ctl, Command::LoadMailbox(Mailbox::Sent), &backend);
        let labels: Vec<&str> = ctl.listing().unwrap().rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["first@example.com", "first@example.com"]);

        run(&mut ctl, Command::LoadMailbox(Mailbox::Inbox), &backend);
        let listing = ctl.listing().unwrap();
        assert_eq!(listing.title, "Inbox");
        assert!(listing.rows.iter().all(|r| r.label == "sender@example.com"));
        assert_eq!(ctl.view(), View::MailboxList);
    }

    #[test]
    fn mailbox_error_shows_notice_and_keeps_view() {
        let mut backend = MockMailBackend::new();
        backend
            .expect_list_mailbox()
            .with(eq(Mailbox::Other("bogus".into())))
            .returning(|_| Err(ApiError::Backend("Mailbox not found".into())));

        let mut ctl = ViewController::new();
        ctl.compose_email(None);
        run(&mut ctl, Command::LoadMailbox(Mailbox::from("bogus")), &backend);

        assert_eq!(ctl.notice(), Some("Sorry: Mailbox not found"));
        assert_eq!(ctl.view(), View::Compose);
    }

    #[test]
    fn unread_email_is_marked_once_and_read_email_not_at_all() {
        let mut backend = MockMailBackend::new();
        backend.expect_get_email().with(eq(1)).returning(|id| {
            let mut e = email(id, "unread");
            e.read = false;
            Ok(e)
        });
        backend.expect_get_email().with(eq(2)).returning(|id| Ok(email(id, "read")));
        backend
            .expect_update_email()
            .with(eq(1), eq(EmailUpdate::read(true)))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut ctl = ViewController::new();
        run(&mut ctl, Command::LoadEmail(1), &backend);
        assert_eq!(ctl.view(), View::Read);
        run(&mut ctl, Command::LoadEmail(2), &backend);
        assert_eq!(ctl.reading().unwrap().email.id, 2);
    }

    #[test]
    fn toggle_archive_flips_label_in_place() {
        let mut backend = MockMailBackend::new();
        backend.expect_get_email().returning(|id| Ok(email(id, "keep")));
        backend
            .expect_update_email()
            .with(eq(3), eq(EmailUpdate::archived(true)))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut ctl = ViewController::new();
        run(&mut ctl, Command::LoadEmail(3), &backend);
        assert_eq!(ctl.reading().unwrap().archive_label(), "Archive");

        run(&mut ctl, Command::ToggleArchive(3), &backend);
        assert_eq!(ctl.view(), View::Read);
        assert_eq!(ctl.reading().unwrap().archive_label(), "Unarchive");
    }

    #[test]
    fn failed_archive_write_keeps_label() {
        let mut backend = MockMailBackend::new();
        backend.expect_get_email().returning(|id| Ok(email(id, "keep")));
        backend
            .expect_update_email()
            .returning(|_, _| Err(ApiError::Status(500)));

        let mut ctl = ViewController::new();
        run(&mut ctl, Command::LoadEmail(3), &backend);
        run(&mut ctl, Command::ToggleArchive(3), &backend);
        assert_eq!(ctl.reading().unwrap().archive_label(), "Archive");
        assert_eq!(ctl.notice(), None);
        assert!(!ctl.is_writing());
    }

    #[test]
    fn reply_prefills_compose() {
        let mut backend = MockMailBackend::new();
        backend.expect_get_email().returning(|id| Ok(email(id, "RE: Hello")));

        let mut ctl = ViewController::new();
        run(&mut ctl, Command::Reply(8), &backend);

        assert_eq!(ctl.view(), View::Compose);
        let draft = ctl.draft();
        assert_eq!(draft.recipients, "sender@example.com");
        assert_eq!(draft.subject, "RE: Hello");
        assert_eq!(
            draft.body,
            "On Apr 04 2024, 10:30 AM sender@example.com wrote:\nBody text\n\n"
        );
    }

    #[test]
    fn successful_send_goes_to_sent_mailbox() {
        let draft = ComposeDraft::new("first@example.com", "Hi", "There");
        let mut backend = MockMailBackend::new();
        backend
            .expect_send_email()
            .with(eq(draft.clone()))
            .times(1)
            .returning(|_| Ok(()));
        backend
            .expect_list_mailbox()
            .with(eq(Mailbox::Sent))
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut ctl = ViewController::new();
        ctl.compose_email(Some(draft));
        run(&mut ctl, Command::Send, &backend);

        assert_eq!(ctl.view(), View::MailboxList);
        assert_eq!(ctl.listing().unwrap().mailbox, Mailbox::Sent);
        assert_eq!(ctl.draft(), &ComposeDraft::default());
    }

    #[test]
    fn rejected_send_keeps_draft() {
        let mut backend = MockMailBackend::new();
        backend
            .expect_send_email()
            .returning(|_| Err(ApiError::Backend("At least one recipient required.".into())));
        backend.expect_list_mailbox().never();

        let mut ctl = ViewController::new();
        ctl.compose_email(Some(ComposeDraft::new("", "Subject", "Body")));
        run(&mut ctl, Command::Send, &backend);

        assert_eq!(ctl.view(), View::Compose);
        assert_eq!(ctl.draft(), &ComposeDraft::new("", "Subject", "Body"));
        assert_eq!(ctl.notice(), Some("Sorry: At least one recipient required."));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut ctl = ViewController::new();
        let inbox = ctl.start();
        ctl.compose_email(None);
        assert!(!ctl.is_busy());

        let follow_up = ctl.apply(
            inbox.token,
            Outcome::Listed {
                mailbox: Mailbox::Inbox,
                emails: vec![email(1, "late")],
            },
        );
        assert!(follow_up.is_none());
        assert_eq!(ctl.view(), View::Compose);
        assert!(ctl.listing().is_none());
    }

    #[test]
    fn only_latest_request_renders() {
        let mut ctl = ViewController::new();
        let first = ctl.load_email(1);
        let second = ctl.load_email(2);
        assert!(first.token < second.token);

        ctl.apply(second.token, Outcome::Opened(email(2, "second")));
        ctl.apply(first.token, Outcome::Opened(email(1, "first")));
        assert_eq!(ctl.reading().unwrap().email.id, 2);
    }

    #[test]
    fn sent_draft_is_cleared_even_if_sent_listing_fails() {
        let mut backend = MockMailBackend::new();
        backend.expect_send_email().times(1).returning(|_| Ok(()));
        backend
            .expect_list_mailbox()
            .returning(|_| Err(ApiError::Status(502)));

        let mut ctl = ViewController::new();
        ctl.compose_email(Some(ComposeDraft::new("first@example.com", "Hi", "There")));
        run(&mut ctl, Command::Send, &backend);

        assert_eq!(ctl.draft(), &ComposeDraft::default());
        assert_eq!(ctl.notice(), Some("Sorry: unexpected response status 502"));
    }

    #[test]
    fn second_send_is_refused_until_first_answers() {
        let mut ctl = ViewController::new();
        ctl.compose_email(Some(ComposeDraft::new("first@example.com", "Hi", "There")));

        let first = ctl.dispatch(Command::Send).unwrap();
        assert!(ctl.is_writing());
        assert_eq!(ctl.dispatch(Command::Send), None);

        let follow_up = ctl.apply(first.token, Outcome::Sent);
        assert!(!ctl.is_writing());
        assert_eq!(follow_up.map(|j| j.kind), Some(JobKind::ListMailbox(Mailbox::Sent)));
    }

    #[test]
    fn second_toggle_is_refused_until_first_answers() {
        let mut ctl = ViewController::new();
        let open = ctl.load_email(3);
        ctl.apply(open.token, Outcome::Opened(email(3, "keep")));

        let first = ctl.toggle_archive(3).unwrap();
        assert_eq!(ctl.toggle_archive(3), None);

        ctl.apply(first.token, Outcome::ArchiveToggled { id: 3, archived: true });
        assert_eq!(ctl.reading().unwrap().archive_label(), "Unarchive");
        assert!(ctl.toggle_archive(3).is_some());
    }

    #[test]
    fn stale_write_outcome_still_releases_the_lock() {
        let mut ctl = ViewController::new();
        let toggle = ctl.toggle_archive(3).unwrap();
        let _inbox = ctl.load_mailbox(Mailbox::Inbox);
        assert!(ctl.is_writing());

        ctl.apply(toggle.token, Outcome::ArchiveToggled { id: 3, archived: true });
        assert!(!ctl.is_writing());
        assert!(ctl.is_busy());
    }
}
