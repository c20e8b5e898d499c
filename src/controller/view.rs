use std::fmt;

use crate::domain::email::{Email, EmailId, Mailbox};

/// The mutually exclusive panels of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    MailboxList,
    Compose,
    Read,
}

impl View {
    pub const ALL: [View; 3] = [View::MailboxList, View::Compose, View::Read];
}

pub fn archive_label(archived: bool) -> &'static str {
    if archived { "Unarchive" } else { "Archive" }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxRow {
    pub id: EmailId,
    pub label: String,
    pub subject: String,
    pub timestamp: String,
    pub read: bool,
}

/// One rendered mailbox: a heading plus a row per email, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxListing {
    pub mailbox: Mailbox,
    pub title: String,
    pub rows: Vec<MailboxRow>,
}

impl MailboxListing {
    pub fn new(mailbox: Mailbox, emails: &[Email]) -> Self {
        let rows = emails
            .iter()
            .map(|e| MailboxRow {
                id: e.id,
                label: mailbox.row_label(e).to_string(),
                subject: e.subject.clone(),
                timestamp: e.timestamp.clone(),
                read: e.read,
            })
            .collect();

        Self {
            title: mailbox.title(),
            mailbox,
            rows,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.read).count()
    }
}

impl fmt::Display for MailboxListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for row in &self.rows {
            let marker = if row.read { ' ' } else { '*' };
            writeln!(
                f,
                "{marker} {:>5}  {:<30}  {:<40}  {}",
                row.id, row.label, row.subject, row.timestamp
            )?;
        }
        Ok(())
    }
}

/// The single-email panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPane {
    pub email: Email,
}

impl ReadPane {
    pub fn archive_label(&self) -> &'static str {
        archive_label(self.email.archived)
    }

    pub fn recipients_line(&self) -> String {
        self.email.recipients.join(", ")
    }
}

impl fmt::Display for ReadPane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From: {}", self.email.sender)?;
        writeln!(f, "To: {}", self.recipients_line())?;
        writeln!(f, "Subject: {}", self.email.subject)?;
        writeln!(f, "{}", self.email.timestamp)?;
        writeln!(f)?;
        writeln!(f, "{}", self.email.body)?;
        writeln!(f)?;
        write!(f, "[{}] [Reply]", self.archive_label())
    }
}
