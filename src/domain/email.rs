use serde::{Deserialize, Serialize};
use std::fmt;

pub type EmailId = u64;

/// An email as returned by `GET /emails/{id}` or inside a mailbox listing.
///
/// The client never owns these; every copy is a transient snapshot of
/// server state fetched for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mailbox {
    Inbox,
    Sent,
    Archive,
    /// Anything else; the backend decides whether it exists.
    Other(String),
}

impl Mailbox {
    pub fn as_str(&self) -> &str {
        match self {
            Mailbox::Inbox => "inbox",
            Mailbox::Sent => "sent",
            Mailbox::Archive => "archive",
            Mailbox::Other(name) => name,
        }
    }

    /// Heading shown above the listing: the name with its first letter upper-cased.
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Row label for an email in this mailbox.
    ///
    /// Sent mail is labelled by its first recipient, everything else by sender.
    pub fn row_label<'a>(&self, email: &'a Email) -> &'a str {
        match self {
            Mailbox::Sent => email.recipients.first().map(String::as_str).unwrap_or(""),
            _ => &email.sender,
        }
    }
}

impl From<&str> for Mailbox {
    fn from(name: &str) -> Self {
        match name {
            "inbox" => Mailbox::Inbox,
            "sent" => Mailbox::Sent,
            "archive" | "archived" => Mailbox::Archive,
            other => Mailbox::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update sent with `PUT /emails/{id}`. Unset fields are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmailUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl EmailUpdate {
    pub fn read(read: bool) -> Self {
        Self {
            read: Some(read),
            ..Self::default()
        }
    }

    pub fn archived(archived: bool) -> Self {
        Self {
            archived: Some(archived),
            ..Self::default()
        }
    }
}

const REPLY_PREFIX: &str = "RE: ";

/// Contents of the compose form. `recipients` is the raw comma-separated field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposeDraft {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

impl ComposeDraft {
    pub fn new(
        recipients: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipients: recipients.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Prefill for answering `original`: addressed to its sender, subject
    /// prefixed once with "RE: ", and the original quoted at the top.
    pub fn reply_to(original: &Email) -> Self {
        let subject = original
            .subject
            .strip_prefix(REPLY_PREFIX)
            .unwrap_or(&original.subject);

        Self {
            recipients: original.sender.clone(),
            subject: format!("{REPLY_PREFIX}{subject}"),
            body: format!(
                "On {} {} wrote:\n{}\n\n",
                original.timestamp, original.sender, original.body
            ),
        }
    }
}
