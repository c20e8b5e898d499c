use ratatui::widgets::ListState;

use crate::controller::{View, ViewController};
use crate::domain::email::{ComposeDraft, EmailId, Mailbox};

/// Which compose field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposeField {
    #[default]
    Recipients,
    Subject,
    Body,
}

impl ComposeField {
    pub fn next(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Subject,
            ComposeField::Subject => ComposeField::Body,
            ComposeField::Body => ComposeField::Recipients,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Body,
            ComposeField::Subject => ComposeField::Recipients,
            ComposeField::Body => ComposeField::Subject,
        }
    }

    pub fn value_mut(self, draft: &mut ComposeDraft) -> &mut String {
        match self {
            ComposeField::Recipients => &mut draft.recipients,
            ComposeField::Subject => &mut draft.subject,
            ComposeField::Body => &mut draft.body,
        }
    }
}

/// Terminal-only state layered over the controller: selection, focus, scroll.
pub struct TuiState {
    pub user_email: Option<String>,
    pub list_state: ListState,
    pub compose_field: ComposeField,
    pub body_scroll: u16,
    /// Mailbox the read view returns to.
    pub last_mailbox: Mailbox,
    seen_view: View,
    seen_rows: usize,
}

impl TuiState {
    pub fn new(user_email: Option<String>) -> Self {
        Self {
            user_email,
            list_state: ListState::default(),
            compose_field: ComposeField::default(),
            body_scroll: 0,
            last_mailbox: Mailbox::Inbox,
            seen_view: View::default(),
            seen_rows: 0,
        }
    }

    /// Called after every controller change so selection and focus follow
    /// what is on screen.
    pub fn sync(&mut self, ctl: &ViewController) {
        let view = ctl.view();
        if view != self.seen_view {
            self.body_scroll = 0;
            self.compose_field = ComposeField::default();
            self.seen_view = view;
        }

        let rows = ctl.listing().map(|l| l.rows.len()).unwrap_or(0);
        if let Some(listing) = ctl.listing() {
            self.last_mailbox = listing.mailbox.clone();
        }
        if rows != self.seen_rows || self.list_state.selected().is_none() {
            self.list_state.select(if rows == 0 { None } else { Some(0) });
            self.seen_rows = rows;
        }
    }

    pub fn move_selection(&mut self, ctl: &ViewController, delta: i32) {
        let len = ctl.listing().map(|l| l.rows.len()).unwrap_or(0) as i32;
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len - 1) as usize;
        self.list_state.select(Some(next));
    }

    pub fn selected_id(&self, ctl: &ViewController) -> Option<EmailId> {
        let idx = self.list_state.selected()?;
        ctl.listing()?.rows.get(idx).map(|r| r.id)
    }

    pub fn scroll_body(&mut self, delta: i32) {
        if delta < 0 {
            self.body_scroll = self.body_scroll.saturating_sub((-delta) as u16);
        } else {
            self.body_scroll = self.body_scroll.saturating_add(delta as u16);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_cycle() {
        let f = ComposeField::Recipients;
        assert_eq!(f.next().next().next(), f);
        assert_eq!(f.prev(), ComposeField::Body);
    }

    #[test]
    fn compose_entry_resets_focus() {
        let mut ctl = ViewController::new();
        let mut ui = TuiState::new(None);
        ctl.compose_email(None);
        ui.compose_field = ComposeField::Body;
        ui.sync(&ctl);
        assert_eq!(ui.compose_field, ComposeField::Recipients);
    }
}
