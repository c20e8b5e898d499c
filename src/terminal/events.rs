use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::{Command, View, ViewController};
use crate::domain::email::Mailbox;
use crate::terminal::state::{ComposeField, TuiState};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Nothing,
    Quit,
    Dispatch(Command),
}

pub fn handle_key(key: KeyEvent, ctl: &mut ViewController, ui: &mut TuiState) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    // a notice blocks until acknowledged
    if ctl.notice().is_some() {
        ctl.dismiss_notice();
        return Action::Nothing;
    }

    if ctl.view() == View::Compose {
        return handle_compose_keys(key, ctl, ui);
    }

    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('i') => return Action::Dispatch(Command::LoadMailbox(Mailbox::Inbox)),
        KeyCode::Char('s') => return Action::Dispatch(Command::LoadMailbox(Mailbox::Sent)),
        KeyCode::Char('a') => return Action::Dispatch(Command::LoadMailbox(Mailbox::Archive)),
        KeyCode::Char('c') => return Action::Dispatch(Command::Compose(None)),
        _ => {}
    }

    match ctl.view() {
        View::MailboxList => handle_list_keys(key, ctl, ui),
        View::Read => handle_read_keys(key, ctl, ui),
        View::Compose => Action::Nothing,
    }
}

fn handle_list_keys(key: KeyEvent, ctl: &ViewController, ui: &mut TuiState) -> Action {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => ui.move_selection(ctl, 1),
        KeyCode::Up | KeyCode::Char('k') => ui.move_selection(ctl, -1),
        KeyCode::Home => ui.move_selection(ctl, i32::MIN / 2),
        KeyCode::End => ui.move_selection(ctl, i32::MAX / 2),
        KeyCode::Enter => {
            if let Some(id) = ui.selected_id(ctl) {
                return Action::Dispatch(Command::LoadEmail(id));
            }
        }
        _ => {}
    }
    Action::Nothing
}

fn handle_read_keys(key: KeyEvent, ctl: &ViewController, ui: &mut TuiState) -> Action {
    let Some(id) = ctl.reading().map(|p| p.email.id) else {
        return Action::Nothing;
    };
    match key.code {
        KeyCode::Char('A') => return Action::Dispatch(Command::ToggleArchive(id)),
        KeyCode::Char('r') => return Action::Dispatch(Command::Reply(id)),
        KeyCode::Esc => return Action::Dispatch(Command::LoadMailbox(ui.last_mailbox.clone())),
        KeyCode::Down | KeyCode::Char('j') => ui.scroll_body(1),
        KeyCode::Up | KeyCode::Char('k') => ui.scroll_body(-1),
        KeyCode::PageDown => ui.scroll_body(10),
        KeyCode::PageUp => ui.scroll_body(-10),
        KeyCode::Home => ui.body_scroll = 0,
        _ => {}
    }
    Action::Nothing
}

fn handle_compose_keys(key: KeyEvent, ctl: &mut ViewController, ui: &mut TuiState) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            return Action::Dispatch(Command::Send);
        }
        return Action::Nothing;
    }

    match key.code {
        KeyCode::Esc => return Action::Dispatch(Command::LoadMailbox(Mailbox::Inbox)),
        KeyCode::Tab => ui.compose_field = ui.compose_field.next(),
        KeyCode::BackTab => ui.compose_field = ui.compose_field.prev(),
        KeyCode::Enter => match ui.compose_field {
            ComposeField::Body => ctl.draft_mut().body.push('\n'),
            field => ui.compose_field = field.next(),
        },
        KeyCode::Backspace => {
            ui.compose_field.value_mut(ctl.draft_mut()).pop();
        }
        KeyCode::Char(c) => ui.compose_field.value_mut(ctl.draft_mut()).push(c),
        _ => {}
    }
    Action::Nothing
}
