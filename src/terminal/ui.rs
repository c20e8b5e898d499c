use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::controller::view::{MailboxListing, ReadPane};
use crate::controller::{View, ViewController};
use crate::terminal::state::{ComposeField, TuiState};

pub fn render(f: &mut Frame, ctl: &ViewController, ui: &TuiState) {
    let [header, main, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, ctl, ui);

    match ctl.view() {
        View::MailboxList => render_listing(f, main, ctl.listing(), ui),
        View::Read => render_read(f, main, ctl.reading(), ui),
        View::Compose => render_compose(f, main, ctl, ui),
    }

    render_hints(f, footer, ctl.view());

    if let Some(notice) = ctl.notice() {
        render_notice(f, main, notice);
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().add_modifier(Modifier::BOLD))
}

fn render_header(f: &mut Frame, area: Rect, ctl: &ViewController, ui: &TuiState) {
    let mut spans = vec![
        key(" i"),
        Span::raw(" Inbox  "),
        key("s"),
        Span::raw(" Sent  "),
        key("a"),
        Span::raw(" Archived  "),
        key("c"),
        Span::raw(" Compose  "),
    ];
    if let Some(user) = &ui.user_email {
        spans.push(Span::styled(user.clone(), Style::default().fg(Color::Cyan)));
    }
    if ctl.is_busy() {
        spans.push(Span::styled("  loading...", Style::default().fg(Color::Yellow)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_listing(f: &mut Frame, area: Rect, listing: Option<&MailboxListing>, ui: &TuiState) {
    let Some(listing) = listing else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ({} unread) ", listing.title, listing.unread_count()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let items: Vec<ListItem> = listing
        .rows
        .iter()
        .map(|row| {
            // unread rows stand out, read rows recede
            let style = if row.read {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<30} ", row.label), style.add_modifier(Modifier::BOLD)),
                Span::styled(format!("{:<40} ", row.subject), style),
                Span::styled(row.timestamp.clone(), style.fg(Color::Gray)),
            ]);
            ListItem::new(Text::from(line))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));

    f.render_stateful_widget(list, area, &mut ui.list_state.clone());
}

fn render_read(f: &mut Frame, area: Rect, pane: Option<&ReadPane>, ui: &TuiState) {
    let Some(pane) = pane else {
        return;
    };
    let email = &pane.email;

    let [head, body, buttons] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let label = Style::default().fg(Color::Yellow);
    let head_text = vec![
        Line::from(vec![Span::styled("From: ", label), Span::raw(&email.sender)]),
        Line::from(vec![Span::styled("To: ", label), Span::raw(pane.recipients_line())]),
        Line::from(vec![Span::styled("Subject: ", label), Span::raw(&email.subject)]),
        Line::from(Span::styled(&email.timestamp, Style::default().fg(Color::Gray))),
    ];
    f.render_widget(
        Paragraph::new(head_text).block(Block::default().borders(Borders::ALL).title(" Email ")),
        head,
    );

    let p = Paragraph::new(email.body.as_str())
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((ui.body_scroll, 0));
    f.render_widget(p, body);

    let button = Style::default().fg(Color::Black).bg(Color::Cyan);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" [A] {} ", pane.archive_label()), button),
            Span::raw("  "),
            Span::styled(" [r] Reply ", button),
        ])),
        buttons,
    );
}

fn render_compose(f: &mut Frame, area: Rect, ctl: &ViewController, ui: &TuiState) {
    let [to, subject, body] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(5),
    ])
    .areas(area);

    let draft = ctl.draft();
    let field = |title: &'static str, value: &str, which: ComposeField| {
        let border = if ui.compose_field == which {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        Paragraph::new(value.to_string())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
    };

    f.render_widget(field(" To ", &draft.recipients, ComposeField::Recipients), to);
    f.render_widget(field(" Subject ", &draft.subject, ComposeField::Subject), subject);
    f.render_widget(field(" Body ", &draft.body, ComposeField::Body), body);
}

fn render_hints(f: &mut Frame, area: Rect, view: View) {
    let spans = match view {
        View::MailboxList => vec![
            key("j/k"),
            Span::raw(" move  "),
            key("Enter"),
            Span::raw(" open  "),
            key("q"),
            Span::raw(" quit"),
        ],
        View::Read => vec![
            key("A"),
            Span::raw(" archive  "),
            key("r"),
            Span::raw(" reply  "),
            key("Esc"),
            Span::raw(" back  "),
            key("q"),
            Span::raw(" quit"),
        ],
        View::Compose => vec![
            key("Tab"),
            Span::raw(" next field  "),
            key("Ctrl-S"),
            Span::raw(" send  "),
            key("Esc"),
            Span::raw(" cancel"),
        ],
    };
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(f: &mut Frame, area: Rect, notice: &str) {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Percentage(20),
        Constraint::Percentage(60),
        Constraint::Percentage(20),
    ])
    .areas(row);

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(notice.to_string())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(" Notice (any key) ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            ),
        popup,
    );
}
