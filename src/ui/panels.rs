use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use crate::app::App;
use crate::model::AuthMethod;
use crate::ui::constants::{APP_TITLE, CREDENTIALS_HELP_TEXT, LIST_HELP_TEXT};
use crate::ui::helpers::{list_state, truncate_text};
use crate::views::credentials::CredentialManager;

pub(crate) fn draw_app_header(frame: &mut Frame<'_>, area: Rect, help: &str) {
    let title = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(help.to_string(), Style::default().fg(Color::Gray)),
    ]);
    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

pub(crate) fn list_help(manager: Option<&CredentialManager>) -> &'static str {
    if manager.is_some() {
        CREDENTIALS_HELP_TEXT
    } else {
        LIST_HELP_TEXT
    }
}

pub(crate) fn draw_connection_list(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let width = area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = if app.data.connections.is_empty() {
        vec![ListItem::new("No saved connections, press a to add one")]
    } else {
        app.data
            .connections
            .iter()
            .map(|conn| {
                let glyph = conn.icon.unwrap_or_default().glyph();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{glyph} "), Style::default().fg(Color::Green)),
                    Span::raw(truncate_text(&conn.label, width)),
                ]))
            })
            .collect()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(Line::from(Span::styled("Connections", header_style)))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">");
    let mut state = list_state(app.selected, app.data.connections.len());
    frame.render_stateful_widget(list, area, &mut state);
}

pub(crate) fn draw_credential_list(
    frame: &mut Frame<'_>,
    app: &App,
    manager: &CredentialManager,
    area: Rect,
) {
    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let items: Vec<ListItem> = if app.data.credentials.is_empty() {
        vec![ListItem::new("No credentials, press a to add one")]
    } else {
        app.data
            .credentials
            .iter()
            .map(|cred| {
                let users = app.data.credential_users(&cred.id);
                ListItem::new(Line::from(vec![
                    Span::raw(cred.label.clone()),
                    Span::styled(
                        format!("  {}  ({users} in use)", cred.username),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(Line::from(Span::styled("Credentials", header_style)))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">");
    let mut state = list_state(manager.selected(), app.data.credentials.len());
    frame.render_stateful_widget(list, area, &mut state);
}

pub(crate) fn draw_details(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(Span::styled("Connection details", header_style)));
    let Some(conn) = app.data.connections.get(app.selected) else {
        let empty = Paragraph::new("No saved connection selected")
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let user = conn
        .login_user(&app.data.credentials)
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| "(asked on connect)".to_string());
    let auth = match conn.auth {
        AuthMethod::Password => AuthMethod::Password.label().to_string(),
        AuthMethod::Credential => {
            let label = conn
                .credential_id
                .as_deref()
                .and_then(|id| app.data.credential(id))
                .map(|cred| cred.label.clone())
                .unwrap_or_else(|| "missing".to_string());
            format!("{} ({label})", AuthMethod::Credential.label())
        }
    };
    let icon = conn.icon.unwrap_or_default();
    let lines = vec![
        Line::from(vec![Span::styled("Label: ", bold), Span::raw(conn.label.clone())]),
        Line::from(vec![Span::styled("Host: ", bold), Span::raw(conn.host.clone())]),
        Line::from(vec![Span::styled("Port: ", bold), Span::raw(conn.port.to_string())]),
        Line::from(vec![Span::styled("User: ", bold), Span::raw(user)]),
        Line::from(vec![Span::styled("Auth: ", bold), Span::raw(auth)]),
        Line::from(vec![
            Span::styled("Icon: ", bold),
            Span::raw(format!("{} {}", icon.glyph(), icon.label())),
        ]),
    ];
    let details = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(details, area);
}

pub(crate) fn draw_logs(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let log_lines = app
        .log_lines
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .cloned()
        .collect::<Vec<_>>();
    let logs = Paragraph::new(log_lines.join("\n"))
        .block(
            Block::default()
                .title(Line::from(Span::styled(
                    "Logs",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(logs, area);
}

pub(crate) fn draw_status_line(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" Status: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(truncate_text(&app.status, area.width.saturating_sub(9) as usize)),
    ]))
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(status, area);
}
