use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::RemoteEntry;
use crate::ui::constants::{BROWSER_HELP, MODIFIED_FORMAT, SIZE_COLUMN_WIDTH};
use crate::ui::helpers::{format_bytes, input_window, place_input_cursor, truncate_text};
use crate::views::browser::{BrowserMode, FileBrowser, MessageKind};
use crate::views::input::TextInput;

pub(crate) fn format_size(entry: &RemoteEntry) -> String {
    if entry.is_dir {
        "-".to_string()
    } else {
        format_bytes(entry.size)
    }
}

pub(crate) fn format_modified(modified: Option<u64>) -> String {
    modified
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|time| {
            time.with_timezone(&chrono::Local)
                .format(MODIFIED_FORMAT)
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

fn entry_line(entry: &RemoteEntry, selected: bool, width: usize) -> Line<'static> {
    let name = if entry.is_dir {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    };
    let prefix = format!(
        "{} {:>SIZE_COLUMN_WIDTH$}  {:<16}  ",
        entry.permissions,
        format_size(entry),
        format_modified(entry.modified)
    );
    let name_width = width.saturating_sub(prefix.chars().count() + 2);
    let name_style = if entry.is_dir {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let (marker, line_style) = if selected {
        (
            "> ",
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default())
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(prefix, Style::default().fg(Color::Gray)),
        Span::styled(truncate_text(&name, name_width), name_style),
    ])
    .style(line_style)
}

fn path_box(browser: &FileBrowser) -> (String, String, Option<&TextInput>) {
    match browser.mode() {
        BrowserMode::GoToPath(input) => ("Go to".into(), input.value().to_string(), Some(input)),
        BrowserMode::CreateFile(input) => {
            ("New file".into(), input.value().to_string(), Some(input))
        }
        BrowserMode::CreateDir(input) => {
            ("New directory".into(), input.value().to_string(), Some(input))
        }
        BrowserMode::Rename { target, input } => (
            format!("Rename {}", target.name),
            input.value().to_string(),
            Some(input),
        ),
        BrowserMode::Browsing | BrowserMode::DeleteConfirm { .. } => {
            ("Path".into(), browser.path().to_string(), None)
        }
    }
}

pub(crate) fn draw_browser(frame: &mut Frame<'_>, browser: &FileBrowser, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(area);

    let hidden = if browser.show_hidden() { "shown" } else { "hidden" };
    let title = Line::from(vec![
        Span::styled(
            format!(" SFTP {}", browser.title()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} entries, dotfiles {hidden}", browser.entries().len()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), layout[0]);

    let (label, value, input) = path_box(browser);
    let box_style = if input.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let path_block = Block::default()
        .borders(Borders::ALL)
        .border_style(box_style)
        .title(label);
    let inner = path_block.inner(layout[1]);
    let shown = match input {
        Some(input) => input_window(input, inner.width as usize).0,
        None => truncate_text(&value, inner.width as usize),
    };
    let path = Paragraph::new(shown).block(path_block);
    frame.render_widget(path, layout[1]);
    if let Some(input) = input {
        place_input_cursor(frame, input, inner.x, inner.y, inner.width);
    }

    let message = match (browser.mode(), browser.message()) {
        (BrowserMode::DeleteConfirm { target }, _) => Line::from(Span::styled(
            format!(" Delete {}? Press y to confirm, any other key cancels", target.name),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        (_, Some(message)) => {
            let color = match message.kind {
                MessageKind::Info => Color::Green,
                MessageKind::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {}", message.text),
                Style::default().fg(color),
            ))
        }
        (_, None) => Line::from(""),
    };
    frame.render_widget(Paragraph::new(message), layout[2]);

    let indicator_style = Style::default().fg(Color::DarkGray);
    let above = browser.scroll();
    if above > 0 {
        frame.render_widget(
            Paragraph::new(format!("  ^ {above} more")).style(indicator_style),
            layout[3],
        );
    }

    let width = layout[4].width as usize;
    let lines: Vec<Line<'static>> = if browser.entries().is_empty() {
        vec![Line::from(Span::styled(
            "  (empty directory)",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        browser
            .visible_entries()
            .iter()
            .enumerate()
            .map(|(offset, entry)| {
                entry_line(entry, browser.scroll() + offset == browser.selected(), width)
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines), layout[4]);

    let below = browser
        .entries()
        .len()
        .saturating_sub(browser.scroll() + browser.visible_count());
    if below > 0 {
        frame.render_widget(
            Paragraph::new(format!("  v {below} more")).style(indicator_style),
            layout[5],
        );
    }

    let help: Vec<Line<'static>> = BROWSER_HELP
        .iter()
        .map(|line| Line::from(Span::styled(*line, Style::default().fg(Color::Gray))))
        .collect();
    frame.render_widget(Paragraph::new(help), layout[6]);
}
