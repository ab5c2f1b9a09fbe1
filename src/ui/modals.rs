use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::model::SessionMode;
use crate::ui::constants::{
    CONFIRM_WIDTH_PERCENT, LABEL_WIDTH, MENU_WIDTH, MODAL_MAX_HEIGHT_PERCENT, MODAL_MIN_WIDTH,
    MODAL_WIDTH_PERCENT,
};
use crate::ui::helpers::{
    action_line, centered_rect_abs, centered_rect_by_height, draw_popup_frame, field_line,
    input_window, key_hint, modal_height, place_input_cursor, scroll_for,
};
use crate::views::FormMode;
use crate::views::connection_form::{ConnectionField, ConnectionForm};
use crate::views::credential_form::{CredentialField, CredentialForm};
use crate::views::input::TextInput;
use crate::views::menu::ModeMenu;
use crate::views::modal::{Choice, ConfirmModal};

struct FormRow<'a> {
    line: Line<'static>,
    input: Option<&'a TextInput>,
    active: bool,
}

fn form_footer() -> Vec<Line<'static>> {
    let mut spans = key_hint("Tab/Up/Down", "move,");
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Left/Right", "change,"));
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Enter", "select,"));
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Esc", "cancel"));
    vec![Line::from(spans)]
}

fn draw_form(frame: &mut Frame<'_>, title: &str, rows: Vec<FormRow<'_>>, error: Option<&str>) {
    let footer_lines = form_footer();
    let area_width = (frame.area().width.saturating_mul(MODAL_WIDTH_PERCENT) / 100)
        .min(frame.area().width.saturating_sub(2))
        .max(MODAL_MIN_WIDTH);
    let content_width = area_width.saturating_sub(4);
    let value_x_offset = 2 + LABEL_WIDTH as u16 + 2;
    let max_height = frame.area().height.saturating_mul(MODAL_MAX_HEIGHT_PERCENT) / 100;

    let active_row = rows.iter().position(|row| row.active).unwrap_or(0);
    let mut lines: Vec<Line<'static>> = rows.iter().map(|row| row.line.clone()).collect();
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    let desired_height = modal_height(lines.len(), footer_lines.len() + 1);
    let area_height = desired_height
        .max(10)
        .min(max_height.max(10))
        .min(frame.area().height.saturating_sub(2));
    let area = centered_rect_abs(area_width, area_height, frame.area());
    let inner = draw_popup_frame(frame, area, title, Style::default().fg(Color::Yellow));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(footer_lines.len() as u16 + 1),
            ]
            .as_ref(),
        )
        .split(inner);

    let max_visible = layout[0].height as usize;
    let scroll = scroll_for(active_row, lines.len(), max_visible);
    let visible: Vec<Line<'static>> = lines.into_iter().skip(scroll).take(max_visible).collect();
    frame.render_widget(Paragraph::new(visible), layout[0]);

    if let Some(input) = rows.get(active_row).and_then(|row| row.input) {
        let visible_row = active_row.saturating_sub(scroll);
        if visible_row < max_visible {
            place_input_cursor(
                frame,
                input,
                layout[0].x + value_x_offset,
                layout[0].y + visible_row as u16,
                content_width.saturating_sub(value_x_offset),
            );
        }
    }

    let footer = Paragraph::new(footer_lines)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

fn value_width(frame: &Frame<'_>) -> usize {
    let area_width = (frame.area().width.saturating_mul(MODAL_WIDTH_PERCENT) / 100)
        .max(MODAL_MIN_WIDTH);
    area_width.saturating_sub(4 + 2 + LABEL_WIDTH as u16 + 2) as usize
}

fn connection_field_label(field: ConnectionField) -> &'static str {
    match field {
        ConnectionField::Label => "Label",
        ConnectionField::Host => "Host",
        ConnectionField::Port => "Port",
        ConnectionField::Auth => "Auth",
        ConnectionField::Credential => "Credential",
        ConnectionField::Username => "Username",
        ConnectionField::Password => "Password",
        ConnectionField::Icon => "Icon",
        ConnectionField::Submit => "Save",
        ConnectionField::Cancel => "Cancel",
    }
}

pub(crate) fn draw_connection_form(frame: &mut Frame<'_>, form: &ConnectionForm) {
    let width = value_width(frame);
    let rows: Vec<FormRow<'_>> = form
        .fields()
        .iter()
        .map(|&field| {
            let active = form.focused() == field;
            let label = connection_field_label(field);
            let input = form.input(field);
            let line = match field {
                ConnectionField::Submit | ConnectionField::Cancel => action_line(label, active),
                ConnectionField::Auth => {
                    let value = format!("< {} >", form.auth().label());
                    field_line(label, &value, active, LABEL_WIDTH, width)
                }
                ConnectionField::Credential => {
                    let value = form
                        .selected_credential()
                        .map(|cred| format!("< {} ({}) >", cred.label, cred.username))
                        .unwrap_or_else(|| "none, create one with c on the list".to_string());
                    field_line(label, &value, active, LABEL_WIDTH, width)
                }
                ConnectionField::Icon => {
                    let icon = form.icon();
                    let value = format!("< {} {} >", icon.glyph(), icon.label());
                    field_line(label, &value, active, LABEL_WIDTH, width)
                }
                _ => {
                    let value = input
                        .map(|input| input_window(input, width).0)
                        .unwrap_or_default();
                    field_line(label, &value, active, LABEL_WIDTH, width)
                }
            };
            FormRow {
                line,
                input,
                active,
            }
        })
        .collect();
    let title = match form.mode() {
        FormMode::Add => "New connection",
        FormMode::Edit => "Edit connection",
    };
    draw_form(frame, title, rows, form.error());
}

pub(crate) fn draw_credential_form(frame: &mut Frame<'_>, form: &CredentialForm) {
    let width = value_width(frame);
    let rows: Vec<FormRow<'_>> = form
        .fields()
        .iter()
        .map(|&field| {
            let active = form.focused() == field;
            let input = form.input(field);
            let line = match field {
                CredentialField::Submit => action_line("Save", active),
                CredentialField::Cancel => action_line("Cancel", active),
                CredentialField::Label | CredentialField::Username | CredentialField::Password => {
                    let label = match field {
                        CredentialField::Label => "Label",
                        CredentialField::Username => "Username",
                        _ => "Password",
                    };
                    let value = input
                        .map(|input| input_window(input, width).0)
                        .unwrap_or_default();
                    field_line(label, &value, active, LABEL_WIDTH, width)
                }
            };
            FormRow {
                line,
                input,
                active,
            }
        })
        .collect();
    let title = match form.mode() {
        FormMode::Add => "New credential",
        FormMode::Edit => "Edit credential (empty password keeps the stored one)",
    };
    draw_form(frame, title, rows, form.error());
}

pub(crate) fn draw_confirm_modal(frame: &mut Frame<'_>, modal: &ConfirmModal) {
    let height = modal_height(3, 2);
    let area = centered_rect_by_height(CONFIRM_WIDTH_PERCENT, height, frame.area());
    let inner = draw_popup_frame(frame, area, modal.title(), Style::default().fg(Color::Red));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(2)].as_ref())
        .split(inner);

    let message = Paragraph::new(modal.message().to_string()).wrap(Wrap { trim: true });
    frame.render_widget(message, layout[0]);

    let button = |label: &'static str, selected: bool| {
        if selected {
            Span::styled(
                format!("[ {label} ]"),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!("  {label}  "))
        }
    };
    let buttons = Paragraph::new(Line::from(vec![
        button("Yes", modal.choice() == Choice::Yes),
        Span::raw("   "),
        button("No", modal.choice() == Choice::No),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(buttons, layout[1]);

    let mut spans = key_hint("Left/Right", "choose,");
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Enter", "confirm,"));
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Esc", "cancel"));
    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[2]);
}

pub(crate) fn draw_mode_menu(frame: &mut Frame<'_>, menu: &ModeMenu) {
    let height = modal_height(SessionMode::ALL.len(), 2);
    let area = centered_rect_abs(MENU_WIDTH, height, frame.area());
    let inner = draw_popup_frame(frame, area, menu.title(), Style::default().fg(Color::Cyan));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    let lines: Vec<Line<'static>> = SessionMode::ALL
        .iter()
        .enumerate()
        .map(|(index, mode)| action_line(mode.label(), index == menu.selected()))
        .collect();
    frame.render_widget(Paragraph::new(lines), layout[0]);
    let mut spans = key_hint("Enter", "open,");
    spans.push(Span::raw(" "));
    spans.extend(key_hint("Esc", "back"));
    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::model::Credential;
    use crate::ui::helpers::buffer_text;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render(draw: impl FnOnce(&mut Frame<'_>)) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(draw).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn connection_form_swaps_fields_with_auth() {
        let creds = vec![Credential {
            id: "k1".to_string(),
            label: "ops".to_string(),
            username: "deploy".to_string(),
        }];
        let form = ConnectionForm::new(FormMode::Add, None, None, creds, 22);
        let content = render(|frame| draw_connection_form(frame, &form));
        assert!(content.contains("New connection"));
        assert!(content.contains("Username"));
        assert!(!content.contains("Credential"));

        let mut form = form;
        while form.focused() != ConnectionField::Auth {
            form = form.update(key(KeyCode::Tab));
        }
        let form = form.update(key(KeyCode::Right));
        let content = render(|frame| draw_connection_form(frame, &form));
        assert!(content.contains("Credential"));
        assert!(content.contains("ops (deploy)"));
        assert!(!content.contains("Username"));
    }

    #[test]
    fn password_is_masked() {
        let mut form = CredentialForm::new(FormMode::Add, None, None);
        while form.focused() != CredentialField::Password {
            form = form.update(key(KeyCode::Tab));
        }
        for ch in "topsecret".chars() {
            form = form.update(key(KeyCode::Char(ch)));
        }
        let content = render(|frame| draw_credential_form(frame, &form));
        assert!(!content.contains("topsecret"));
        assert!(content.contains("*********"));
    }

    #[test]
    fn confirm_modal_highlights_default_no() {
        let modal = ConfirmModal::new("Delete connection", "Delete 'web'?");
        let content = render(|frame| draw_confirm_modal(frame, &modal));
        assert!(content.contains("Delete 'web'?"));
        assert!(content.contains("[ No ]"));
        assert!(!content.contains("[ Yes ]"));
    }

    #[test]
    fn menu_lists_both_modes() {
        let menu = ModeMenu::new("c1", "web");
        let content = render(|frame| draw_mode_menu(frame, &menu));
        assert!(content.contains("SSH terminal"));
        assert!(content.contains("SFTP browser"));
    }
}
