use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::{App, View};
use crate::ui::browser::draw_browser;
use crate::ui::constants::{HEADER_HEIGHT, LOGS_HEIGHT, STATUS_HEIGHT, body_columns};
use crate::ui::modals::{
    draw_confirm_modal, draw_connection_form, draw_credential_form, draw_mode_menu,
};
use crate::ui::panels::{
    draw_app_header, draw_connection_list, draw_credential_list, draw_details, draw_logs,
    draw_status_line, list_help,
};

mod browser;
pub(crate) mod constants;
mod helpers;
mod modals;
mod panels;

pub(crate) fn draw_ui(frame: &mut Frame<'_>, app: &App) {
    match &app.view {
        View::RemoteBrowser(browser) => draw_browser(frame, browser, frame.area()),
        _ => draw_main_ui(frame, app, frame.area()),
    }

    match &app.view {
        View::ConnectionForm(form) => draw_connection_form(frame, form),
        View::CredentialManager(manager) => {
            if let Some(form) = manager.form() {
                draw_credential_form(frame, form);
            }
        }
        View::ModeMenu(menu) => draw_mode_menu(frame, menu),
        View::ConnectionList | View::RemoteBrowser(_) => {}
    }
    if let Some((modal, _)) = &app.confirm {
        draw_confirm_modal(frame, modal);
    }
}

fn draw_main_ui(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let manager = match &app.view {
        View::CredentialManager(manager) => Some(manager),
        _ => None,
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(STATUS_HEIGHT),
            ]
            .as_ref(),
        )
        .split(area);
    draw_app_header(frame, rows[0], list_help(manager));

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(body_columns().as_ref())
        .split(rows[1]);
    match manager {
        Some(manager) => draw_credential_list(frame, app, manager, body[0]),
        None => draw_connection_list(frame, app, body[0]),
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(LOGS_HEIGHT)].as_ref())
        .split(body[1]);
    draw_details(frame, app, right[0]);
    draw_logs(frame, app, right[1]);
    draw_status_line(frame, app, rows[2]);
}
