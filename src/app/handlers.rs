use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::constants::{NO_CONNECTION_SELECTED, STATUS_CANCELLED};
use crate::app::{App, PendingAction, View};
use crate::model::SessionRequest;
use crate::views::FormMode;
use crate::views::browser::{BrowserSignal, FileBrowser};
use crate::views::connection_form::ConnectionForm;
use crate::views::credentials::CredentialManager;
use crate::views::menu::{MenuOutcome, ModeMenu};
use crate::views::modal::{ConfirmModal, ModalOutcome};

fn is_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => !key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl App {
    /// Routes one key press. Returns `true` when the application should exit.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some((modal, action)) = self.confirm.take() {
            self.handle_confirm_key(modal, action, key);
            return Ok(false);
        }
        if is_quit(key) && matches!(self.view, View::ConnectionList | View::ModeMenu(_)) {
            return Ok(true);
        }
        self.view = match std::mem::take(&mut self.view) {
            View::ConnectionList => self.handle_list_key(key),
            View::ModeMenu(menu) => self.handle_menu_key(menu, key),
            View::ConnectionForm(form) => self.handle_connection_form_key(form, key),
            View::CredentialManager(manager) => self.handle_manager_key(manager, key),
            View::RemoteBrowser(browser) => self.handle_browser_key(browser, key),
        };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, modal: ConfirmModal, action: PendingAction, key: KeyEvent) {
        let modal = modal.update(key);
        match modal.outcome() {
            ModalOutcome::Open => self.confirm = Some((modal, action)),
            ModalOutcome::Cancelled => self.set_status(STATUS_CANCELLED),
            ModalOutcome::Confirmed => match action {
                PendingAction::DeleteConnection { id } => self.delete_connection(&id),
                PendingAction::DeleteCredential { id } => self.delete_credential(&id),
            },
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> View {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.data.connections.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.data.connections.len().saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let Some(conn) = self.data.connections.get(self.selected) else {
                    self.set_status(NO_CONNECTION_SELECTED);
                    return View::ConnectionList;
                };
                let title = format!("{} ({})", conn.label, conn.target(&self.data.credentials));
                return View::ModeMenu(ModeMenu::new(conn.id.clone(), title));
            }
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.set_status("Fill in the fields and submit");
                return View::ConnectionForm(ConnectionForm::new(
                    FormMode::Add,
                    None,
                    None,
                    self.data.credentials.clone(),
                    self.data.settings.default_port,
                ));
            }
            KeyCode::Char('e') => return self.open_connection_editor(),
            KeyCode::Char('d') => {
                let Some(conn) = self.data.connections.get(self.selected) else {
                    self.set_status(NO_CONNECTION_SELECTED);
                    return View::ConnectionList;
                };
                let modal = ConfirmModal::new(
                    "Delete connection",
                    format!("Delete '{}'? This cannot be undone.", conn.label),
                );
                let action = PendingAction::DeleteConnection {
                    id: conn.id.clone(),
                };
                self.confirm = Some((modal, action));
            }
            KeyCode::Char('c') => {
                self.set_status("Manage credentials");
                return View::CredentialManager(CredentialManager::new());
            }
            _ => {}
        }
        View::ConnectionList
    }

    fn handle_menu_key(&mut self, menu: ModeMenu, key: KeyEvent) -> View {
        let (menu, outcome) = menu.update(key);
        match outcome {
            MenuOutcome::Open => View::ModeMenu(menu),
            MenuOutcome::Back => View::ConnectionList,
            MenuOutcome::Chosen(mode) => {
                let Some(connection) = self.data.connection(menu.connection_id()).cloned() else {
                    self.set_status(NO_CONNECTION_SELECTED);
                    return View::ConnectionList;
                };
                let Some(username) = connection.login_user(&self.data.credentials) else {
                    self.set_status(format!(
                        "Credential for '{}' no longer exists, edit the connection",
                        connection.label
                    ));
                    return View::ConnectionList;
                };
                self.set_status(format!("Opening {} for {}", mode.label(), connection.label));
                self.session_request = Some(SessionRequest {
                    connection,
                    username,
                    mode,
                });
                View::ConnectionList
            }
        }
    }

    fn handle_browser_key(&mut self, mut browser: FileBrowser, key: KeyEvent) -> View {
        match browser.handle_key(key) {
            BrowserSignal::Continue => View::RemoteBrowser(browser),
            BrowserSignal::Close => {
                self.set_status(format!("Closed {}", browser.title()));
                View::ConnectionList
            }
            BrowserSignal::Edit(path) => {
                self.edit_request = Some(path);
                View::RemoteBrowser(browser)
            }
        }
    }
}
