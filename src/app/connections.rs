use anyhow::Result;
use crossterm::event::KeyEvent;

use crate::app::constants::{NO_CONNECTION_SELECTED, STATUS_CANCELLED};
use crate::app::{App, View};
use crate::model::StoreFile;
use crate::secrets::SecretKey;
use crate::views::FormMode;
use crate::views::connection_form::ConnectionForm;

impl App {
    pub(super) fn commit<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreFile) -> Result<()>,
    {
        let mut next = self.data.clone();
        change(&mut next)?;
        self.store.save(&next)?;
        self.data = next;
        Ok(())
    }

    pub(super) fn open_connection_editor(&mut self) -> View {
        let Some(conn) = self.data.connections.get(self.selected).cloned() else {
            self.set_status(NO_CONNECTION_SELECTED);
            return View::ConnectionList;
        };
        let password = match self.secrets.get(&SecretKey::Connection(conn.id.clone())) {
            Ok(password) => password,
            Err(err) => {
                self.log_line(&format!("Could not read password for {}: {err:#}", conn.label));
                None
            }
        };
        self.set_status(format!("Editing {}", conn.label));
        View::ConnectionForm(ConnectionForm::new(
            FormMode::Edit,
            Some(&conn),
            password,
            self.data.credentials.clone(),
            self.data.settings.default_port,
        ))
    }

    pub(super) fn handle_connection_form_key(&mut self, form: ConnectionForm, key: KeyEvent) -> View {
        let form = form.update(key);
        if form.is_cancelled() {
            self.set_status(STATUS_CANCELLED);
            return View::ConnectionList;
        }
        if form.is_submitted() {
            return self.submit_connection(form);
        }
        View::ConnectionForm(form)
    }

    fn submit_connection(&mut self, form: ConnectionForm) -> View {
        let Some(draft) = form.value().cloned() else {
            return View::ConnectionForm(form);
        };
        let key = SecretKey::Connection(draft.connection.id.clone());
        if let Some(password) = &draft.password {
            if let Err(err) = self.secrets.set(&key, password) {
                self.set_status(format!("Password not stored: {err:#}"));
                return View::ConnectionForm(
                    form.reopen_with_error(format!("could not store password: {err}")),
                );
            }
        }
        let id = draft.connection.id.clone();
        let label = draft.connection.label.clone();
        let mode = form.mode();
        let verb = match mode {
            FormMode::Add => "Added",
            FormMode::Edit => "Updated",
        };
        match self.commit(|data| {
            match mode {
                FormMode::Add => data.add_connection(draft.connection),
                FormMode::Edit => data.update_connection(draft.connection)?,
            }
            Ok(())
        }) {
            Ok(()) => {
                if let Some(index) = self.data.connections.iter().position(|c| c.id == id) {
                    self.selected = index;
                }
                self.set_status(format!("{verb} connection {label}"));
                View::ConnectionList
            }
            Err(err) => {
                self.set_status(format!("Save failed: {err:#}"));
                View::ConnectionForm(form.reopen_with_error(format!("save failed: {err}")))
            }
        }
    }

    pub(super) fn delete_connection(&mut self, id: &str) {
        if let Err(err) = self.secrets.delete(&SecretKey::Connection(id.to_string())) {
            self.log_line(&format!("Password for {id} not removed: {err:#}"));
        }
        match self.commit(|data| data.delete_connection(id).map(|_| ())) {
            Ok(()) => {
                self.clamp_selection();
                self.set_status("Connection removed");
            }
            Err(err) => self.set_status(format!("Delete failed: {err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::model::{AuthMethod, Connection, Credential};
    use crate::secrets::SecretStore;
    use crate::views::connection_form::ConnectionField;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
    }

    fn focus(app: &mut App, field: ConnectionField) {
        for _ in 0..20 {
            match &app.view {
                View::ConnectionForm(form) if form.focused() == field => return,
                View::ConnectionForm(_) => app.handle_key(key(KeyCode::Tab)).unwrap(),
                _ => panic!("form is not open"),
            };
        }
        panic!("field {field:?} is not reachable");
    }

    fn fill_add_form(app: &mut App, password: &str) {
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(app, "web");
        focus(app, ConnectionField::Host);
        type_text(app, "web.example.com");
        focus(app, ConnectionField::Username);
        type_text(app, "deploy");
        focus(app, ConnectionField::Password);
        type_text(app, password);
        focus(app, ConnectionField::Submit);
    }

    fn existing(id: &str) -> Connection {
        Connection {
            id: id.to_string(),
            label: "db".to_string(),
            host: "db.internal".to_string(),
            port: 2222,
            username: "admin".to_string(),
            auth: AuthMethod::Password,
            credential_id: None,
            icon: None,
        }
    }

    #[test]
    fn add_writes_secret_then_record() {
        let (mut app, store, secrets) = App::for_test(StoreFile::default());
        fill_add_form(&mut app, "hunter2");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(matches!(app.view, View::ConnectionList));
        let saved = store.saved().unwrap();
        assert_eq!(saved.connections.len(), 1);
        let conn = &saved.connections[0];
        assert_eq!(conn.port, 22);
        assert_eq!(conn.username, "deploy");
        assert_eq!(
            secrets.secret(&SecretKey::Connection(conn.id.clone())).as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn secret_failure_aborts_submission() {
        let (mut app, store, secrets) = App::for_test(StoreFile::default());
        secrets.fail_writes(true);
        fill_add_form(&mut app, "hunter2");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let View::ConnectionForm(form) = &app.view else {
            panic!("form should stay open");
        };
        assert!(form.error().unwrap().contains("could not store password"));
        assert!(app.data.connections.is_empty());
        assert!(store.saved().unwrap().connections.is_empty());
    }

    #[test]
    fn failed_save_keeps_memory_unchanged() {
        let (mut app, store, _) = App::for_test(StoreFile::default());
        store.fail_saves(true);
        fill_add_form(&mut app, "pw");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.data.connections.is_empty());
        assert!(app.status.contains("Save failed"));
        assert!(matches!(app.view, View::ConnectionForm(_)));
    }

    #[test]
    fn out_of_range_port_persists_nothing() {
        let (mut app, store, _) = App::for_test(StoreFile::default());
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "web");
        focus(&mut app, ConnectionField::Host);
        type_text(&mut app, "h");
        focus(&mut app, ConnectionField::Port);
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL))
            .unwrap();
        type_text(&mut app, "70000");
        focus(&mut app, ConnectionField::Submit);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let View::ConnectionForm(form) = &app.view else {
            panic!("form should stay open");
        };
        assert_eq!(form.error(), Some("invalid port number"));
        assert!(store.saved().unwrap().connections.is_empty());
    }

    #[test]
    fn edit_prefills_secret_and_keeps_identity() {
        let mut data = StoreFile::default();
        data.add_connection(existing("c1"));
        let (mut app, store, secrets) = App::for_test(data);
        let mut handle = std::sync::Arc::clone(&secrets);
        handle
            .set(&SecretKey::Connection("c1".to_string()), "old")
            .unwrap();

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        let View::ConnectionForm(form) = &app.view else {
            panic!("edit form should open");
        };
        assert_eq!(
            form.input(ConnectionField::Password).map(|i| i.value()),
            Some("old")
        );
        focus(&mut app, ConnectionField::Label);
        type_text(&mut app, "-primary");
        focus(&mut app, ConnectionField::Submit);
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let saved = store.saved().unwrap();
        assert_eq!(saved.connections.len(), 1);
        assert_eq!(saved.connections[0].id, "c1");
        assert_eq!(saved.connections[0].label, "db-primary");
        assert_eq!(saved.connections[0].port, 2222);
    }

    #[test]
    fn edit_of_vanished_record_is_not_reinserted() {
        let mut data = StoreFile::default();
        data.add_connection(existing("c1"));
        let (mut app, store, _) = App::for_test(data);
        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        app.data.connections.clear();
        focus(&mut app, ConnectionField::Submit);
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let View::ConnectionForm(form) = &app.view else {
            panic!("form should stay open");
        };
        assert!(form.error().unwrap().contains("connection not found"));
        assert!(app.data.connections.is_empty());
        assert_eq!(store.saved().unwrap().connections[0].label, "db");
    }

    #[test]
    fn delete_ignores_secret_errors_but_not_save_errors() {
        let mut data = StoreFile::default();
        data.add_connection(existing("c1"));
        data.add_connection(existing("c2"));
        let (mut app, store, secrets) = App::for_test(data);
        app.selected = 1;

        secrets.fail_deletes(true);
        app.delete_connection("c2");
        assert_eq!(app.data.connections.len(), 1);
        assert_eq!(app.selected, 0);

        store.fail_saves(true);
        app.delete_connection("c1");
        assert_eq!(app.data.connections.len(), 1);
        assert!(app.status.contains("Delete failed"));
    }

    #[test]
    fn credential_auth_without_credentials_is_rejected() {
        let (mut app, store, _) = App::for_test(StoreFile::default());
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "web");
        focus(&mut app, ConnectionField::Host);
        type_text(&mut app, "h");
        focus(&mut app, ConnectionField::Auth);
        app.handle_key(key(KeyCode::Right)).unwrap();
        focus(&mut app, ConnectionField::Submit);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let View::ConnectionForm(form) = &app.view else {
            panic!("form should stay open");
        };
        assert!(form.error().unwrap().contains("create one first"));
        assert!(store.saved().unwrap().connections.is_empty());

        let mut data = StoreFile::default();
        data.add_credential(Credential {
            id: "k1".to_string(),
            label: "ops".to_string(),
            username: "ops-user".to_string(),
        });
        let (mut app, store, _) = App::for_test(data);
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "web");
        focus(&mut app, ConnectionField::Host);
        type_text(&mut app, "h");
        focus(&mut app, ConnectionField::Auth);
        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        focus(&mut app, ConnectionField::Submit);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let saved = store.saved().unwrap();
        assert_eq!(saved.connections[0].credential_id.as_deref(), Some("k1"));
        assert_eq!(
            saved.connections[0].login_user(&saved.credentials).as_deref(),
            Some("ops-user")
        );
    }
}
