use crossterm::event::KeyEvent;

use crate::app::constants::STATUS_READY;
use crate::app::{App, PendingAction, View};
use crate::secrets::SecretKey;
use crate::views::FormMode;
use crate::views::credential_form::{CredentialDraft, CredentialForm};
use crate::views::credentials::{CredentialManager, ManagerIntent};
use crate::views::modal::ConfirmModal;

impl App {
    pub(super) fn handle_manager_key(&mut self, manager: CredentialManager, key: KeyEvent) -> View {
        let (manager, intent) = manager.update(key, &self.data.credentials);
        match intent {
            ManagerIntent::None => View::CredentialManager(manager),
            ManagerIntent::Close => {
                self.set_status(STATUS_READY);
                View::ConnectionList
            }
            ManagerIntent::Edit(id) => {
                let Some(credential) = self.data.credential(&id).cloned() else {
                    return View::CredentialManager(manager);
                };
                let password = match self.secrets.get(&SecretKey::Credential(id)) {
                    Ok(password) => password,
                    Err(err) => {
                        self.log_line(&format!(
                            "Could not read secret for {}: {err:#}",
                            credential.label
                        ));
                        None
                    }
                };
                let form = CredentialForm::new(FormMode::Edit, Some(&credential), password);
                View::CredentialManager(manager.with_form(form))
            }
            ManagerIntent::Delete(id) => {
                let Some(label) = self.data.credential(&id).map(|c| c.label.clone()) else {
                    return View::CredentialManager(manager);
                };
                let users = self.data.credential_users(&id);
                if users > 0 {
                    self.set_status(format!("Credential {label} is used by {users} connection(s)"));
                    return View::CredentialManager(manager);
                }
                let modal =
                    ConfirmModal::new("Delete credential", format!("Delete credential '{label}'?"));
                self.confirm = Some((modal, PendingAction::DeleteCredential { id }));
                View::CredentialManager(manager)
            }
            ManagerIntent::Save(draft) => self.submit_credential(manager, draft),
        }
    }

    fn submit_credential(&mut self, manager: CredentialManager, draft: CredentialDraft) -> View {
        let id = draft.credential.id.clone();
        let label = draft.credential.label.clone();
        if let Some(password) = &draft.password {
            if let Err(err) = self.secrets.set(&SecretKey::Credential(id.clone()), password) {
                self.set_status(format!("Secret not stored: {err:#}"));
                return View::CredentialManager(
                    manager.form_failed(format!("could not store password: {err}")),
                );
            }
        }
        match self.commit(|data| {
            match draft.mode {
                FormMode::Add => data.add_credential(draft.credential),
                FormMode::Edit => data.update_credential(draft.credential)?,
            }
            Ok(())
        }) {
            Ok(()) => {
                self.set_status(format!("Saved credential {label}"));
                View::CredentialManager(manager.form_saved(&self.data.credentials, &id))
            }
            Err(err) => {
                self.set_status(format!("Save failed: {err:#}"));
                View::CredentialManager(manager.form_failed(format!("save failed: {err}")))
            }
        }
    }

    pub(super) fn delete_credential(&mut self, id: &str) {
        let users = self.data.credential_users(id);
        if users > 0 {
            self.set_status(format!("Credential is used by {users} connection(s)"));
            return;
        }
        if let Err(err) = self.secrets.delete(&SecretKey::Credential(id.to_string())) {
            self.log_line(&format!("Secret for {id} not removed: {err:#}"));
        }
        match self.commit(|data| data.delete_credential(id).map(|_| ())) {
            Ok(()) => {
                let len = self.data.credentials.len();
                if let View::CredentialManager(manager) = &mut self.view {
                    manager.clamp(len);
                }
                self.set_status("Credential removed");
            }
            Err(err) => self.set_status(format!("Delete failed: {err:#}")),
        }
    }
}
