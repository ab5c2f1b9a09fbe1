use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;

use crate::app::constants::{LOG_NO_LOGS_MESSAGE, STATUS_READY};
use crate::app::logging::prune_log_file;
use crate::model::{SessionRequest, StoreFile};
use crate::secrets::{SecretStore, VaultSecretStore};
use crate::storage::{ConnectionStore, JsonConnectionStore, config_path, log_path, vault_path};
use crate::views::browser::FileBrowser;
use crate::views::connection_form::ConnectionForm;
use crate::views::credentials::CredentialManager;
use crate::views::menu::ModeMenu;
use crate::views::modal::ConfirmModal;

mod connections;
mod constants;
mod credentials;
mod handlers;
mod helpers;
mod logging;
mod session;

pub(crate) use session::Tui;

#[derive(Default)]
pub(crate) enum View {
    #[default]
    ConnectionList,
    ConnectionForm(ConnectionForm),
    CredentialManager(CredentialManager),
    ModeMenu(ModeMenu),
    RemoteBrowser(FileBrowser),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    DeleteConnection { id: String },
    DeleteCredential { id: String },
}

pub(crate) struct App {
    pub(crate) store: Box<dyn ConnectionStore>,
    pub(crate) secrets: Box<dyn SecretStore>,
    pub(crate) data: StoreFile,
    pub(crate) selected: usize,
    pub(crate) view: View,
    pub(crate) confirm: Option<(ConfirmModal, PendingAction)>,
    pub(crate) status: String,
    pub(crate) log_path: PathBuf,
    pub(crate) last_log: String,
    pub(crate) log_lines: VecDeque<String>,
    pub(crate) session_request: Option<SessionRequest>,
    pub(crate) edit_request: Option<String>,
    pub(crate) viewport_rows: u16,
}

impl App {
    pub(crate) fn load() -> Result<Self> {
        let store = JsonConnectionStore::new(config_path()?);
        let secrets = VaultSecretStore::open_interactive(vault_path()?)?;
        Self::new(Box::new(store), Box::new(secrets), log_path()?)
    }

    pub(crate) fn new(
        store: Box<dyn ConnectionStore>,
        secrets: Box<dyn SecretStore>,
        log_path: PathBuf,
    ) -> Result<Self> {
        let data = store.load()?;
        prune_log_file(&log_path);
        let mut app = Self {
            store,
            secrets,
            data,
            selected: 0,
            view: View::ConnectionList,
            confirm: None,
            status: STATUS_READY.to_string(),
            log_path,
            last_log: String::from(LOG_NO_LOGS_MESSAGE),
            log_lines: VecDeque::new(),
            session_request: None,
            edit_request: None,
            viewport_rows: 0,
        };
        app.set_status(STATUS_READY);
        Ok(app)
    }

    pub(crate) fn set_viewport_rows(&mut self, rows: u16) {
        self.viewport_rows = rows;
        if let View::RemoteBrowser(browser) = &mut self.view {
            browser.set_viewport_rows(rows);
        }
    }

    pub(super) fn clamp_selection(&mut self) {
        let len = self.data.connections.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        data: StoreFile,
    ) -> (
        Self,
        std::sync::Arc<crate::storage::MemoryConnectionStore>,
        std::sync::Arc<crate::secrets::MemorySecretStore>,
    ) {
        use std::sync::Arc;

        let store = Arc::new(crate::storage::MemoryConnectionStore::default());
        let secrets = Arc::new(crate::secrets::MemorySecretStore::default());
        store.save(&data).unwrap();
        let log_path =
            std::env::temp_dir().join(format!("skybridge-test-{}.log", crate::model::new_id()));
        let app = Self::new(
            Box::new(Arc::clone(&store)),
            Box::new(Arc::clone(&secrets)),
            log_path,
        )
        .unwrap();
        (app, store, secrets)
    }
}
