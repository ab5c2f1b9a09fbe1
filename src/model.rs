use anyhow::Result;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_PORT: u16 = 22;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AuthMethod {
    #[default]
    Password,
    Credential,
}

impl AuthMethod {
    pub(crate) fn toggle(self) -> Self {
        match self {
            Self::Password => Self::Credential,
            Self::Credential => Self::Password,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Password => "Password",
            Self::Credential => "Saved credential",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ConnectionIcon {
    #[default]
    Server,
    Linux,
    Apple,
    Windows,
}

impl ConnectionIcon {
    pub(crate) const ALL: [ConnectionIcon; 4] = [
        ConnectionIcon::Server,
        ConnectionIcon::Linux,
        ConnectionIcon::Apple,
        ConnectionIcon::Windows,
    ];

    pub(crate) fn cycle(self, forward: bool) -> Self {
        let pos = Self::ALL.iter().position(|icon| *icon == self).unwrap_or(0);
        let next = if forward {
            (pos + 1) % Self::ALL.len()
        } else if pos == 0 {
            Self::ALL.len() - 1
        } else {
            pos - 1
        };
        Self::ALL[next]
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Linux => "Linux",
            Self::Apple => "Apple",
            Self::Windows => "Windows",
        }
    }

    pub(crate) fn glyph(self) -> &'static str {
        match self {
            Self::Server => "▣",
            Self::Linux => "◆",
            Self::Apple => "●",
            Self::Windows => "■",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Connection {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    #[serde(default)]
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) auth: AuthMethod,
    #[serde(default)]
    pub(crate) credential_id: Option<String>,
    #[serde(default)]
    pub(crate) icon: Option<ConnectionIcon>,
}

impl Connection {
    pub(crate) fn login_user(&self, credentials: &[Credential]) -> Option<String> {
        match self.auth {
            AuthMethod::Password => Some(self.username.clone()),
            AuthMethod::Credential => {
                let id = self.credential_id.as_deref()?;
                credentials
                    .iter()
                    .find(|cred| cred.id == id)
                    .map(|cred| cred.username.clone())
            }
        }
    }

    pub(crate) fn target(&self, credentials: &[Credential]) -> String {
        let user = self.login_user(credentials).unwrap_or_default();
        if user.is_empty() {
            format!("{}:{}", self.host, self.port)
        } else {
            format!("{user}@{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Credential {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Settings {
    #[serde(default)]
    pub(crate) editor: Option<String>,
    #[serde(default = "default_port")]
    pub(crate) default_port: u16,
    #[serde(default)]
    pub(crate) show_hidden_files: bool,
    #[serde(default)]
    pub(crate) download_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: None,
            default_port: DEFAULT_PORT,
            show_hidden_files: false,
            download_dir: None,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub(crate) struct StoreFile {
    #[serde(default)]
    pub(crate) settings: Settings,
    #[serde(default)]
    pub(crate) connections: Vec<Connection>,
    #[serde(default)]
    pub(crate) credentials: Vec<Credential>,
}

impl StoreFile {
    pub(crate) fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|conn| conn.id == id)
    }

    pub(crate) fn credential(&self, id: &str) -> Option<&Credential> {
        self.credentials.iter().find(|cred| cred.id == id)
    }

    pub(crate) fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub(crate) fn update_connection(&mut self, connection: Connection) -> Result<()> {
        let Some(existing) = self
            .connections
            .iter_mut()
            .find(|conn| conn.id == connection.id)
        else {
            anyhow::bail!("connection not found");
        };
        *existing = connection;
        Ok(())
    }

    pub(crate) fn delete_connection(&mut self, id: &str) -> Result<Connection> {
        let Some(index) = self.connections.iter().position(|conn| conn.id == id) else {
            anyhow::bail!("connection not found");
        };
        Ok(self.connections.remove(index))
    }

    pub(crate) fn add_credential(&mut self, credential: Credential) {
        self.credentials.push(credential);
    }

    pub(crate) fn update_credential(&mut self, credential: Credential) -> Result<()> {
        let Some(existing) = self
            .credentials
            .iter_mut()
            .find(|cred| cred.id == credential.id)
        else {
            anyhow::bail!("credential not found");
        };
        *existing = credential;
        Ok(())
    }

    pub(crate) fn delete_credential(&mut self, id: &str) -> Result<Credential> {
        let users = self.credential_users(id);
        if users > 0 {
            anyhow::bail!("credential is used by {users} connection(s)");
        }
        let Some(index) = self.credentials.iter().position(|cred| cred.id == id) else {
            anyhow::bail!("credential not found");
        };
        Ok(self.credentials.remove(index))
    }

    pub(crate) fn credential_users(&self, id: &str) -> usize {
        self.connections
            .iter()
            .filter(|conn| {
                conn.auth == AuthMethod::Credential && conn.credential_id.as_deref() == Some(id)
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteEntry {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) permissions: String,
    pub(crate) is_dir: bool,
    pub(crate) modified: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionMode {
    Terminal,
    Files,
}

impl SessionMode {
    pub(crate) const ALL: [SessionMode; 2] = [SessionMode::Terminal, SessionMode::Files];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Terminal => "SSH terminal",
            Self::Files => "SFTP browser",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionRequest {
    pub(crate) connection: Connection,
    pub(crate) username: String,
    pub(crate) mode: SessionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct EncryptedBlob {
    pub(crate) nonce: String,
    pub(crate) ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct MasterConfig {
    pub(crate) salt_b64: String,
    pub(crate) check: EncryptedBlob,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct VaultFile {
    pub(crate) master: MasterConfig,
    #[serde(default)]
    pub(crate) secrets: std::collections::BTreeMap<String, EncryptedBlob>,
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
