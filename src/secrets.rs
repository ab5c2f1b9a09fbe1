use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use pbkdf2::pbkdf2_hmac;
use rand_core::OsRng;
use rand_core::TryRngCore;
use rpassword::prompt_password;
use sha2::Sha256;

use crate::model::{EncryptedBlob, MasterConfig, VaultFile};

const MASTER_CHECK: &str = "skybridge-check";
const KDF_ROUNDS: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SecretKey {
    Connection(String),
    Credential(String),
}

impl SecretKey {
    pub(crate) fn account(&self) -> String {
        match self {
            Self::Connection(id) => format!("conn-{id}"),
            Self::Credential(id) => format!("cred-{id}"),
        }
    }
}

pub(crate) trait SecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<String>>;
    fn set(&mut self, key: &SecretKey, secret: &str) -> Result<()>;
    fn delete(&mut self, key: &SecretKey) -> Result<()>;
}

pub(crate) struct VaultSecretStore {
    path: PathBuf,
    vault: VaultFile,
    key: Vec<u8>,
}

impl VaultSecretStore {
    pub(crate) fn open_interactive(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let vault = load_vault(&path)?;
            let key = prompt_existing_master(&vault.master)?;
            return Ok(Self { path, vault, key });
        }
        let (master, key) = setup_master()?;
        let store = Self {
            path,
            vault: VaultFile {
                master,
                secrets: Default::default(),
            },
            key,
        };
        store.persist()?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn with_password(path: PathBuf, password: &str) -> Result<Self> {
        if path.exists() {
            let vault = load_vault(&path)?;
            let key = unlock(&vault.master, password)?;
            return Ok(Self { path, vault, key });
        }
        let (master, key) = create_master_from_password(password)?;
        let store = Self {
            path,
            vault: VaultFile {
                master,
                secrets: Default::default(),
            },
            key,
        };
        store.persist()?;
        Ok(store)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create vault dir")?;
        }
        let content = serde_json::to_string_pretty(&self.vault).context("serialize vault")?;
        fs::write(&self.path, content).context("write vault file")?;
        Ok(())
    }
}

impl SecretStore for VaultSecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<String>> {
        self.vault
            .secrets
            .get(&key.account())
            .map(|blob| decrypt_string(blob, &self.key))
            .transpose()
    }

    fn set(&mut self, key: &SecretKey, secret: &str) -> Result<()> {
        let blob = encrypt_string(secret, &self.key)?;
        let previous = self.vault.secrets.insert(key.account(), blob);
        if let Err(err) = self.persist() {
            match previous {
                Some(blob) => self.vault.secrets.insert(key.account(), blob),
                None => self.vault.secrets.remove(&key.account()),
            };
            return Err(err);
        }
        Ok(())
    }

    fn delete(&mut self, key: &SecretKey) -> Result<()> {
        let Some(previous) = self.vault.secrets.remove(&key.account()) else {
            anyhow::bail!("no secret stored for {}", key.account());
        };
        if let Err(err) = self.persist() {
            self.vault.secrets.insert(key.account(), previous);
            return Err(err);
        }
        Ok(())
    }
}

fn load_vault(path: &Path) -> Result<VaultFile> {
    let content = fs::read_to_string(path).context("read vault file")?;
    serde_json::from_str(&content).context("parse vault file")
}

fn unlock(master: &MasterConfig, password: &str) -> Result<Vec<u8>> {
    let salt = Base64.decode(&master.salt_b64).context("decode salt")?;
    let key = derive_key(password, &salt);
    match decrypt_string(&master.check, &key) {
        Ok(check) if check == MASTER_CHECK => Ok(key),
        _ => anyhow::bail!("Invalid master password"),
    }
}

fn prompt_existing_master(master: &MasterConfig) -> Result<Vec<u8>> {
    loop {
        let password = prompt_password("Master password: ").context("read master password")?;
        match unlock(master, &password) {
            Ok(key) => return Ok(key),
            Err(err) => eprintln!("{err}."),
        }
    }
}

fn setup_master() -> Result<(MasterConfig, Vec<u8>)> {
    println!("No secret vault found. Choose a master password to protect saved passwords.");
    loop {
        let password = prompt_password("Set master password: ").context("read master password")?;
        let confirm =
            prompt_password("Confirm master password: ").context("read confirm password")?;
        if password != confirm {
            eprintln!("Passwords do not match.");
            continue;
        }
        if password.is_empty() {
            eprintln!("Master password cannot be empty.");
            continue;
        }
        return create_master_from_password(&password);
    }
}

fn create_master_from_password(password: &str) -> Result<(MasterConfig, Vec<u8>)> {
    let mut salt = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|err| anyhow::anyhow!("random salt failed: {err:?}"))?;
    let key = derive_key(password, &salt);
    let check = encrypt_string(MASTER_CHECK, &key)?;
    let master = MasterConfig {
        salt_b64: Base64.encode(salt),
        check,
    };
    Ok((master, key))
}

fn derive_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, KDF_ROUNDS, &mut key);
    key
}

fn encrypt_string(plaintext: &str, key: &[u8]) -> Result<EncryptedBlob> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|err| anyhow::anyhow!("random nonce failed: {err:?}"))?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|err| anyhow::anyhow!("encrypt failed: {err:?}"))?;
    Ok(EncryptedBlob {
        nonce: Base64.encode(nonce_bytes),
        ciphertext: Base64.encode(ciphertext),
    })
}

fn decrypt_string(blob: &EncryptedBlob, key: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce_bytes = Base64.decode(&blob.nonce).context("decode nonce")?;
    if nonce_bytes.len() != 12 {
        anyhow::bail!("invalid nonce length");
    }
    let ciphertext = Base64
        .decode(&blob.ciphertext)
        .context("decode ciphertext")?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|err| anyhow::anyhow!("decrypt failed: {err:?}"))?;
    String::from_utf8(plaintext).context("decode utf8")
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySecretStore {
    secrets: std::sync::Mutex<std::collections::HashMap<String, String>>,
    fail_writes: std::sync::atomic::AtomicBool,
    fail_deletes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemorySecretStore {
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_deletes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn secret(&self, key: &SecretKey) -> Option<String> {
        self.secrets
            .lock()
            .ok()
            .and_then(|secrets| secrets.get(&key.account()).cloned())
    }
}

#[cfg(test)]
impl SecretStore for std::sync::Arc<MemorySecretStore> {
    fn get(&self, key: &SecretKey) -> Result<Option<String>> {
        Ok(self.secret(key))
    }

    fn set(&mut self, key: &SecretKey, secret: &str) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("secret store is locked");
        }
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(key.account(), secret.to_string());
        }
        Ok(())
    }

    fn delete(&mut self, key: &SecretKey) -> Result<()> {
        if self.fail_deletes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("secret store is locked");
        }
        let removed = self
            .secrets
            .lock()
            .ok()
            .and_then(|mut secrets| secrets.remove(&key.account()));
        if removed.is_none() {
            anyhow::bail!("no secret stored for {}", key.account());
        }
        Ok(())
    }
}
