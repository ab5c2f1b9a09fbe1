use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::StoreFile;

const APP_DIR: &str = "skybridge";

pub(crate) fn config_path() -> Result<PathBuf> {
    app_file("config.json")
}

pub(crate) fn vault_path() -> Result<PathBuf> {
    app_file("secrets.json")
}

pub(crate) fn log_path() -> Result<PathBuf> {
    app_file("skybridge.log")
}

fn app_file(name: &str) -> Result<PathBuf> {
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_DIR);
        dir.push(name);
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push(format!("{APP_DIR}-{name}"));
    Ok(fallback)
}

pub(crate) trait ConnectionStore {
    fn load(&self) -> Result<StoreFile>;
    fn save(&self, store: &StoreFile) -> Result<()>;
}

#[derive(Debug, Clone)]
pub(crate) struct JsonConnectionStore {
    path: PathBuf,
}

impl JsonConnectionStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConnectionStore for JsonConnectionStore {
    fn load(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        load_store(&self.path)
    }

    fn save(&self, store: &StoreFile) -> Result<()> {
        save_store(&self.path, store)
    }
}

pub(crate) fn load_store(path: &Path) -> Result<StoreFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let store = serde_json::from_str(&content)
        .with_context(|| format!("parse config file {}", path.display()))?;
    Ok(store)
}

pub(crate) fn save_store(path: &Path, store: &StoreFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let content = serde_json::to_string_pretty(store).context("serialize config")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).context("write config file")?;
    fs::rename(&tmp, path).context("replace config file")?;
    Ok(())
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryConnectionStore {
    saved: std::sync::Mutex<Option<StoreFile>>,
    fail_saves: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryConnectionStore {
    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn saved(&self) -> Option<StoreFile> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }
}

#[cfg(test)]
impl ConnectionStore for std::sync::Arc<MemoryConnectionStore> {
    fn load(&self) -> Result<StoreFile> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, store: &StoreFile) -> Result<()> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("disk is read-only");
        }
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(store.clone());
        }
        Ok(())
    }
}
