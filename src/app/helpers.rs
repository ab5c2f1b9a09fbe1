use std::path::PathBuf;

use crate::app::constants::{DEFAULT_EDITOR, DOWNLOADS_DIR_NAME};
use crate::model::Settings;

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(mut home) = dirs::home_dir() {
            home.push(rest);
            return home;
        }
    }
    PathBuf::from(path)
}

pub(crate) fn resolve_editor(env: Option<String>, configured: Option<&str>) -> String {
    env.filter(|value| !value.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

pub(crate) fn split_editor_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

pub(crate) fn resolve_download_dir(settings: &Settings) -> PathBuf {
    if let Some(dir) = settings
        .download_dir
        .as_deref()
        .filter(|dir| !dir.trim().is_empty())
    {
        return expand_tilde(dir.trim());
    }
    if let Some(dir) = dirs::download_dir() {
        return dir;
    }
    match dirs::home_dir() {
        Some(home) => home.join(DOWNLOADS_DIR_NAME),
        None => PathBuf::from(DOWNLOADS_DIR_NAME),
    }
}
