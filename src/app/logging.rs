use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Datelike;

use crate::app::App;
use crate::app::constants::{
    LOG_MAX_ENTRIES, LOG_MAX_IN_MEMORY, LOG_PARSE_FORMAT, LOG_RETENTION_DAYS, LOG_SEPARATOR,
    LOG_TIMESTAMP_FORMAT,
};

impl App {
    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.status = message.clone();
        self.log_line(&message);
    }

    pub(super) fn log_line(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format(LOG_TIMESTAMP_FORMAT);
        let line = format!("{timestamp}{LOG_SEPARATOR}{message}");
        if let Some(parent) = self.log_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(mut file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
        {
            let _ = writeln!(file, "{line}");
        }
        self.last_log = line.clone();
        self.log_lines.push_back(line);
        while self.log_lines.len() > LOG_MAX_IN_MEMORY {
            self.log_lines.pop_front();
        }
    }
}

pub(crate) fn prune_log_file(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let now = chrono::Local::now();
    let cutoff = now.naive_local() - chrono::Duration::days(LOG_RETENTION_DAYS);
    let mut kept: Vec<&str> = content
        .lines()
        .filter(|line| {
            let Some((timestamp, _)) = line.split_once(LOG_SEPARATOR) else {
                return false;
            };
            let with_year = format!("{}-{timestamp}", now.year());
            chrono::NaiveDateTime::parse_from_str(&with_year, LOG_PARSE_FORMAT)
                .is_ok_and(|parsed| parsed >= cutoff)
        })
        .collect();
    if kept.len() > LOG_MAX_ENTRIES {
        kept = kept.split_off(kept.len() - LOG_MAX_ENTRIES);
    }
    if kept.is_empty() {
        let _ = fs::remove_file(path);
    } else {
        let _ = fs::write(path, kept.join("\n") + "\n");
    }
}
