use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::RemoteError;
use crate::model::RemoteEntry;
use crate::sftp::{RemoteSession, join_remote, parent_remote, resolve_remote};
use crate::views::input::TextInput;

pub(crate) const BROWSER_CHROME_ROWS: u16 = 9;

const HIDDEN_MARKER: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum BrowserMode {
    #[default]
    Browsing,
    GoToPath(TextInput),
    CreateFile(TextInput),
    CreateDir(TextInput),
    Rename {
        target: RemoteEntry,
        input: TextInput,
    },
    DeleteConfirm {
        target: RemoteEntry,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BrowserSignal {
    Continue,
    Close,
    Edit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BrowserMessage {
    pub(crate) kind: MessageKind,
    pub(crate) text: String,
}

pub(crate) struct FileBrowser {
    session: Box<dyn RemoteSession>,
    title: String,
    path: String,
    entries: Vec<RemoteEntry>,
    selected: usize,
    scroll: usize,
    visible: usize,
    show_hidden: bool,
    mode: BrowserMode,
    message: Option<BrowserMessage>,
    download_dir: PathBuf,
    clipboard: Option<arboard::Clipboard>,
}

impl FileBrowser {
    pub(crate) fn open(
        session: Box<dyn RemoteSession>,
        title: impl Into<String>,
        show_hidden: bool,
        download_dir: PathBuf,
    ) -> Self {
        let path = session.home_dir().to_string();
        let mut browser = Self {
            session,
            title: title.into(),
            path,
            entries: Vec::new(),
            selected: 0,
            scroll: 0,
            visible: 1,
            show_hidden,
            mode: BrowserMode::Browsing,
            message: None,
            download_dir,
            clipboard: None,
        };
        browser.reload();
        browser
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> BrowserSignal {
        let mode = std::mem::take(&mut self.mode);
        let (mode, signal) = match mode {
            BrowserMode::Browsing => self.handle_browsing_key(key),
            BrowserMode::GoToPath(mut input) => match key.code {
                KeyCode::Esc => (BrowserMode::Browsing, BrowserSignal::Continue),
                KeyCode::Enter => {
                    self.go_to(input.value());
                    (BrowserMode::Browsing, BrowserSignal::Continue)
                }
                _ => {
                    input.handle_key(key);
                    (BrowserMode::GoToPath(input), BrowserSignal::Continue)
                }
            },
            BrowserMode::CreateFile(mut input) => match key.code {
                KeyCode::Esc => (BrowserMode::Browsing, BrowserSignal::Continue),
                KeyCode::Enter => {
                    self.create(input.value(), false);
                    (BrowserMode::Browsing, BrowserSignal::Continue)
                }
                _ => {
                    input.handle_key(key);
                    (BrowserMode::CreateFile(input), BrowserSignal::Continue)
                }
            },
            BrowserMode::CreateDir(mut input) => match key.code {
                KeyCode::Esc => (BrowserMode::Browsing, BrowserSignal::Continue),
                KeyCode::Enter => {
                    self.create(input.value(), true);
                    (BrowserMode::Browsing, BrowserSignal::Continue)
                }
                _ => {
                    input.handle_key(key);
                    (BrowserMode::CreateDir(input), BrowserSignal::Continue)
                }
            },
            BrowserMode::Rename { target, mut input } => match key.code {
                KeyCode::Esc => (BrowserMode::Browsing, BrowserSignal::Continue),
                KeyCode::Enter => {
                    self.rename(&target, input.value());
                    (BrowserMode::Browsing, BrowserSignal::Continue)
                }
                _ => {
                    input.handle_key(key);
                    (BrowserMode::Rename { target, input }, BrowserSignal::Continue)
                }
            },
            BrowserMode::DeleteConfirm { target } => {
                if matches!(key.code, KeyCode::Char('y' | 'Y')) {
                    self.delete(&target);
                } else {
                    self.set_info("Delete cancelled");
                }
                (BrowserMode::Browsing, BrowserSignal::Continue)
            }
        };
        self.mode = mode;
        signal
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) -> (BrowserMode, BrowserSignal) {
        self.message = None;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let mut next = BrowserMode::Browsing;
        match key.code {
            KeyCode::Char('c') if ctrl => return (next, BrowserSignal::Close),
            KeyCode::Char('u') if ctrl => self.half_page_up(),
            KeyCode::Char('d') if ctrl => self.half_page_down(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char('q') => return (next, BrowserSignal::Close),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::PageUp => self.half_page_up(),
            KeyCode::PageDown => self.half_page_down(),
            KeyCode::Home => self.top(),
            KeyCode::End | KeyCode::Char('G') => self.bottom(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.open_selected(),
            KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => self.go_to_parent(),
            KeyCode::Tab | KeyCode::Char('g') => {
                next = BrowserMode::GoToPath(TextInput::with_value(self.path.clone()));
            }
            KeyCode::Char('n') => next = BrowserMode::CreateFile(TextInput::new()),
            KeyCode::Char('N') => next = BrowserMode::CreateDir(TextInput::new()),
            KeyCode::Char('d') => {
                if let Some(target) = self.selected_entry().cloned() {
                    next = BrowserMode::DeleteConfirm { target };
                }
            }
            KeyCode::Char('r') => {
                if let Some(target) = self.selected_entry().cloned() {
                    let input = TextInput::with_value(target.name.clone());
                    next = BrowserMode::Rename { target, input };
                }
            }
            KeyCode::Char('y') => self.copy_selected_path(),
            KeyCode::Char('.') => {
                self.show_hidden = !self.show_hidden;
                self.reload();
            }
            KeyCode::Char('~') => {
                let home = self.session.home_dir().to_string();
                self.change_dir(home);
            }
            KeyCode::Char('e') => {
                if let Some(entry) = self.selected_entry().cloned() {
                    if entry.is_dir {
                        self.set_error(format!("{} is a directory", entry.name));
                    } else {
                        let path = join_remote(&self.path, &entry.name);
                        return (next, BrowserSignal::Edit(path));
                    }
                }
            }
            KeyCode::Char('D') => self.download_selected(),
            _ => {}
        }
        (next, BrowserSignal::Continue)
    }

    pub(crate) fn reload(&mut self) {
        if let Err(err) = self.refresh() {
            self.set_error(err.to_string());
        }
    }

    /// Re-lists the current directory. A failed listing drops the stale entries.
    fn refresh(&mut self) -> Result<(), RemoteError> {
        match self.session.list_dir(&self.path) {
            Ok(entries) => {
                self.set_entries(entries);
                Ok(())
            }
            Err(err) => {
                self.entries.clear();
                self.selected = 0;
                self.scroll = 0;
                Err(err)
            }
        }
    }

    fn finish_mutation(&mut self, result: Result<(), RemoteError>, done: String) {
        let refreshed = self.refresh();
        match (result, refreshed) {
            (Ok(()), Ok(())) => self.set_info(done),
            (Ok(()), Err(err)) => self.set_error(format!("{done}, but refresh failed: {err}")),
            (Err(err), _) => self.set_error(err.to_string()),
        }
    }

    fn set_entries(&mut self, entries: Vec<RemoteEntry>) {
        let show_hidden = self.show_hidden;
        let mut entries: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|entry| show_hidden || !entry.name.starts_with(HIDDEN_MARKER))
            .collect();
        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        self.entries = entries;
        if self.selected >= self.entries.len() {
            self.selected = 0;
        }
        self.scroll = 0;
        self.clamp_scroll();
    }

    fn change_dir(&mut self, path: String) {
        match self.list_target(&path) {
            Ok(entries) => {
                self.path = path;
                self.selected = 0;
                self.set_entries(entries);
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn list_target(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let target = self.session.stat(path)?;
        if !target.is_dir {
            return Err(RemoteError::NotADirectory {
                path: path.to_string(),
            });
        }
        self.session.list_dir(path)
    }

    fn open_selected(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        if entry.is_dir {
            let path = join_remote(&self.path, &entry.name);
            self.change_dir(path);
        }
    }

    fn go_to_parent(&mut self) {
        if let Some(parent) = parent_remote(&self.path) {
            self.change_dir(parent);
        }
    }

    fn go_to(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }
        let target = resolve_remote(input, &self.path, self.session.home_dir());
        self.change_dir(target);
    }

    fn create(&mut self, name: &str, directory: bool) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let path = join_remote(&self.path, name);
        let result = if directory {
            self.session.create_dir(&path)
        } else {
            self.session.create_file(&path)
        };
        let done = if directory {
            format!("Created directory: {name}")
        } else {
            format!("Created file: {name}")
        };
        self.finish_mutation(result, done);
    }

    fn rename(&mut self, target: &RemoteEntry, new_name: &str) {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == target.name {
            return;
        }
        let from = join_remote(&self.path, &target.name);
        let to = join_remote(&self.path, new_name);
        let result = self.session.rename(&from, &to);
        self.finish_mutation(result, format!("Renamed {} to {new_name}", target.name));
    }

    fn delete(&mut self, target: &RemoteEntry) {
        let path = join_remote(&self.path, &target.name);
        let result = if target.is_dir {
            self.session.remove_dir(&path)
        } else {
            self.session.remove_file(&path)
        };
        self.finish_mutation(result, format!("Deleted: {}", target.name));
    }

    fn download_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        if entry.is_dir {
            self.set_error(format!("{} is a directory", entry.name));
            return;
        }
        if let Err(err) = fs::create_dir_all(&self.download_dir) {
            self.set_error(format!("create {}: {err}", self.download_dir.display()));
            return;
        }
        let remote = join_remote(&self.path, &entry.name);
        let local = unique_destination(&self.download_dir, &entry.name);
        match self.session.download(&remote, &local) {
            Ok(_) => self.set_info(format!("Downloaded to {}", local.display())),
            Err(err) => {
                let _ = fs::remove_file(&local);
                self.set_error(err.to_string());
            }
        }
    }

    fn copy_selected_path(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        let path = join_remote(&self.path, &entry.name);
        match self.copy_to_clipboard(&path) {
            Ok(()) => self.set_info(format!("Copied: {path}")),
            Err(err) => self.set_error(format!("clipboard: {err}")),
        }
    }

    fn clipboard_mut(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.clipboard.is_none() {
            self.clipboard = Some(arboard::Clipboard::new()?);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("clipboard unavailable"))
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        let clipboard = self.clipboard_mut()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }

    fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.scroll {
                self.scroll = self.selected;
            }
        }
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
            let visible = self.visible_count();
            if self.selected >= self.scroll + visible {
                self.scroll = self.selected + 1 - visible;
            }
        }
    }

    fn half_page_up(&mut self) {
        let jump = (self.visible_count() / 2).max(1);
        self.selected = self.selected.saturating_sub(jump);
        self.clamp_scroll();
    }

    fn half_page_down(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let jump = (self.visible_count() / 2).max(1);
        self.selected = (self.selected + jump).min(self.entries.len() - 1);
        self.clamp_scroll();
    }

    fn top(&mut self) {
        self.selected = 0;
        self.clamp_scroll();
    }

    fn bottom(&mut self) {
        self.selected = self.entries.len().saturating_sub(1);
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let visible = self.visible_count();
        let max_scroll = self.entries.len().saturating_sub(visible);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + visible {
            self.scroll = self.selected + 1 - visible;
        }
        self.scroll = self.scroll.min(max_scroll);
    }

    pub(crate) fn set_viewport_rows(&mut self, rows: u16) {
        self.visible = usize::from(rows.saturating_sub(BROWSER_CHROME_ROWS)).max(1);
        self.clamp_scroll();
    }

    pub(crate) fn set_info(&mut self, text: impl Into<String>) {
        self.message = Some(BrowserMessage {
            kind: MessageKind::Info,
            text: text.into(),
        });
    }

    pub(crate) fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(BrowserMessage {
            kind: MessageKind::Error,
            text: text.into(),
        });
    }

    pub(crate) fn session(&self) -> &dyn RemoteSession {
        self.session.as_ref()
    }

    pub(crate) fn visible_count(&self) -> usize {
        self.visible.max(1)
    }

    pub(crate) fn visible_entries(&self) -> &[RemoteEntry] {
        let end = (self.scroll + self.visible_count()).min(self.entries.len());
        &self.entries[self.scroll.min(end)..end]
    }

    pub(crate) fn selected_entry(&self) -> Option<&RemoteEntry> {
        self.entries.get(self.selected)
    }

    pub(crate) fn entries(&self) -> &[RemoteEntry] {
        &self.entries
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn scroll(&self) -> usize {
        self.scroll
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub(crate) fn mode(&self) -> &BrowserMode {
        &self.mode
    }

    pub(crate) fn message(&self) -> Option<&BrowserMessage> {
        self.message.as_ref()
    }
}

/// First free `base (n).ext` in `dir`. Never returns an existing path.
pub(crate) fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let file = Path::new(name);
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = file.extension().map(|s| s.to_string_lossy().into_owned());
    (1u64..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::MockRemote;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(browser: &mut FileBrowser, text: &str) {
        for ch in text.chars() {
            browser.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn browser_with(remote: &Arc<MockRemote>, rows: u16) -> FileBrowser {
        let dir = std::env::temp_dir().join("skybridge-browser-tests");
        let mut browser = FileBrowser::open(Box::new(Arc::clone(remote)), "test", false, dir);
        browser.set_viewport_rows(rows);
        browser
    }

    fn many_files(count: usize) -> Arc<MockRemote> {
        let remote = Arc::new(MockRemote::new("/home/u"));
        for i in 0..count {
            remote.add_file(&format!("/home/u/file{i:03}.txt"), b"x");
        }
        remote
    }

    fn assert_in_viewport(browser: &FileBrowser) {
        assert!(browser.scroll() <= browser.selected());
        assert!(browser.selected() < browser.scroll() + browser.visible_count());
    }

    #[test]
    fn create_dir_then_reload_shows_directory() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        let mut browser = browser_with(&remote, 30);
        browser.handle_key(key(KeyCode::Char('N')));
        assert!(matches!(browser.mode(), BrowserMode::CreateDir(_)));
        type_text(&mut browser, "logs");
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.mode(), &BrowserMode::Browsing);
        assert!(remote.exists("/home/u/logs"));
        let entry = browser
            .entries()
            .iter()
            .find(|entry| entry.name == "logs")
            .unwrap();
        assert!(entry.is_dir);
        assert_eq!(
            browser.message().map(|m| m.kind),
            Some(MessageKind::Info)
        );
    }

    #[test]
    fn hidden_toggle_changes_visible_count() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/.bashrc", b"alias ll='ls -l'");
        remote.add_file("/home/u/notes.txt", b"todo");
        let mut browser = browser_with(&remote, 30);
        assert_eq!(browser.entries().len(), 1);
        browser.handle_key(key(KeyCode::Char('.')));
        assert!(browser.show_hidden());
        assert_eq!(browser.entries().len(), 2);
    }

    #[test]
    fn directories_sort_first() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/a.txt", b"");
        remote.add_dir("/home/u/Zeta");
        let browser = browser_with(&remote, 30);
        let names: Vec<&str> = browser.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "a.txt"]);
    }

    #[test]
    fn moving_keeps_selection_in_viewport() {
        let remote = many_files(40);
        let mut browser = browser_with(&remote, BROWSER_CHROME_ROWS + 5);
        assert_eq!(browser.visible_count(), 5);
        for _ in 0..12 {
            browser.handle_key(key(KeyCode::Char('j')));
            assert_in_viewport(&browser);
        }
        assert_eq!(browser.selected(), 12);
        assert_eq!(browser.scroll(), 8);
        for _ in 0..10 {
            browser.handle_key(key(KeyCode::Up));
            assert_in_viewport(&browser);
        }
        assert_eq!(browser.selected(), 2);
        assert_eq!(browser.scroll(), 2);
    }

    #[test]
    fn half_page_and_bottom_jumps_clamp() {
        let remote = many_files(40);
        let mut browser = browser_with(&remote, BROWSER_CHROME_ROWS + 10);
        browser.handle_key(ctrl('d'));
        assert_eq!(browser.selected(), 5);
        assert_in_viewport(&browser);
        browser.handle_key(key(KeyCode::Char('G')));
        assert_eq!(browser.selected(), 39);
        assert_eq!(browser.scroll(), 30);
        browser.handle_key(ctrl('u'));
        assert_eq!(browser.selected(), 34);
        assert_in_viewport(&browser);
        for _ in 0..10 {
            browser.handle_key(ctrl('u'));
            assert_in_viewport(&browser);
        }
        assert_eq!(browser.selected(), 0);
        assert_eq!(browser.scroll(), 0);
    }

    #[test]
    fn tiny_viewport_still_jumps_by_one() {
        let remote = many_files(3);
        let mut browser = browser_with(&remote, 1);
        assert_eq!(browser.visible_count(), 1);
        browser.handle_key(ctrl('d'));
        assert_eq!(browser.selected(), 1);
        assert_in_viewport(&browser);
    }

    #[test]
    fn shrinking_viewport_reclamps_scroll() {
        let remote = many_files(40);
        let mut browser = browser_with(&remote, BROWSER_CHROME_ROWS + 20);
        browser.handle_key(key(KeyCode::Char('G')));
        browser.set_viewport_rows(BROWSER_CHROME_ROWS + 3);
        assert_in_viewport(&browser);
    }

    #[test]
    fn empty_directory_keeps_indices_at_zero() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        let mut browser = browser_with(&remote, 20);
        for code in [KeyCode::Down, KeyCode::Up, KeyCode::Char('G'), KeyCode::End] {
            browser.handle_key(key(code));
            assert_eq!(browser.selected(), 0);
            assert_eq!(browser.scroll(), 0);
        }
        browser.handle_key(ctrl('d'));
        assert_eq!(browser.selected(), 0);
        browser.handle_key(key(KeyCode::Char('d')));
        assert_eq!(browser.mode(), &BrowserMode::Browsing);
    }

    #[test]
    fn delete_requires_affirmative() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/keep.txt", b"");
        let mut browser = browser_with(&remote, 20);
        for cancel in [KeyCode::Char('n'), KeyCode::Esc, KeyCode::Enter, KeyCode::Char('x')] {
            browser.handle_key(key(KeyCode::Char('d')));
            assert!(matches!(browser.mode(), BrowserMode::DeleteConfirm { .. }));
            browser.handle_key(key(cancel));
            assert_eq!(browser.mode(), &BrowserMode::Browsing);
            assert!(remote.exists("/home/u/keep.txt"));
        }
        browser.handle_key(key(KeyCode::Char('d')));
        browser.handle_key(key(KeyCode::Char('Y')));
        assert!(!remote.exists("/home/u/keep.txt"));
        assert!(browser.entries().is_empty());
        assert_eq!(browser.selected(), 0);
    }

    #[test]
    fn delete_dispatches_on_entry_kind() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_dir("/home/u/old");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('d')));
        browser.handle_key(key(KeyCode::Char('y')));
        assert!(remote.calls().contains(&"remove_dir /home/u/old".to_string()));
    }

    #[test]
    fn deleting_last_entry_resets_selection() {
        let remote = many_files(3);
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('G')));
        browser.handle_key(key(KeyCode::Char('d')));
        browser.handle_key(key(KeyCode::Char('y')));
        assert_eq!(browser.entries().len(), 2);
        assert_eq!(browser.selected(), 0);
    }

    #[test]
    fn escape_leaves_inputs_without_session_calls() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/a.txt", b"");
        let mut browser = browser_with(&remote, 20);
        let before = remote.calls().len();
        for open in [KeyCode::Char('n'), KeyCode::Char('N'), KeyCode::Char('r'), KeyCode::Tab] {
            browser.handle_key(key(open));
            type_text(&mut browser, "zzz");
            browser.handle_key(key(KeyCode::Esc));
            assert_eq!(browser.mode(), &BrowserMode::Browsing);
        }
        assert_eq!(remote.calls().len(), before);
    }

    #[test]
    fn rename_prefills_and_applies() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/draft.md", b"text");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('r')));
        let BrowserMode::Rename { input, .. } = browser.mode() else {
            panic!("expected rename mode");
        };
        assert_eq!(input.value(), "draft.md");
        for _ in 0..3 {
            browser.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut browser, "txt");
        browser.handle_key(key(KeyCode::Enter));
        assert!(remote.exists("/home/u/draft.txt"));
        assert!(!remote.exists("/home/u/draft.md"));
    }

    #[test]
    fn remote_errors_become_messages() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.set_read_only(true);
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('n')));
        type_text(&mut browser, "x.txt");
        browser.handle_key(key(KeyCode::Enter));
        let message = browser.message().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert!(message.text.contains("permission denied"));
        browser.handle_key(key(KeyCode::Down));
        assert!(browser.message().is_none());
    }

    #[test]
    fn empty_create_name_is_a_no_op() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('n')));
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.mode(), &BrowserMode::Browsing);
        assert!(!remote.calls().iter().any(|call| call.starts_with("create")));
    }

    #[test]
    fn navigation_enters_dirs_and_stops_at_root() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/src/lib.rs", b"");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.path(), "/home/u/src");
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.path(), "/home/u/src");
        for _ in 0..5 {
            browser.handle_key(key(KeyCode::Char('h')));
        }
        assert_eq!(browser.path(), "/");
        browser.handle_key(key(KeyCode::Char('~')));
        assert_eq!(browser.path(), "/home/u");
    }

    #[test]
    fn go_to_path_resolves_and_rejects_files() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_dir("/var/log");
        remote.add_file("/etc/hosts", b"");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('g')));
        let BrowserMode::GoToPath(input) = browser.mode() else {
            panic!("expected go-to mode");
        };
        assert_eq!(input.value(), "/home/u");
        browser.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut browser, "../../var/log");
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.path(), "/var/log");

        browser.handle_key(key(KeyCode::Tab));
        browser.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut browser, "/etc/hosts");
        browser.handle_key(key(KeyCode::Enter));
        assert_eq!(browser.path(), "/var/log");
        assert_eq!(browser.message().map(|m| m.kind), Some(MessageKind::Error));
    }

    #[test]
    fn edit_signals_files_only() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_dir("/home/u/dir");
        remote.add_file("/home/u/file.conf", b"");
        let mut browser = browser_with(&remote, 20);
        assert_eq!(browser.handle_key(key(KeyCode::Char('e'))), BrowserSignal::Continue);
        browser.handle_key(key(KeyCode::Down));
        assert_eq!(
            browser.handle_key(key(KeyCode::Char('e'))),
            BrowserSignal::Edit("/home/u/file.conf".to_string())
        );
    }

    #[test]
    fn quit_keys_close_the_browser() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        let mut browser = browser_with(&remote, 20);
        assert_eq!(browser.handle_key(key(KeyCode::Char('q'))), BrowserSignal::Close);
        assert_eq!(browser.handle_key(ctrl('c')), BrowserSignal::Close);
        browser.handle_key(key(KeyCode::Char('n')));
        assert_eq!(browser.handle_key(key(KeyCode::Char('q'))), BrowserSignal::Continue);
        let BrowserMode::CreateFile(input) = browser.mode() else {
            panic!("expected create mode");
        };
        assert_eq!(input.value(), "q");
    }

    #[test]
    fn unique_destination_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_destination(dir.path(), "report.txt"), dir.path().join("report.txt"));
        fs::write(dir.path().join("report.txt"), "a").unwrap();
        let first = unique_destination(dir.path(), "report.txt");
        assert_eq!(first, dir.path().join("report (1).txt"));
        fs::write(&first, "b").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "report.txt"),
            dir.path().join("report (2).txt")
        );
        fs::write(dir.path().join("Makefile"), "").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "Makefile"),
            dir.path().join("Makefile (1)")
        );
    }

    #[test]
    fn download_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report.txt"), "local").unwrap();
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/report.txt", b"remote");
        let mut browser =
            FileBrowser::open(Box::new(Arc::clone(&remote)), "t", false, dir.path().into());
        browser.set_viewport_rows(20);
        browser.handle_key(key(KeyCode::Char('D')));
        assert_eq!(fs::read_to_string(dir.path().join("report.txt")).unwrap(), "local");
        assert_eq!(
            fs::read_to_string(dir.path().join("report (1).txt")).unwrap(),
            "remote"
        );
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/dump.sql", b"create table t;");
        remote.set_fail_downloads(true);
        let mut browser =
            FileBrowser::open(Box::new(Arc::clone(&remote)), "t", false, dir.path().into());
        browser.set_viewport_rows(20);
        browser.handle_key(key(KeyCode::Char('D')));
        assert!(!dir.path().join("dump.sql").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(browser.message().map(|m| m.kind), Some(MessageKind::Error));
    }

    #[test]
    fn copy_path_reports_result() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/a.txt", b"");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('y')));
        let message = browser.message().unwrap();
        match message.kind {
            MessageKind::Info => assert_eq!(message.text, "Copied: /home/u/a.txt"),
            MessageKind::Error => assert!(message.text.starts_with("clipboard: ")),
        }
    }

    #[test]
    fn copy_path_on_empty_dir_is_silent() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('y')));
        assert!(browser.message().is_none());
    }

    #[test]
    fn delete_with_failed_refresh_reports_both() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/a.txt", b"");
        remote.add_file("/home/u/b.txt", b"");
        let mut browser = browser_with(&remote, 20);
        browser.handle_key(key(KeyCode::Char('G')));
        browser.handle_key(key(KeyCode::Char('d')));
        remote.set_fail_lists(true);
        browser.handle_key(key(KeyCode::Char('y')));
        assert!(!remote.exists("/home/u/b.txt"));
        let message = browser.message().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert!(message.text.starts_with("Deleted: b.txt, but refresh failed"));
        assert!(browser.entries().is_empty());
        assert_eq!(browser.selected(), 0);
        assert_eq!(browser.scroll(), 0);
    }

    #[test]
    fn create_with_failed_refresh_drops_stale_listing() {
        let remote = Arc::new(MockRemote::new("/home/u"));
        remote.add_file("/home/u/a.txt", b"");
        let mut browser = browser_with(&remote, 20);
        remote.set_fail_lists(true);
        browser.handle_key(key(KeyCode::Char('n')));
        type_text(&mut browser, "b.txt");
        browser.handle_key(key(KeyCode::Enter));
        assert!(remote.exists("/home/u/b.txt"));
        let message = browser.message().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert!(message.text.contains("Created file: b.txt, but refresh failed"));
        assert!(browser.entries().is_empty());

        remote.set_fail_lists(false);
        browser.reload();
        assert_eq!(browser.entries().len(), 2);
    }
}
