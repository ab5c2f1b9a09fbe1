use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::app::helpers::{resolve_download_dir, resolve_editor, split_editor_command};
use crate::app::{App, View};
use crate::model::{AuthMethod, SessionMode, SessionRequest};
use crate::secrets::SecretKey;
use crate::sftp::{RemoteSession, SftpRemote, remote_file_name};
use crate::ssh::{connect_session, run_ssh_terminal};
use crate::views::browser::FileBrowser;

pub(crate) type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn suspend_tui(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn resume_tui(terminal: &mut Tui) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen).context("enter alternate screen")?;
    terminal.clear().context("clear terminal")?;
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}").context("write prompt")?;
    stdout.flush().context("flush prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read from stdin")?;
    Ok(line.trim().to_string())
}

fn wait_for_enter() {
    let _ = read_line("Press Enter to continue...");
}

impl App {
    pub(crate) fn run_session_request(&mut self, terminal: &mut Tui) -> Result<()> {
        let Some(request) = self.session_request.take() else {
            return Ok(());
        };
        suspend_tui(terminal)?;
        let label = request.connection.label.clone();
        let result = self.open_session(&request);
        if let Err(err) = &result {
            println!("\nConnection to {label} failed: {err:#}");
            wait_for_enter();
        }
        resume_tui(terminal)?;
        match result {
            Ok(Some(browser)) => {
                self.set_status(format!("Browsing {label}"));
                self.view = View::RemoteBrowser(browser);
                self.set_viewport_rows(self.viewport_rows);
            }
            Ok(None) => {
                self.set_status(format!("Session with {label} closed"));
                self.view = View::ConnectionList;
            }
            Err(err) => {
                self.set_status(format!("Connection to {label} failed: {err:#}"));
                self.view = View::ConnectionList;
            }
        }
        Ok(())
    }

    fn open_session(&mut self, request: &SessionRequest) -> Result<Option<FileBrowser>> {
        let conn = &request.connection;
        let username = if request.username.trim().is_empty() {
            read_line(&format!("Username for {}: ", conn.host))?
        } else {
            request.username.clone()
        };
        if username.is_empty() {
            bail!("no username given");
        }
        let password = self.resolve_password(request, &username)?;
        println!("Connecting to {username}@{}:{} ...", conn.host, conn.port);
        let session = connect_session(&conn.host, conn.port, &username, &password)?;
        match request.mode {
            SessionMode::Terminal => {
                let result = run_ssh_terminal(&session);
                println!();
                if let Err(err) = &result {
                    println!("Session ended with an error: {err:#}");
                }
                wait_for_enter();
                result.map(|()| None)
            }
            SessionMode::Files => {
                let remote = SftpRemote::open(session)?;
                let title = format!("{} ({username}@{})", conn.label, conn.host);
                Ok(Some(FileBrowser::open(
                    Box::new(remote),
                    title,
                    self.data.settings.show_hidden_files,
                    resolve_download_dir(&self.data.settings),
                )))
            }
        }
    }

    fn resolve_password(&mut self, request: &SessionRequest, username: &str) -> Result<String> {
        let conn = &request.connection;
        let key = match (conn.auth, conn.credential_id.as_ref()) {
            (AuthMethod::Credential, Some(id)) => SecretKey::Credential(id.clone()),
            _ => SecretKey::Connection(conn.id.clone()),
        };
        match self.secrets.get(&key) {
            Ok(Some(secret)) => return Ok(secret),
            Ok(None) => {}
            Err(err) => println!("Stored password unavailable: {err:#}"),
        }
        let password = rpassword::prompt_password(format!("Password for {username}@{}: ", conn.host))
            .context("read password")?;
        let answer = read_line("Save this password? [y/N] ")?;
        if answer.eq_ignore_ascii_case("y") {
            if let Err(err) = self.secrets.set(&key, &password) {
                println!("Password not saved: {err:#}");
                self.log_line(&format!("Password for {} not saved: {err:#}", conn.label));
            }
        }
        Ok(password)
    }

    pub(crate) fn run_edit_request(&mut self, terminal: &mut Tui) -> Result<()> {
        let Some(remote_path) = self.edit_request.take() else {
            return Ok(());
        };
        let View::RemoteBrowser(browser) = &mut self.view else {
            return Ok(());
        };
        let editor = resolve_editor(
            std::env::var("EDITOR").ok(),
            self.data.settings.editor.as_deref(),
        );
        suspend_tui(terminal)?;
        let result = edit_remote_file(browser.session(), &remote_path, &editor);
        resume_tui(terminal)?;
        browser.reload();
        let name = remote_file_name(&remote_path);
        let message = match result {
            Ok(true) => {
                browser.set_info(format!("Uploaded {name}"));
                format!("Saved {remote_path}")
            }
            Ok(false) => {
                browser.set_info(format!("{name} unchanged"));
                format!("No changes to {remote_path}")
            }
            Err(err) => {
                browser.set_error(format!("Edit failed: {err:#}"));
                format!("Edit of {remote_path} failed: {err:#}")
            }
        };
        self.log_line(&message);
        Ok(())
    }
}

/// Downloads `remote` into a temp file with the same extension, runs `editor` on it and
/// uploads it again if its modification time moved. Returns whether an upload happened.
pub(crate) fn edit_remote_file(
    session: &dyn RemoteSession,
    remote: &str,
    editor: &str,
) -> Result<bool> {
    let (program, args) = split_editor_command(editor).context("empty editor command")?;
    let suffix = Path::new(remote)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let local = tempfile::Builder::new()
        .prefix("skybridge-")
        .suffix(&suffix)
        .tempfile()
        .context("create temp file")?;
    session.download(remote, local.path())?;
    let before = modified_time(local.path())?;
    let status = Command::new(&program)
        .args(&args)
        .arg(local.path())
        .status()
        .with_context(|| format!("run editor {program}"))?;
    if !status.success() {
        bail!("editor {program} exited with {status}");
    }
    if modified_time(local.path())? == before {
        return Ok(false);
    }
    session.upload(local.path(), remote)?;
    Ok(true)
}

fn modified_time(path: &Path) -> Result<std::time::SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("stat {}", path.display()))
}
