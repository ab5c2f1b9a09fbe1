use std::fs::File;
use std::io;
use std::path::Path;

use ssh2::{ErrorCode, FileStat, Session, Sftp};

use crate::error::RemoteError;
use crate::model::RemoteEntry;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFLNK: u32 = 0o120000;

const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_PERMISSION_DENIED: i32 = 3;
const SFTP_FAILURE: i32 = 4;
const SFTP_NO_SPACE: i32 = 14;

pub(crate) trait RemoteSession {
    fn home_dir(&self) -> &str;
    fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
    fn stat(&self, path: &str) -> Result<RemoteEntry, RemoteError>;
    fn create_file(&self, path: &str) -> Result<(), RemoteError>;
    fn create_dir(&self, path: &str) -> Result<(), RemoteError>;
    fn remove_file(&self, path: &str) -> Result<(), RemoteError>;
    fn remove_dir(&self, path: &str) -> Result<(), RemoteError>;
    fn rename(&self, from: &str, to: &str) -> Result<(), RemoteError>;
    fn download(&self, remote: &str, local: &Path) -> Result<u64, RemoteError>;
    fn upload(&self, local: &Path, remote: &str) -> Result<u64, RemoteError>;
}

pub(crate) struct SftpRemote {
    _session: Session,
    sftp: Sftp,
    home: String,
}

impl SftpRemote {
    pub(crate) fn open(session: Session) -> Result<Self, RemoteError> {
        let sftp = session
            .sftp()
            .map_err(|err| RemoteError::other("open sftp", err))?;
        let home = sftp
            .realpath(Path::new("."))
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("/"));
        Ok(Self {
            _session: session,
            sftp,
            home,
        })
    }
}

impl RemoteSession for SftpRemote {
    fn home_dir(&self) -> &str {
        &self.home
    }

    fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let listing = self
            .sftp
            .readdir(Path::new(path))
            .map_err(|err| classify(err, path, "read remote dir"))?;
        let mut entries = Vec::with_capacity(listing.len());
        for (child, stat) in listing {
            let name = child
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("/"));
            if name == "." || name == ".." {
                continue;
            }
            entries.push(entry_from_stat(name, &stat));
        }
        Ok(entries)
    }

    fn stat(&self, path: &str) -> Result<RemoteEntry, RemoteError> {
        let stat = self
            .sftp
            .stat(Path::new(path))
            .map_err(|err| classify(err, path, "stat remote path"))?;
        Ok(entry_from_stat(remote_file_name(path), &stat))
    }

    fn create_file(&self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .create(Path::new(path))
            .map(|_| ())
            .map_err(|err| classify(err, path, "create remote file"))
    }

    fn create_dir(&self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .mkdir(Path::new(path), 0o755)
            .map_err(|err| classify(err, path, "create remote dir"))
    }

    fn remove_file(&self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .unlink(Path::new(path))
            .map_err(|err| classify(err, path, "remove remote file"))
    }

    fn remove_dir(&self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .rmdir(Path::new(path))
            .map_err(|err| classify(err, path, "remove remote dir"))
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), RemoteError> {
        self.sftp
            .rename(Path::new(from), Path::new(to), None)
            .map_err(|err| classify(err, from, "rename remote path"))
    }

    fn download(&self, remote: &str, local: &Path) -> Result<u64, RemoteError> {
        let mut source = self
            .sftp
            .open(Path::new(remote))
            .map_err(|err| classify(err, remote, "open remote file"))?;
        let mut target =
            File::create(local).map_err(|err| RemoteError::other("create local file", err))?;
        io::copy(&mut source, &mut target).map_err(|err| RemoteError::other("download", err))
    }

    fn upload(&self, local: &Path, remote: &str) -> Result<u64, RemoteError> {
        let mut source =
            File::open(local).map_err(|err| RemoteError::other("open local file", err))?;
        let mut target = self
            .sftp
            .create(Path::new(remote))
            .map_err(|err| classify(err, remote, "create remote file"))?;
        io::copy(&mut source, &mut target).map_err(|err| RemoteError::other("upload", err))
    }
}

fn classify(err: ssh2::Error, path: &str, context: &str) -> RemoteError {
    let path = path.to_string();
    match err.code() {
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => RemoteError::NotFound { path },
        ErrorCode::SFTP(SFTP_PERMISSION_DENIED) => RemoteError::PermissionDenied { path },
        ErrorCode::SFTP(SFTP_FAILURE) => RemoteError::Failure { path },
        ErrorCode::SFTP(SFTP_NO_SPACE) => RemoteError::NoSpace { path },
        _ => RemoteError::other(context, err),
    }
}

fn entry_from_stat(name: String, stat: &FileStat) -> RemoteEntry {
    let perm = stat.perm.unwrap_or(0);
    RemoteEntry {
        name,
        size: stat.size.unwrap_or(0),
        permissions: format_permissions(perm),
        is_dir: perm & S_IFMT == S_IFDIR,
        modified: stat.mtime,
    }
}

pub(crate) fn format_permissions(perm: u32) -> String {
    let kind = match perm & S_IFMT {
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        _ => '-',
    };
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (perm >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

pub(crate) fn join_remote(dir: &str, name: &str) -> String {
    if name.starts_with('/') {
        return normalize_remote(name);
    }
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// `None` at the filesystem root.
pub(crate) fn parent_remote(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some(("", _)) => Some(String::from("/")),
        Some((parent, _)) => Some(parent.to_string()),
        None => None,
    }
}

pub(crate) fn remote_file_name(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name.to_string(),
        _ => String::from("/"),
    }
}

pub(crate) fn normalize_remote(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

pub(crate) fn resolve_remote(input: &str, cwd: &str, home: &str) -> String {
    let input = input.trim();
    if input == "~" {
        return normalize_remote(home);
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return normalize_remote(&join_remote(home, rest));
    }
    if input.starts_with('/') {
        return normalize_remote(input);
    }
    normalize_remote(&join_remote(cwd, input))
}

#[cfg(test)]
#[derive(Debug, Clone)]
struct MockNode {
    is_dir: bool,
    data: Vec<u8>,
}

#[cfg(test)]
pub(crate) struct MockRemote {
    home: String,
    nodes: std::sync::Mutex<std::collections::BTreeMap<String, MockNode>>,
    read_only: std::sync::atomic::AtomicBool,
    fail_lists: std::sync::atomic::AtomicBool,
    fail_downloads: std::sync::atomic::AtomicBool,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockRemote {
    pub(crate) fn new(home: &str) -> Self {
        let remote = Self {
            home: home.to_string(),
            nodes: Default::default(),
            read_only: Default::default(),
            fail_lists: Default::default(),
            fail_downloads: Default::default(),
            calls: Default::default(),
        };
        remote.add_dir(home);
        remote
    }

    pub(crate) fn add_dir(&self, path: &str) {
        let mut current = String::new();
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.insert(
                "/".to_string(),
                MockNode {
                    is_dir: true,
                    data: vec![],
                },
            );
            for part in path.split('/').filter(|p| !p.is_empty()) {
                current.push('/');
                current.push_str(part);
                nodes.entry(current.clone()).or_insert(MockNode {
                    is_dir: true,
                    data: vec![],
                });
            }
        }
    }

    pub(crate) fn add_file(&self, path: &str, data: &[u8]) {
        if let Some(parent) = parent_remote(path) {
            self.add_dir(&parent);
        }
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.insert(
                path.to_string(),
                MockNode {
                    is_dir: false,
                    data: data.to_vec(),
                },
            );
        }
    }

    pub(crate) fn exists(&self, path: &str) -> bool {
        self.nodes
            .lock()
            .map(|nodes| nodes.contains_key(path))
            .unwrap_or(false)
    }

    pub(crate) fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.nodes
            .lock()
            .ok()
            .and_then(|nodes| nodes.get(path).map(|node| node.data.clone()))
    }

    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.read_only
            .store(read_only, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn set_fail_lists(&self, fail: bool) {
        self.fail_lists
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Downloads write the first half of the file, then fail.
    pub(crate) fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_writable(&self, path: &str) -> Result<(), RemoteError> {
        if self.read_only.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RemoteError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn entry(name: String, node: &MockNode) -> RemoteEntry {
        RemoteEntry {
            name,
            size: node.data.len() as u64,
            permissions: format_permissions(if node.is_dir { 0o040755 } else { 0o100644 }),
            is_dir: node.is_dir,
            modified: None,
        }
    }
}

#[cfg(test)]
impl RemoteSession for std::sync::Arc<MockRemote> {
    fn home_dir(&self) -> &str {
        &self.home
    }

    fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.record(format!("list {path}"));
        if self.fail_lists.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RemoteError::Failure {
                path: path.to_string(),
            });
        }
        let nodes = self
            .nodes
            .lock()
            .map_err(|err| RemoteError::other("lock", err))?;
        match nodes.get(path) {
            Some(node) if node.is_dir => {}
            Some(_) => {
                return Err(RemoteError::NotADirectory {
                    path: path.to_string(),
                });
            }
            None => {
                return Err(RemoteError::NotFound {
                    path: path.to_string(),
                });
            }
        }
        Ok(nodes
            .iter()
            .filter(|(candidate, _)| {
                candidate.as_str() != "/"
                    && parent_remote(candidate).as_deref() == Some(path)
            })
            .map(|(candidate, node)| MockRemote::entry(remote_file_name(candidate), node))
            .collect())
    }

    fn stat(&self, path: &str) -> Result<RemoteEntry, RemoteError> {
        let nodes = self
            .nodes
            .lock()
            .map_err(|err| RemoteError::other("lock", err))?;
        nodes
            .get(path)
            .map(|node| MockRemote::entry(remote_file_name(path), node))
            .ok_or_else(|| RemoteError::NotFound {
                path: path.to_string(),
            })
    }

    fn create_file(&self, path: &str) -> Result<(), RemoteError> {
        self.record(format!("create_file {path}"));
        self.check_writable(path)?;
        self.add_file(path, b"");
        Ok(())
    }

    fn create_dir(&self, path: &str) -> Result<(), RemoteError> {
        self.record(format!("create_dir {path}"));
        self.check_writable(path)?;
        if self.exists(path) {
            return Err(RemoteError::Failure {
                path: path.to_string(),
            });
        }
        self.add_dir(path);
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<(), RemoteError> {
        self.record(format!("remove_file {path}"));
        self.check_writable(path)?;
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|err| RemoteError::other("lock", err))?;
        nodes
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound {
                path: path.to_string(),
            })
    }

    fn remove_dir(&self, path: &str) -> Result<(), RemoteError> {
        self.record(format!("remove_dir {path}"));
        self.check_writable(path)?;
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|err| RemoteError::other("lock", err))?;
        let prefix = format!("{path}/");
        if nodes.keys().any(|key| key.starts_with(&prefix)) {
            return Err(RemoteError::Failure {
                path: path.to_string(),
            });
        }
        nodes
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound {
                path: path.to_string(),
            })
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), RemoteError> {
        self.record(format!("rename {from} {to}"));
        self.check_writable(from)?;
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|err| RemoteError::other("lock", err))?;
        let node = nodes.remove(from).ok_or_else(|| RemoteError::NotFound {
            path: from.to_string(),
        })?;
        nodes.insert(to.to_string(), node);
        Ok(())
    }

    fn download(&self, remote: &str, local: &Path) -> Result<u64, RemoteError> {
        self.record(format!("download {remote}"));
        let data = self.contents(remote).ok_or_else(|| RemoteError::NotFound {
            path: remote.to_string(),
        })?;
        if self.fail_downloads.load(std::sync::atomic::Ordering::SeqCst) {
            std::fs::write(local, &data[..data.len() / 2])
                .map_err(|err| RemoteError::other("write local", err))?;
            return Err(RemoteError::Failure {
                path: remote.to_string(),
            });
        }
        std::fs::write(local, &data).map_err(|err| RemoteError::other("write local", err))?;
        Ok(data.len() as u64)
    }

    fn upload(&self, local: &Path, remote: &str) -> Result<u64, RemoteError> {
        self.record(format!("upload {remote}"));
        self.check_writable(remote)?;
        let data = std::fs::read(local).map_err(|err| RemoteError::other("read local", err))?;
        self.add_file(remote, &data);
        Ok(data.len() as u64)
    }
}
