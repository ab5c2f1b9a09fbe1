use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ValidationError {
    #[error("label is required")]
    LabelRequired,
    #[error("host is required")]
    HostRequired,
    #[error("invalid port number")]
    InvalidPort,
    #[error("no credentials available - create one first with 'c'")]
    NoCredentials,
    #[error("username is required")]
    UsernameRequired,
    #[error("password is required")]
    PasswordRequired,
}

#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    #[error("{path}: no such file or directory")]
    NotFound { path: String },
    #[error("{path}: permission denied")]
    PermissionDenied { path: String },
    #[error("{path}: no space left on device")]
    NoSpace { path: String },
    #[error("{path}: server refused the operation (disk full, permissions or unsupported)")]
    Failure { path: String },
    #[error("{path}: not a directory")]
    NotADirectory { path: String },
    #[error("{context}: {message}")]
    Other { context: String, message: String },
}

impl RemoteError {
    pub(crate) fn other(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Other {
            context: context.into(),
            message: err.to_string(),
        }
    }
}
