use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a wallet or ledger adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider is available")]
    Unavailable,
    #[error("the request was declined in the wallet")]
    Rejected,
    #[error("wallet rpc failed: {0}")]
    Rpc(String),
    #[error("ledger rejected the call: {0}")]
    Reverted(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

/// User-facing failure class. Every error surfaced by the controller maps to exactly
/// one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ProviderUnavailable,
    AuthorizationDenied,
    SubmissionFailed,
    ReadFailed,
    ValidationFailed,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::ProviderUnavailable | Self::ValidationFailed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "provider unavailable",
            Self::AuthorizationDenied => "authorization denied",
            Self::SubmissionFailed => "submission failed",
            Self::ReadFailed => "read failed",
            Self::ValidationFailed => "validation failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned by session and synchronizer operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("a browser wallet is required to use this app")]
    ProviderUnavailable,
    #[error("wallet authorization was declined")]
    AccountsDenied,
    #[error("the wallet did not report any account")]
    NoAccounts,
    #[error("wallet could not be reached: {0}")]
    Wallet(WalletError),
    #[error("signature request was declined")]
    SignatureDenied,
    #[error("submission failed: {0}")]
    Submission(WalletError),
    #[error("could not load tasks: {0}")]
    Read(WalletError),
    #[error("task {field} must not be empty")]
    EmptyField { field: &'static str },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderUnavailable | Self::Wallet(_) => ErrorKind::ProviderUnavailable,
            Self::AccountsDenied | Self::NoAccounts | Self::SignatureDenied => {
                ErrorKind::AuthorizationDenied
            }
            Self::Submission(_) => ErrorKind::SubmissionFailed,
            Self::Read(_) => ErrorKind::ReadFailed,
            Self::EmptyField { .. } => ErrorKind::ValidationFailed,
        }
    }

    pub(crate) fn from_connect(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable => Self::ProviderUnavailable,
            WalletError::Rejected => Self::AccountsDenied,
            other => Self::Wallet(other),
        }
    }

    pub(crate) fn from_submission(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable => Self::ProviderUnavailable,
            WalletError::Rejected => Self::SignatureDenied,
            other => Self::Submission(other),
        }
    }

    pub(crate) fn from_read(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable => Self::ProviderUnavailable,
            other => Self::Read(other),
        }
    }
}

/// The single transient error slot shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SyncError> for Diagnostic {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_errors_map_to_operation_kinds() {
        assert_eq!(
            SyncError::from_connect(WalletError::Rejected).kind(),
            ErrorKind::AuthorizationDenied
        );
        assert_eq!(
            SyncError::from_connect(WalletError::Unavailable).kind(),
            ErrorKind::ProviderUnavailable
        );
        assert_eq!(
            SyncError::from_submission(WalletError::Rejected).kind(),
            ErrorKind::AuthorizationDenied
        );
        assert_eq!(
            SyncError::from_submission(WalletError::Reverted("bad id".into())).kind(),
            ErrorKind::SubmissionFailed
        );
        assert_eq!(
            SyncError::from_read(WalletError::Rpc("timeout".into())).kind(),
            ErrorKind::ReadFailed
        );
    }

    #[test]
    fn only_recoverable_kinds_are_retryable() {
        assert!(!ErrorKind::ProviderUnavailable.is_retryable());
        assert!(!ErrorKind::ValidationFailed.is_retryable());
        assert!(ErrorKind::AuthorizationDenied.is_retryable());
        assert!(ErrorKind::SubmissionFailed.is_retryable());
        assert!(ErrorKind::ReadFailed.is_retryable());
    }

    #[test]
    fn diagnostic_carries_kind_and_message() {
        let diag = Diagnostic::from(&SyncError::EmptyField { field: "title" });
        assert_eq!(diag.kind, ErrorKind::ValidationFailed);
        assert_eq!(diag.message, "task title must not be empty");
    }
}
