use crate::backup::result_error::{AddFunctionName, AddMsg};
use derive_more::Display;
use std::process::ExitStatus;
use thiserror::Error;
use thiserror_ext::Construct;

#[derive(Error, Debug, Construct)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration:\n{}", indent::indent_all_with("  ", .0.to_string()))]
    Configuration(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("System clock is outside the years 0000-9999 a snapshot name can encode")]
    ClockOutOfRange,
    #[error("Transfer command `{command}` failed with {status}")]
    TransferFailed { command: String, status: ExitStatus },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFnName { fn_name: String, error: Box<Error> },
}

/// Coarse classification that survives context wrapping.
///
/// Lets a caller tell "nothing was created" (`Configuration`) apart from
/// "a pending snapshot directory may be left on disk" (`TransferFailed`,
/// `Filesystem`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    TransferFailed,
    Filesystem,
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Self::WithFnName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::SerdeYml(_) | Error::ClockOutOfRange => {
                ErrorKind::Configuration
            }
            Error::TransferFailed { .. } => ErrorKind::TransferFailed,
            Error::Io(_) => ErrorKind::Filesystem,
            Error::WithMsg { error, .. } | Error::WithFnName { error, .. } => error.kind(),
        }
    }
}
