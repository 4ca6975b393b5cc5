//! Seam to the external synchronization tool that copies files into a
//! snapshot directory.

use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use bon::Builder;
use function_name::named;
use getset::Getters;
use itertools::Itertools;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// Option used to point the transfer at the hardlink base. Callers may not
/// pass it themselves.
pub static LINK_DEST_OPTION: &str = "--link-dest";

/// One invocation of the transfer tool.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct TransferRequest {
    #[builder(into)]
    source: String,
    #[builder(into)]
    destination: PathBuf,
    #[builder(default, into)]
    options: Vec<String>,
    #[builder(into)]
    link_dest: Option<PathBuf>,
}

impl TransferRequest {
    /// `source destination options... [--link-dest base]`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.source.clone().into(),
            self.destination.clone().into_os_string(),
        ];
        args.extend(self.options.iter().map(OsString::from));
        if let Some(link_dest) = &self.link_dest {
            args.push(LINK_DEST_OPTION.into());
            args.push(link_dest.clone().into_os_string());
        }
        args
    }
}

pub trait Transfer {
    /// Runs to completion. `Ok` only when the tool reported success.
    fn transfer(&self, request: &TransferRequest) -> Result<()>;
}

/// Runs an rsync-compatible program as a child process, inheriting stdio so
/// its progress output reaches the user.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RsyncTransfer {
    program: PathBuf,
}

impl RsyncTransfer {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Shell-quoted command line, for logs and error messages only.
    pub fn command_line(&self, request: &TransferRequest) -> String {
        std::iter::once(self.program.clone().into_os_string())
            .chain(request.args())
            .map(|arg| {
                let arg = arg.to_string_lossy().into_owned();
                match shlex::try_quote(&arg) {
                    Ok(quoted) => quoted.into_owned(),
                    Err(_) => format!("{:?}", arg),
                }
            })
            .join(" ")
    }
}

impl Transfer for RsyncTransfer {
    #[named]
    fn transfer(&self, request: &TransferRequest) -> Result<()> {
        let command_line = self.command_line(request);
        tracing::info!("Issuing: {}", command_line);

        let status = Command::new(&self.program)
            .args(request.args())
            .status()
            .map_err(Error::from)
            .add_msg(format!("Failed to launch transfer program {:?}", self.program))
            .add_fn_name(function_path!())?;

        if status.success() {
            tracing::info!("Transfer finished successfully");
            Ok(())
        } else {
            tracing::warn!("Transfer exited with {}", status);
            Err(Error::transfer_failed(command_line, status).add_fn_name(function_path!()))
        }
    }
}
