//! One backup run: pick the hardlink base, create a pending snapshot, run the
//! transfer, and commit by renaming the snapshot to its complete name.
//!
//! A failed transfer leaves the `.partial` directory on disk as-is so the
//! partial output can be inspected; it is never linked against and nothing
//! here removes it. Runs are not locked, so two concurrent runs against the
//! same root may pick the same base.

use crate::backup::backup_config::BackupConfig;
use crate::backup::function_path;
use crate::backup::repository::SnapshotRepository;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::snapshot::Snapshot;
use crate::backup::snapshot_name::SnapshotTimestamp;
use crate::backup::transfer::{RsyncTransfer, Transfer, TransferRequest};
use function_name::named;
use getset::Getters;
use validator::Validate;

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct BackupOrchestrator<T: Transfer> {
    config: BackupConfig,
    transfer: T,
}

impl BackupOrchestrator<RsyncTransfer> {
    pub fn from_config(config: BackupConfig) -> Self {
        let transfer = RsyncTransfer::new(config.transfer().program().clone());
        Self::new(config, transfer)
    }
}

impl<T: Transfer> BackupOrchestrator<T> {
    pub fn new(config: BackupConfig, transfer: T) -> Self {
        Self { config, transfer }
    }

    /// Runs a backup stamped with the configured clock.
    #[named]
    pub fn backup(&self) -> Result<Snapshot> {
        let timestamp = self
            .config
            .clock()
            .now()
            .ok_or(Error::ClockOutOfRange)
            .add_fn_name(function_path!())?;
        self.backup_at(timestamp)
    }

    /// Runs a backup whose snapshot is named after `timestamp`.
    ///
    /// Returns the complete snapshot. A configuration error is returned before
    /// anything is created on disk; any later error may leave the pending
    /// directory behind.
    #[named]
    pub fn backup_at(&self, timestamp: SnapshotTimestamp) -> Result<Snapshot> {
        self.config
            .validate()
            .map_err(Error::from)
            .add_fn_name(function_path!())?;

        let root = self.config.root().clone();
        let link_base = SnapshotRepository::new(root.clone())
            .link_base()
            .add_fn_name(function_path!())?;
        match &link_base {
            Some(base) => tracing::info!("Hard-linking against {:?}", base.path()),
            None => tracing::info!("No complete snapshot under {:?}, doing a full copy", root),
        }

        let pending = Snapshot::create_pending(root, timestamp).add_fn_name(function_path!())?;
        tracing::info!("Created pending snapshot {:?}", pending.path());

        let request = TransferRequest::builder()
            .source(self.config.source().to_string())
            .destination(pending.path())
            .options(self.config.transfer().options().clone())
            .maybe_link_dest(link_base.as_ref().map(Snapshot::path))
            .build();

        self.transfer
            .transfer(&request)
            .add_msg(format!("Pending snapshot left at {:?}", pending.path()))
            .add_fn_name(function_path!())?;

        let pending_path = pending.path();
        let complete = pending
            .complete()
            .add_msg(format!(
                "Transfer succeeded but snapshot {:?} could not be marked complete",
                pending_path
            ))
            .add_fn_name(function_path!())?;
        tracing::info!("Completed snapshot {:?}", complete.path());
        Ok(complete)
    }
}
