use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::snapshot_name::{SnapshotName, SnapshotState, SnapshotTimestamp};
use function_name::named;
use getset::{CopyGetters, Getters};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One snapshot directory under a backup root.
///
/// The in-memory state only ever says `Complete` after the rename to the
/// complete name has succeeded on disk.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Snapshot {
    #[getset(get = "pub")]
    root: Arc<Path>,
    #[getset(get_copy = "pub")]
    name: SnapshotName,
}

impl Snapshot {
    pub(crate) fn from_existing<P: Into<Arc<Path>>>(root: P, name: SnapshotName) -> Self {
        Self {
            root: root.into(),
            name,
        }
    }

    /// Creates the `<timestamp>.partial` directory under `root`.
    ///
    /// Only the leaf directory is created; `root` must already exist. An
    /// existing directory with the same name is an error.
    #[named]
    pub fn create_pending<P: Into<Arc<Path>>>(
        root: P,
        timestamp: SnapshotTimestamp,
    ) -> Result<Self> {
        let snapshot = Self::from_existing(root, SnapshotName::pending(timestamp));
        let path = snapshot.path();
        std::fs::create_dir(&path)
            .map_err(Error::from)
            .add_msg(format!("Creating pending snapshot directory {:?} failed", path))
            .add_fn_name(function_path!())?;
        tracing::debug!("Created pending snapshot directory {:?}", path);
        Ok(snapshot)
    }

    pub fn timestamp(&self) -> SnapshotTimestamp {
        self.name.timestamp()
    }

    pub fn state(&self) -> SnapshotState {
        self.name.state()
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_complete()
    }

    pub fn dir_name(&self) -> String {
        self.name.to_string()
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(self.dir_name())
    }

    /// Marks the snapshot complete by renaming `<timestamp>.partial` to
    /// `<timestamp>`. This rename is the commit point of a backup.
    ///
    /// On failure the directory keeps its pending name. Completing an already
    /// complete snapshot is a no-op.
    #[named]
    pub fn complete(self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self);
        }

        let completed = Self {
            root: self.root.clone(),
            name: self.name.to_complete(),
        };
        let from = self.path();
        let to = completed.path();

        // rename(2) silently replaces an empty target directory
        if to.exists() {
            return Err(Error::from(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{:?} already exists", to),
            ))
            .add_fn_name(function_path!()));
        }

        std::fs::rename(&from, &to)
            .map_err(Error::from)
            .add_msg(format!("Renaming {:?} to {:?} failed", from, to))
            .add_fn_name(function_path!())?;
        tracing::debug!("Renamed {:?} to {:?}", from, to);
        Ok(completed)
    }
}
