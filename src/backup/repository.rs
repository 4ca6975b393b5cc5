//! Discovery of existing snapshots under a backup root.

use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::snapshot::Snapshot;
use crate::backup::snapshot_name::SnapshotName;
use function_name::named;
use getset::Getters;
use itertools::Itertools;
use std::cmp::Reverse;
use std::fs::DirEntry;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct SnapshotRepository {
    root: Arc<Path>,
}

impl SnapshotRepository {
    /// `root` is expected to be an existing absolute directory; the config
    /// layer validates that before a repository is built.
    pub fn new<P: Into<Arc<Path>>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// All snapshot directories directly under the root, newest first.
    ///
    /// Entries that are not directories or whose names are outside the
    /// snapshot grammar are skipped. Order between equal timestamps is
    /// unspecified.
    #[named]
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(Error::from)
            .add_msg(format!("Listing snapshot root {:?} failed", self.root))
            .add_fn_name(function_path!())?;

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(Error::from)
                .add_msg(format!("Reading entry of {:?} failed", self.root))
                .add_fn_name(function_path!())?;
            if let Some(snapshot) = self.parse_entry(&entry) {
                snapshots.push(snapshot);
            }
        }

        let snapshots = snapshots
            .into_iter()
            .sorted_unstable_by_key(|s| Reverse(s.timestamp()))
            .collect_vec();
        tracing::debug!("Found {} snapshot(s) under {:?}", snapshots.len(), self.root);
        Ok(snapshots)
    }

    /// The snapshot the next transfer should hard-link against, if any.
    pub fn link_base(&self) -> Result<Option<Snapshot>> {
        Ok(select_link_base(&self.list()?).cloned())
    }

    fn parse_entry(&self, entry: &DirEntry) -> Option<Snapshot> {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::trace!("Skipping non UTF-8 entry {:?}", file_name);
            return None;
        };
        let Some(snapshot_name) = SnapshotName::parse(name) else {
            tracing::trace!("Skipping {:?}, not a snapshot name", name);
            return None;
        };
        // follows symlinks, a link to a snapshot directory counts
        if !entry.path().is_dir() {
            tracing::trace!("Skipping {:?}, not a directory", name);
            return None;
        }
        Some(Snapshot::from_existing(self.root.clone(), snapshot_name))
    }
}

/// First complete snapshot of a newest-first sequence.
///
/// `None` when there are no snapshots or only pending ones, in which case the
/// next transfer is a full copy.
pub fn select_link_base(snapshots: &[Snapshot]) -> Option<&Snapshot> {
    snapshots.iter().find(|s| s.is_complete())
}
