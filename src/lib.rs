//! # rsnap
//!
//! Incremental directory snapshots on top of rsync.
//!
//! Each run creates a directory `YYYY-MM-DD_HH-MM-SS.ffffff.partial` under a
//! backup root, lets rsync fill it while hard-linking unchanged files against
//! the newest complete snapshot (`--link-dest`), and renames it to
//! `YYYY-MM-DD_HH-MM-SS.ffffff` once rsync exits successfully.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rsnap::backup::backup_config::BackupConfig;
//! use rsnap::backup::orchestrator::BackupOrchestrator;
//!
//! let config = BackupConfig::builder()
//!     .source("/home/me/")
//!     .root(std::path::Path::new("/mnt/backups"))
//!     .build();
//! let snapshot = BackupOrchestrator::from_config(config).backup()?;
//! println!("created {:?}", snapshot.path());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
