//! Validation functions for configuration values.
//!
//! Provides custom validation functions for the snapshot root, the transfer
//! source and the user supplied transfer options.

use crate::backup::transfer::LINK_DEST_OPTION;
use validator::ValidationError;

use std::path::Path;

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} not found", dir).into()));
    }

    Ok(())
}

pub fn validate_absolute_dir<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if !dir.is_absolute() {
        return Err(ValidationError::new("RelativePath")
            .with_message(format!("{:?} is not an absolute path", dir).into()));
    }

    validate_dir_exist(dir)
}

pub fn validate_non_empty_source<S: AsRef<str>>(source: S) -> Result<(), ValidationError> {
    if source.as_ref().is_empty() {
        return Err(ValidationError::new("EmptySource")
            .with_message("source must not be empty".into()));
    }

    Ok(())
}

/// The hardlink reference is always injected by the backup itself; a user
/// supplied one would fight with it.
pub fn validate_transfer_options(options: &[String]) -> Result<(), ValidationError> {
    if let Some(option) = options.iter().find(|o| o.starts_with(LINK_DEST_OPTION)) {
        return Err(ValidationError::new("ReservedTransferOption").with_message(
            format!("{option:?}: {LINK_DEST_OPTION} cannot be overridden in transfer options")
                .into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_dir_exist() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_dir_exist(dir.path()).is_ok());
        assert!(validate_dir_exist(&file).is_err());
        assert!(validate_dir_exist(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_validate_absolute_dir_rejects_relative() {
        let err = validate_absolute_dir("relative/backups").unwrap_err();
        assert_eq!(err.code, "RelativePath");
    }

    #[test]
    fn test_validate_absolute_dir_accepts_existing_absolute() {
        let dir = TempDir::new().unwrap();
        assert!(validate_absolute_dir(dir.path()).is_ok());
        assert_eq!(
            validate_absolute_dir(dir.path().join("missing"))
                .unwrap_err()
                .code,
            "InvalidDirectory"
        );
    }

    #[test]
    fn test_validate_non_empty_source() {
        assert!(validate_non_empty_source("/data").is_ok());
        assert!(validate_non_empty_source("host:/data").is_ok());
        assert!(validate_non_empty_source("").is_err());
    }

    #[test]
    fn test_validate_transfer_options() {
        let ok = vec!["-a".to_string(), "-v".to_string(), "--delete".to_string()];
        assert!(validate_transfer_options(&ok).is_ok());
        assert!(validate_transfer_options(&[]).is_ok());

        for reserved in ["--link-dest", "--link-dest=/old", "--link-dest-x"] {
            let options = vec!["-a".to_string(), reserved.to_string()];
            let err = validate_transfer_options(&options).unwrap_err();
            assert_eq!(err.code, "ReservedTransferOption");
        }
    }
}
