use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::snapshot_name::Clock;
use crate::backup::validate::{
    validate_absolute_dir, validate_non_empty_source, validate_transfer_options,
};
use bon::Builder;
use function_name::named;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

static DEFAULT_TRANSFER_PROGRAM: &str = "rsync";
static DEFAULT_TRANSFER_OPTIONS: [&str; 2] = ["-a", "-v"];

fn default_program() -> PathBuf {
    DEFAULT_TRANSFER_PROGRAM.into()
}

fn default_options() -> Vec<String> {
    DEFAULT_TRANSFER_OPTIONS.iter().map(|o| o.to_string()).collect()
}

/// Everything a single backup run needs, validated once up front.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters, CopyGetters)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Handed to the transfer program untouched, may be a remote spec.
    #[validate(custom(function = validate_non_empty_source))]
    #[builder(into)]
    #[getset(get = "pub")]
    source: Arc<str>,
    #[validate(custom(function = validate_absolute_dir))]
    #[builder(into)]
    #[getset(get = "pub")]
    root: Arc<Path>,
    #[validate(nested)]
    #[serde(default)]
    #[builder(default)]
    #[getset(get = "pub")]
    transfer: TransferConfig,
    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    clock: Clock,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct TransferConfig {
    #[serde(default = "default_program")]
    #[builder(default = default_program(), into)]
    program: PathBuf,
    /// Must not contain `--link-dest`, which is managed by the backup.
    #[validate(custom(function = validate_transfer_options))]
    #[serde(default = "default_options")]
    #[builder(default = default_options(), into)]
    options: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Optional settings read from a YAML file or from command line flags.
///
/// Every field may be absent; absent fields fall back to the next layer and
/// finally to the built-in defaults.
///
/// ```yaml
/// transfer:
///   program: /usr/local/bin/rsync
///   options: ["-aH", "--delete"]
/// clock: local
/// ```
#[skip_serializing_none]
#[derive(Clone, Default, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[validate(nested)]
    #[serde(default)]
    #[builder(default)]
    transfer: TransferSettings,
    clock: Option<Clock>,
}

#[skip_serializing_none]
#[derive(Clone, Default, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransferSettings {
    #[builder(into)]
    program: Option<PathBuf>,
    #[validate(custom(function = validate_transfer_options))]
    #[builder(into)]
    options: Option<Vec<String>>,
}

impl TransferSettings {
    pub fn or(self, fallback: TransferSettings) -> TransferSettings {
        TransferSettings {
            program: self.program.or(fallback.program),
            options: self.options.or(fallback.options),
        }
    }
}

impl Settings {
    /// Reads and validates a YAML settings file.
    #[named]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader::<_, Settings>(f).map_err(Error::from))
            .add_msg(format!("Loading YAML config failed: {:?}", path))
            .add_fn_name(function_path!())?;
        settings
            .validate()
            .map_err(Error::from)
            .add_msg(format!("Invalid YAML config: {:?}", path))
            .add_fn_name(function_path!())?;
        Ok(settings)
    }

    /// Fields set in `self` win over those in `fallback`.
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            transfer: self.transfer.or(fallback.transfer),
            clock: self.clock.or(fallback.clock),
        }
    }
}

impl BackupConfig {
    pub fn from_settings<S: Into<Arc<str>>, P: Into<Arc<Path>>>(
        source: S,
        root: P,
        settings: Settings,
    ) -> Self {
        let transfer = TransferConfig::builder()
            .maybe_program(settings.transfer.program)
            .maybe_options(settings.transfer.options)
            .build();
        BackupConfig::builder()
            .source(source)
            .root(root)
            .transfer(transfer)
            .maybe_clock(settings.clock)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::result_error::error::ErrorKind;
    use tempfile::TempDir;

    fn config(root: &Path, options: &[&str]) -> BackupConfig {
        BackupConfig::builder()
            .source("/data")
            .root(root)
            .transfer(
                TransferConfig::builder()
                    .options(options.iter().map(|o| o.to_string()).collect::<Vec<_>>())
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_defaults() {
        let transfer = TransferConfig::default();
        assert_eq!(transfer.program(), &PathBuf::from("rsync"));
        assert_eq!(transfer.options(), &vec!["-a".to_string(), "-v".to_string()]);

        let root = TempDir::new().unwrap();
        let config = BackupConfig::builder().source("/data").root(root.path()).build();
        assert_eq!(config.transfer(), &transfer);
        assert_eq!(config.clock(), Clock::Utc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_link_dest_option() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), &["-a", "--link-dest=/elsewhere"]);

        let err = Error::from(config.validate().unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("--link-dest"));
    }

    #[test]
    fn test_validate_rejects_relative_root() {
        let config = config(Path::new("relative/root"), &["-a"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let root = TempDir::new().unwrap();
        let config = config(&root.path().join("missing"), &["-a"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_source() {
        let root = TempDir::new().unwrap();
        let config = BackupConfig::builder().source("").root(root.path()).build();
        assert!(config.validate().is_err());
    }

    fn transfer_settings(program: Option<&str>, options: Option<&[&str]>) -> TransferSettings {
        TransferSettings::builder()
            .maybe_program(program.map(PathBuf::from))
            .maybe_options(options.map(|o| o.iter().map(|o| o.to_string()).collect::<Vec<_>>()))
            .build()
    }

    #[test]
    fn test_settings_yaml() {
        let yaml = r#"
transfer:
  program: /usr/local/bin/rsync
  options: ["-aH", "--delete"]
clock: local
"#;
        let settings: Settings = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            settings,
            Settings::builder()
                .transfer(transfer_settings(
                    Some("/usr/local/bin/rsync"),
                    Some(&["-aH", "--delete"])
                ))
                .clock(Clock::Local)
                .build()
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_yaml_partial_transfer_table() {
        let yaml = "transfer:\n  program: /opt/rsync\n  options: [\"-a\"]\nclock: utc\n";
        let settings: Settings = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            settings,
            Settings::builder()
                .transfer(transfer_settings(Some("/opt/rsync"), Some(&["-a"])))
                .clock(Clock::Utc)
                .build()
        );

        let settings: Settings = serde_yml::from_str("transfer:\n  options: [-av]\n").unwrap();
        assert_eq!(
            settings,
            Settings::builder()
                .transfer(transfer_settings(None, Some(&["-av"])))
                .build()
        );
    }

    #[test]
    fn test_settings_yaml_rejects_unknown_field() {
        assert!(serde_yml::from_str::<Settings>("rsync_args: [-a]").is_err());
        assert!(serde_yml::from_str::<Settings>("transfer_program: /opt/rsync").is_err());
        assert!(serde_yml::from_str::<Settings>("transfer:\n  args: [-a]\n").is_err());
    }

    #[test]
    fn test_settings_validate_link_dest() {
        let settings = Settings::builder()
            .transfer(transfer_settings(None, Some(&["--link-dest", "/x"])))
            .build();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rsnap.yml");
        std::fs::write(&path, "clock: utc\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::builder().clock(Clock::Utc).build());

        let err = Settings::load(dir.path().join("missing.yml")).unwrap_err();
        assert!(err.to_string().contains("Loading YAML config failed"));
    }

    #[test]
    fn test_settings_load_rejects_link_dest_option() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rsnap.yml");
        std::fs::write(&path, "transfer:\n  options: [-a, --link-dest=/x]\n").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Invalid YAML config"));
    }

    #[test]
    fn test_settings_or_prefers_self() {
        let cli = Settings::builder()
            .transfer(transfer_settings(None, Some(&["-a"])))
            .build();
        let file = Settings::builder()
            .transfer(transfer_settings(Some("/opt/rsync"), Some(&["-av"])))
            .clock(Clock::Local)
            .build();

        let merged = cli.or(file);
        assert_eq!(
            merged,
            Settings::builder()
                .transfer(transfer_settings(Some("/opt/rsync"), Some(&["-a"])))
                .clock(Clock::Local)
                .build()
        );
    }

    #[test]
    fn test_from_settings_applies_defaults() {
        let root = TempDir::new().unwrap();
        let config = BackupConfig::from_settings("/data", root.path(), Settings::default());

        assert_eq!(config.source().as_ref(), "/data");
        assert_eq!(config.root().as_ref(), root.path());
        assert_eq!(config.transfer(), &TransferConfig::default());
        assert_eq!(config.clock(), Clock::Utc);
    }

    #[test]
    fn test_from_settings_uses_given_values() {
        let root = TempDir::new().unwrap();
        let settings = Settings::builder()
            .transfer(transfer_settings(Some("/opt/rsync"), Some(&["-aHAX"])))
            .clock(Clock::Local)
            .build();
        let config = BackupConfig::from_settings("host:/data", root.path(), settings);

        assert_eq!(config.transfer().program(), &PathBuf::from("/opt/rsync"));
        assert_eq!(config.transfer().options(), &vec!["-aHAX".to_string()]);
        assert_eq!(config.clock(), Clock::Local);
    }

    #[test]
    fn test_backup_config_serde_round_trip() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), &["-a"]);
        let json = serde_json::to_string(&config).unwrap();
        let back: BackupConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.root(), config.root());
        assert_eq!(back.transfer(), config.transfer());
    }
}
