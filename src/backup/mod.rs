pub mod backup_config;
pub mod orchestrator;
pub mod repository;
pub mod result_error;
pub mod snapshot;
pub mod snapshot_name;
pub mod transfer;
pub mod validate;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
