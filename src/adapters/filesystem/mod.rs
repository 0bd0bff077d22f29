//! Filesystem adapter
//!
//! Persists resources as individual JSON files below a confined data root:
//! `{data_root}/{resource_type}/{resource_type}_{name}_{YYYYMMDDHHMMSS}.json`.

pub mod paths;
pub mod writer;

pub use paths::{normalize, resource_file_name, sanitize_component, TIMESTAMP_FORMAT};
pub use writer::{ResourceWriter, DIR_MODE, FILE_MODE};
