//! Path helpers for the output tree

use crate::domain::{ExporterError, Result};
use chrono::{DateTime, TimeZone};
use std::path::{Component, Path, PathBuf};

/// Timestamp layout used in output filenames
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Makes `path` absolute and resolves `.` and `..` lexically
///
/// Relative paths are anchored at the current working directory. `..` never climbs
/// above the filesystem root.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| ExporterError::io("get current directory", e))?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    Ok(normalized)
}

/// Replaces path separators and control characters so a display name can be
/// embedded in a single filename component
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Builds `{resource_type}_{name}_{YYYYMMDDHHMMSS}.json`
pub fn resource_file_name<Tz>(resource_type: &str, name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_{}_{}.json",
        sanitize_component(resource_type),
        sanitize_component(name),
        at.format(TIMESTAMP_FORMAT)
    )
}
