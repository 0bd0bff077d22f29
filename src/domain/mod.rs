//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Resource model** ([`Resource`]) and payload decoding ([`decode_resources`])
//! - **Error types** ([`ExporterError`])
//! - **Result type alias** ([`Result`])
//! - **Duration expressions** ([`SignedDuration`]) shared by configuration and retry hints
//!
//! # Decoding
//!
//! ```rust
//! use resource_exporter::domain::decode_resources;
//!
//! # fn example() -> resource_exporter::domain::Result<()> {
//! let payload = br#"{"data":[{"gid":"1","name":"Test1","resource_type":"project"}]}"#;
//! let resources = decode_resources(payload)?;
//! assert_eq!(resources[0].name, "Test1");
//! # Ok(())
//! # }
//! ```

pub mod duration;
pub mod errors;
pub mod resource;
pub mod result;

pub use duration::{ParseDurationError, SignedDuration};
pub use errors::{ExporterError, ResultExt};
pub use resource::{decode_resources, Resource};
pub use result::Result;
