//! External system integrations.
//!
//! - [`api`] - Authenticated, rate-limited REST client
//! - [`filesystem`] - Confined per-resource JSON file output
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies. The export pipeline talks to the remote
//! API through the [`api::ResourceApi`] trait so tests can replace the network with
//! scripted responses.
//!
//! ```rust,no_run
//! use resource_exporter::adapters::api::{ApiClient, ApiClientOptions, ResourceApi};
//! use resource_exporter::core::shutdown::ShutdownSignal;
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(
//!     SecretString::new("0/abcdef".to_string()),
//!     ApiClientOptions::default(),
//! )?;
//! let (_trigger, signal) = ShutdownSignal::new();
//! let response = client
//!     .get("https://app.asana.com/api/1.0/projects", &signal)
//!     .await?;
//! println!("status: {}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod filesystem;
