//! Remote API adapter
//!
//! This module provides the authenticated, rate-limited HTTP client used to fetch
//! resource collections, together with endpoint validation and the token bucket.

pub mod client;
pub mod endpoint;
pub mod limiter;

pub use client::{ApiClient, ApiClientOptions, ApiResponse, ResourceApi, DEFAULT_REQUEST_TIMEOUT};
pub use endpoint::{validate_endpoint, EndpointPolicy, MAX_ENDPOINT_LENGTH};
pub use limiter::TokenBucket;
