//! AWS plumbing shared by the provider implementations
//!
//! - context: load SDK configuration once, hand out service clients
//! - account: STS caller-identity lookup and validation
//! - error: not-found classification of deletion errors
//! - tags: tag-slice to map conversion for the per-SDK tag types

pub mod account;
pub mod context;
pub mod error;
pub mod tags;

pub use account::{get_caller_identity, CallerIdentity};
pub use context::AwsContext;
pub use error::is_not_found_error;
