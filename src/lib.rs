//! aws-scrub - dependency-aware teardown of tagged AWS resources
//!
//! This crate deletes every resource in an account/region carrying a given
//! tag, processing resource kinds in dependency order while deleting the
//! resources of each kind in parallel.

pub mod aws;
pub mod config;
pub mod provider;
pub mod providers;
pub mod resource;
pub mod schedule;
