//! Run settings shared by every provider call
//!
//! The scheduler treats [`Settings`] as opaque and only threads it through
//! to providers and actions; everything here is consumed by the per-kind
//! provider implementations.

use crate::aws::context::AwsContext;

/// Regions from which partition-wide ("global") services are reachable.
///
/// This mirrors the credential-scope regions of the IAM endpoint in each
/// AWS partition. Treated as configuration data, not derived at runtime.
pub const DEFAULT_GLOBAL_REGIONS: &[&str] = &[
    "us-east-1",
    "cn-north-1",
    "us-gov-west-1",
    "us-iso-east-1",
    "us-isob-east-1",
];

/// Tag key/value pair selecting which resources are in scope for deletion.
#[derive(Debug, Clone)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    /// Whether an entity's tag map matches the filter.
    pub fn matches(&self, tags: &std::collections::HashMap<String, String>) -> bool {
        tags.get(&self.key) == Some(&self.value)
    }
}

/// Everything a provider needs to talk to AWS for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub aws: AwsContext,
    pub region: String,
    pub partition: String,
    pub account: String,
    pub filter: TagFilter,
    /// Allow-list of regions from which global kinds are scanned.
    pub global_regions: Vec<String>,
}

impl Settings {
    /// Whether global (partition-wide) kinds should be scanned from the
    /// configured region.
    pub fn is_global_region(&self) -> bool {
        self.global_regions.iter().any(|r| r == &self.region)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Settings with an empty SDK config; providers are never called with
    /// these in tests, but the scheduler needs a value to thread through.
    pub fn settings() -> Settings {
        Settings {
            aws: AwsContext::from_config(aws_config::SdkConfig::builder().build(), "us-east-1"),
            region: "us-east-1".to_string(),
            partition: "aws".to_string(),
            account: "123456789012".to_string(),
            filter: TagFilter {
                key: "project".to_string(),
                value: "doomed".to_string(),
            },
            global_regions: DEFAULT_GLOBAL_REGIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::settings;
    use std::collections::HashMap;

    #[test]
    fn tag_filter_matches_exact_pair() {
        let s = settings();
        let mut tags = HashMap::new();
        tags.insert("project".to_string(), "doomed".to_string());
        assert!(s.filter.matches(&tags));

        tags.insert("project".to_string(), "other".to_string());
        assert!(!s.filter.matches(&tags));
        assert!(!s.filter.matches(&HashMap::new()));
    }

    #[test]
    fn global_region_allow_list() {
        let mut s = settings();
        assert!(s.is_global_region());
        s.region = "eu-west-1".to_string();
        assert!(!s.is_global_region());
    }
}
