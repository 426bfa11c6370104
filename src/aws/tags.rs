//! Tag extraction helpers
//!
//! Different AWS SDKs use different tag types (ec2::Tag, iam::Tag, ...) but
//! they all carry key/value string fields. A generic extractor handles them
//! all via closures.

use std::collections::HashMap;

/// Extract tags from any AWS tag slice into a `HashMap`.
pub fn extract_tags<T>(
    tags: &[T],
    key: impl Fn(&T) -> Option<&str>,
    value: impl Fn(&T) -> Option<&str>,
) -> HashMap<String, String> {
    tags.iter()
        .filter_map(|t| match (key(t), value(t)) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

pub fn ec2_tags(tags: &[aws_sdk_ec2::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| t.key(), |t| t.value())
}

pub fn iam_tags(tags: &[aws_sdk_iam::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| Some(t.key()), |t| Some(t.value()))
}

pub fn elb_tags(tags: &[aws_sdk_elasticloadbalancingv2::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| t.key(), |t| t.value())
}

pub fn events_tags(tags: &[aws_sdk_eventbridge::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| Some(t.key()), |t| Some(t.value()))
}

pub fn route53_tags(tags: &[aws_sdk_route53::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| t.key(), |t| t.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_skips_half_empty_pairs() {
        let raw = vec![
            (Some("a"), Some("1")),
            (Some("b"), None),
            (None, Some("2")),
        ];
        let tags = extract_tags(&raw, |t| t.0, |t| t.1);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("a").map(String::as_str), Some("1"));
    }
}
