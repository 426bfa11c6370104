//! Classification of AWS deletion errors
//!
//! The scheduler treats a deletion error as non-fatal when the resource is
//! already gone; everything else aborts the run. AWS reports "already gone"
//! through service-specific error codes, so classification extracts the
//! code from the error chain's debug representation and checks it against
//! a known table.

/// Known AWS error codes for "not found" conditions across the services
/// the providers talk to.
const NOT_FOUND_CODES: &[&str] = &[
    // EC2
    "InvalidInstanceID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidPermission.NotFound",
    "InvalidSecurityGroupRuleId.NotFound",
    "InvalidVpcID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidRouteTableID.NotFound",
    "InvalidInternetGatewayID.NotFound",
    "InvalidNetworkAclID.NotFound",
    "InvalidVpcEndpointId.NotFound",
    "InvalidAllocationID.NotFound",
    "InvalidVolume.NotFound",
    "InvalidLaunchTemplateId.NotFound",
    "NatGatewayNotFound",
    // EKS / CloudWatch Logs / SQS / EventBridge
    "ResourceNotFoundException",
    "QueueDoesNotExist",
    // ELBv2
    "LoadBalancerNotFound",
    "TargetGroupNotFound",
    // IAM
    "NoSuchEntity",
    // Route53
    "NoSuchHostedZone",
];

/// Whether a deletion error means the resource was already gone.
///
/// Walks the error chain's debug output looking for a known not-found code,
/// falling back to a plain HTTP 404 status. Debug-string matching is the
/// only classification that works uniformly across the per-service SDK
/// error types without naming every operation error.
pub fn is_not_found_error(error: &anyhow::Error) -> bool {
    let debug_str = format!("{error:?}");

    if let Some(code) = extract_error_code(&debug_str) {
        return NOT_FOUND_CODES.contains(&code.as_str());
    }

    debug_str.contains("status: 404")
}

/// Extract an AWS error code from a debug string representation.
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in NOT_FOUND_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from a `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn known_not_found_codes_classify_as_absent() {
        for code in NOT_FOUND_CODES {
            let err = anyhow!("ServiceError {{ code: Some(\"{code}\"), message: \"gone\" }}");
            assert!(is_not_found_error(&err), "expected not-found for {code}");
        }
    }

    #[test]
    fn unknown_code_is_not_absent() {
        let err = anyhow!(r#"ServiceError { code: Some("AccessDenied"), message: "no" }"#);
        assert!(!is_not_found_error(&err));
    }

    #[test]
    fn http_404_fallback() {
        let err = anyhow!("unhandled error, status: 404");
        assert!(is_not_found_error(&err));
    }

    #[test]
    fn unrelated_errors_are_fatal() {
        assert!(!is_not_found_error(&anyhow!("connection refused")));
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );
        assert!(extract_error_code("connection refused").is_none());
    }
}
