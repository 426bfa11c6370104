//! AWS account validation and identity

use anyhow::{Context, Result};
use tracing::info;

use super::context::AwsContext;

/// The caller's resolved identity: account id plus the partition parsed
/// from the caller ARN (`arn:<partition>:...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub partition: String,
}

/// Fetch the current AWS identity via STS GetCallerIdentity.
///
/// Requires no special permissions - it succeeds whenever credentials are
/// valid, so it doubles as a credential check before any destructive work.
pub async fn get_caller_identity(aws: &AwsContext) -> Result<CallerIdentity> {
    let sts = aws.sts_client();
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("no account id returned from STS GetCallerIdentity")?
        .to_string();
    let arn = identity
        .arn()
        .context("no ARN returned from STS GetCallerIdentity")?;
    let partition = parse_arn_partition(arn)
        .with_context(|| format!("parsing partition from caller ARN {arn:?}"))?;

    info!(account = %account, partition = %partition, "AWS identity resolved");

    Ok(CallerIdentity { account, partition })
}

/// Pull the partition out of an ARN (`arn:partition:service:...`).
fn parse_arn_partition(arn: &str) -> Option<String> {
    let mut parts = arn.splitn(3, ':');
    if parts.next() != Some("arn") {
        return None;
    }
    match parts.next() {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partition_from_arn() {
        assert_eq!(
            parse_arn_partition("arn:aws:iam::123456789012:user/ops").as_deref(),
            Some("aws")
        );
        assert_eq!(
            parse_arn_partition("arn:aws-us-gov:sts::123456789012:assumed-role/x/y").as_deref(),
            Some("aws-us-gov")
        );
    }

    #[test]
    fn rejects_malformed_arns() {
        assert_eq!(parse_arn_partition("not-an-arn"), None);
        assert_eq!(parse_arn_partition("arn::iam::x"), None);
    }
}
