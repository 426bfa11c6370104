//! Shared AWS configuration context
//!
//! Loads AWS SDK configuration once and creates the service clients the
//! providers need from the same config.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared AWS configuration context for creating service clients.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// This resolves credentials, region configuration, and other AWS SDK
    /// settings from the environment, config files, and IAM roles.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self::from_config(config, region)
    }

    /// Wrap an already-loaded SDK config.
    pub fn from_config(config: SdkConfig, region: &str) -> Self {
        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// The underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn ec2_client(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(self.sdk_config())
    }

    pub fn eks_client(&self) -> aws_sdk_eks::Client {
        aws_sdk_eks::Client::new(self.sdk_config())
    }

    pub fn elb_client(&self) -> aws_sdk_elasticloadbalancingv2::Client {
        aws_sdk_elasticloadbalancingv2::Client::new(self.sdk_config())
    }

    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(self.sdk_config())
    }

    pub fn logs_client(&self) -> aws_sdk_cloudwatchlogs::Client {
        aws_sdk_cloudwatchlogs::Client::new(self.sdk_config())
    }

    pub fn events_client(&self) -> aws_sdk_eventbridge::Client {
        aws_sdk_eventbridge::Client::new(self.sdk_config())
    }

    pub fn route53_client(&self) -> aws_sdk_route53::Client {
        aws_sdk_route53::Client::new(self.sdk_config())
    }

    pub fn sqs_client(&self) -> aws_sdk_sqs::Client {
        aws_sdk_sqs::Client::new(self.sdk_config())
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_from_config_records_region() {
        let ctx = AwsContext::from_config(SdkConfig::builder().build(), "us-east-2");
        assert_eq!(ctx.region(), "us-east-2");

        let clone = ctx.clone();
        assert_eq!(clone.region(), "us-east-2");
    }
}
