//! EC2 egress-only internet gateways
//!
//! Discovered through the VPC. Unlike the regular internet gateway there
//! is no detach step.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2EgressOnlyInternetGateway;

#[async_trait]
impl Provider for Ec2EgressOnlyInternetGateway {
    fn kind(&self) -> Kind {
        super::EC2_EGRESS_ONLY_INTERNET_GATEWAY
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [gateway_id] = entity.id.as_slice() else {
            bail!("invalid egress-only internet gateway id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_egress_only_internet_gateway()
            .egress_only_internet_gateway_id(gateway_id)
            .send()
            .await
            .with_context(|| format!("deleting egress-only internet gateway {gateway_id}"))?;
        Ok(())
    }
}
