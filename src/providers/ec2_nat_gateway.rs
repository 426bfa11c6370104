//! EC2 NAT gateways
//!
//! Discovered through the VPC. Deletion is asynchronous and the VPC will
//! not release until the gateway is really gone, so the delete waits.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::client::Waiters;

use crate::config::Settings;
use crate::provider::{Provider, DEFAULT_DELETE_WAIT};
use crate::resource::{Entity, Kind};

pub struct Ec2NatGateway;

#[async_trait]
impl Provider for Ec2NatGateway {
    fn kind(&self) -> Kind {
        super::EC2_NAT_GATEWAY
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [gateway_id] = entity.id.as_slice() else {
            bail!("invalid NAT gateway id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();

        client
            .delete_nat_gateway()
            .nat_gateway_id(gateway_id)
            .send()
            .await
            .with_context(|| format!("deleting NAT gateway {gateway_id}"))?;

        client
            .wait_until_nat_gateway_deleted()
            .nat_gateway_ids(gateway_id)
            .wait(DEFAULT_DELETE_WAIT)
            .await
            .context("waiting for NAT gateway deletion")?;

        Ok(())
    }
}
