//! EC2 VPC endpoints
//!
//! Discovered through the VPC.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2VpcEndpoint;

#[async_trait]
impl Provider for Ec2VpcEndpoint {
    fn kind(&self) -> Kind {
        super::EC2_VPC_ENDPOINT
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [endpoint_id] = entity.id.as_slice() else {
            bail!("invalid VPC endpoint id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_vpc_endpoints()
            .vpc_endpoint_ids(endpoint_id)
            .send()
            .await
            .with_context(|| format!("deleting VPC endpoint {endpoint_id}"))?;
        Ok(())
    }
}
