//! EC2 subnets
//!
//! Discovered through the VPC; a subnet only deletes once nothing has an
//! interface left in it, so the compute and load-balancing kinds go first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2Subnet;

#[async_trait]
impl Provider for Ec2Subnet {
    fn kind(&self) -> Kind {
        super::EC2_SUBNET
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![
            super::EC2_INSTANCE,
            super::EKS_CLUSTER,
            super::ELB_LOAD_BALANCER,
            super::EC2_VPC_ENDPOINT,
        ]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [subnet_id] = entity.id.as_slice() else {
            bail!("invalid subnet id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .with_context(|| format!("deleting subnet {subnet_id}"))?;
        Ok(())
    }
}
