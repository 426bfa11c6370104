//! EC2 route tables
//!
//! Discovered through the VPC. Subnet associations vanish with the
//! subnets, so those go first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2RouteTable;

#[async_trait]
impl Provider for Ec2RouteTable {
    fn kind(&self) -> Kind {
        super::EC2_ROUTE_TABLE
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EC2_SUBNET]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [table_id] = entity.id.as_slice() else {
            bail!("invalid route table id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_route_table()
            .route_table_id(table_id)
            .send()
            .await
            .with_context(|| format!("deleting route table {table_id}"))?;
        Ok(())
    }
}
