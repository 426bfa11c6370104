//! EC2 elastic IP addresses
//!
//! An address still associated with something in the VPC refuses release,
//! so the VPC teardown goes first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2Eip;

#[async_trait]
impl Provider for Ec2Eip {
    fn kind(&self) -> Kind {
        super::EC2_EIP
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EC2_VPC]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [allocation_id] = entity.id.as_slice() else {
            bail!("invalid elastic IP id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .release_address()
            .allocation_id(allocation_id)
            .send()
            .await
            .with_context(|| format!("releasing elastic IP {allocation_id}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.ec2_client();

        // DescribeAddresses is not paginated
        let addresses = client
            .describe_addresses()
            .filters(
                Filter::builder()
                    .name(format!("tag:{}", settings.filter.key))
                    .values(&settings.filter.value)
                    .build(),
            )
            .send()
            .await
            .context("describing elastic IPs")?;

        let mut entities = Vec::new();
        for address in addresses.addresses() {
            if let Some(id) = address.allocation_id() {
                entities.push(
                    Entity::new(self.kind(), vec![id.to_string()])
                        .with_tags(ec2_tags(address.tags())),
                );
            }
        }

        Ok(entities)
    }
}
