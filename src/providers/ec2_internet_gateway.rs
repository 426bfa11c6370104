//! EC2 internet gateways
//!
//! An attached gateway must detach from its VPC before deletion, so the
//! delete looks the gateway up first. Anything still using IPv4 routes out
//! of the VPC goes earlier, hence the static dependencies.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2InternetGateway;

#[async_trait]
impl Provider for Ec2InternetGateway {
    fn kind(&self) -> Kind {
        super::EC2_INTERNET_GATEWAY
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![
            super::EC2_INSTANCE,
            super::ELB_LOAD_BALANCER,
            super::EC2_NAT_GATEWAY,
            super::EKS_CLUSTER,
        ]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [gateway_id] = entity.id.as_slice() else {
            bail!("invalid internet gateway id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();

        let described = client
            .describe_internet_gateways()
            .internet_gateway_ids(gateway_id)
            .send()
            .await
            .with_context(|| format!("describing internet gateway {gateway_id}"))?;
        let [gateway] = described.internet_gateways() else {
            bail!(
                "unexpected count of internet gateways: {}",
                described.internet_gateways().len()
            );
        };

        if let Some(attachment) = gateway.attachments().first() {
            client
                .detach_internet_gateway()
                .internet_gateway_id(gateway_id)
                .set_vpc_id(attachment.vpc_id().map(String::from))
                .send()
                .await
                .with_context(|| format!("detaching internet gateway {gateway_id}"))?;
        }

        client
            .delete_internet_gateway()
            .internet_gateway_id(gateway_id)
            .send()
            .await
            .with_context(|| format!("deleting internet gateway {gateway_id}"))?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.ec2_client();
        let filter = Filter::builder()
            .name(format!("tag:{}", settings.filter.key))
            .values(&settings.filter.value)
            .build();

        let mut entities = Vec::new();
        let mut pages = client
            .describe_internet_gateways()
            .filters(filter)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing internet gateways")?;
            for gateway in page.internet_gateways() {
                if let Some(id) = gateway.internet_gateway_id() {
                    entities.push(
                        Entity::new(self.kind(), vec![id.to_string()])
                            .with_tags(ec2_tags(gateway.tags())),
                    );
                }
            }
        }

        Ok(entities)
    }
}
