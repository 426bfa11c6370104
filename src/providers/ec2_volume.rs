//! EBS volumes
//!
//! A volume only deletes once detached, which the instance teardown inside
//! the VPC takes care of.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2Volume;

#[async_trait]
impl Provider for Ec2Volume {
    fn kind(&self) -> Kind {
        super::EC2_VOLUME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EC2_VPC]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [volume_id] = entity.id.as_slice() else {
            bail!("invalid volume id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_volume()
            .volume_id(volume_id)
            .send()
            .await
            .with_context(|| format!("deleting volume {volume_id}"))?;
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
            .describe_volumes()
            .filters(filter)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing volumes")?;
            for volume in page.volumes() {
                if let Some(id) = volume.volume_id() {
                    entities.push(
                        Entity::new(self.kind(), vec![id.to_string()])
                            .with_tags(ec2_tags(volume.tags())),
                    );
                }
            }
        }

        Ok(entities)
    }
}
