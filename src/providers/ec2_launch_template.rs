//! EC2 launch templates

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2LaunchTemplate;

#[async_trait]
impl Provider for Ec2LaunchTemplate {
    fn kind(&self) -> Kind {
        super::EC2_LAUNCH_TEMPLATE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [template_id] = entity.id.as_slice() else {
            bail!("invalid launch template id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_launch_template()
            .launch_template_id(template_id)
            .send()
            .await
            .with_context(|| format!("deleting launch template {template_id}"))?;
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
            .describe_launch_templates()
            .filters(filter)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing launch templates")?;
            for template in page.launch_templates() {
                if let Some(id) = template.launch_template_id() {
                    entities.push(
                        Entity::new(self.kind(), vec![id.to_string()])
                            .with_tags(ec2_tags(template.tags())),
                    );
                }
            }
        }

        Ok(entities)
    }
}
