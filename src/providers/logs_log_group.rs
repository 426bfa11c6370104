//! CloudWatch log groups
//!
//! Compute living in the VPC recreates its log groups on the fly, so the
//! whole VPC teardown happens before log groups are touched.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct LogsLogGroup;

#[async_trait]
impl Provider for LogsLogGroup {
    fn kind(&self) -> Kind {
        super::LOGS_LOG_GROUP
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EC2_VPC]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [name] = entity.id.as_slice() else {
            bail!("invalid log group id: {:?}", entity.id);
        };
        settings
            .aws
            .logs_client()
            .delete_log_group()
            .log_group_name(name)
            .send()
            .await
            .with_context(|| format!("deleting log group {name}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.logs_client();
        let mut entities = Vec::new();

        let mut pages = client.describe_log_groups().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing log groups")?;
            for group in page.log_groups() {
                let Some(name) = group.log_group_name() else {
                    continue;
                };
                // the tag API wants the ARN without the trailing :*
                let Some(arn) = group.log_group_arn() else {
                    continue;
                };
                let tags = client
                    .list_tags_for_resource()
                    .resource_arn(arn)
                    .send()
                    .await
                    .with_context(|| format!("listing tags for log group {name}"))?
                    .tags()
                    .cloned()
                    .unwrap_or_default();

                entities.push(
                    Entity::new(self.kind(), vec![name.to_string()]).with_tags(tags),
                );
            }
        }

        Ok(entities)
    }
}
