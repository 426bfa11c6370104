//! ELBv2 target groups; deletable only once their load balancer is gone.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct ElbTargetGroup;

#[async_trait]
impl Provider for ElbTargetGroup {
    fn kind(&self) -> Kind {
        super::ELB_TARGET_GROUP
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::ELB_LOAD_BALANCER]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [arn] = entity.id.as_slice() else {
            bail!("invalid target group id: {:?}", entity.id);
        };
        settings
            .aws
            .elb_client()
            .delete_target_group()
            .target_group_arn(arn)
            .send()
            .await
            .with_context(|| format!("deleting target group {arn}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.elb_client();

        let mut arns = Vec::new();
        let mut pages = client.describe_target_groups().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing target groups")?;
            for tg in page.target_groups() {
                if let Some(arn) = tg.target_group_arn() {
                    arns.push(arn.to_string());
                }
            }
        }

        super::elb_load_balancer::tagged_entities(settings, self.kind(), arns).await
    }
}
