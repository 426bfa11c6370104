//! ELBv2 load balancers
//!
//! DescribeLoadBalancers carries no tags; tags come from DescribeTags,
//! which accepts at most 20 ARNs per call.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::client::Waiters;

use crate::aws::tags::elb_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider, DEFAULT_DELETE_WAIT};
use crate::resource::{Entity, Kind};

const DESCRIBE_TAGS_BATCH: usize = 20;

pub struct ElbLoadBalancer;

#[async_trait]
impl Provider for ElbLoadBalancer {
    fn kind(&self) -> Kind {
        super::ELB_LOAD_BALANCER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [arn] = entity.id.as_slice() else {
            bail!("invalid load balancer id: {:?}", entity.id);
        };
        let client = settings.aws.elb_client();

        client
            .delete_load_balancer()
            .load_balancer_arn(arn)
            .send()
            .await
            .with_context(|| format!("deleting load balancer {arn}"))?;

        client
            .wait_until_load_balancers_deleted()
            .load_balancer_arns(arn)
            .wait(DEFAULT_DELETE_WAIT)
            .await
            .context("waiting for load-balancer deletion")?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.elb_client();

        let mut arns = Vec::new();
        let mut pages = client.describe_load_balancers().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing load balancers")?;
            for lb in page.load_balancers() {
                if let Some(arn) = lb.load_balancer_arn() {
                    arns.push(arn.to_string());
                }
            }
        }

        tagged_entities(settings, self.kind(), arns).await
    }
}

/// Resolve tags for a batch of ELBv2 ARNs and build the entities.
pub(super) async fn tagged_entities(
    settings: &Settings,
    kind: Kind,
    arns: Vec<String>,
) -> Result<Vec<Entity>> {
    let client = settings.aws.elb_client();
    let mut entities = Vec::new();

    for chunk in arns.chunks(DESCRIBE_TAGS_BATCH) {
        let described = client
            .describe_tags()
            .set_resource_arns(Some(chunk.to_vec()))
            .send()
            .await
            .context("describing ELBv2 tags")?;
        for description in described.tag_descriptions() {
            let Some(arn) = description.resource_arn() else {
                continue;
            };
            entities.push(
                Entity::new(kind, vec![arn.to_string()])
                    .with_tags(elb_tags(description.tags())),
            );
        }
    }

    Ok(entities)
}
