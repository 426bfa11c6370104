//! EC2 security groups
//!
//! A group cannot go until everything referencing it is gone, hence the
//! static dependencies on instances, load balancers, and EKS clusters. Its
//! rules are reported as dependents so cross-group references drop first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2SecurityGroup;

#[async_trait]
impl Provider for Ec2SecurityGroup {
    fn kind(&self) -> Kind {
        super::EC2_SECURITY_GROUP
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS_AND_DEPENDENTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![
            super::EC2_INSTANCE,
            super::ELB_LOAD_BALANCER,
            super::EKS_CLUSTER,
        ]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [group_id] = entity.id.as_slice() else {
            bail!("invalid security group id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_security_group()
            .group_id(group_id)
            .send()
            .await
            .with_context(|| format!("deleting security group {group_id}"))?;
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
            .describe_security_groups()
            .filters(filter)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing security groups")?;
            for group in page.security_groups() {
                if let Some(id) = group.group_id() {
                    entities.push(
                        Entity::new(self.kind(), vec![id.to_string()])
                            .with_tags(ec2_tags(group.tags())),
                    );
                }
            }
        }

        Ok(entities)
    }

    async fn find_dependents(&self, settings: &Settings, entity: &Entity) -> Result<Vec<Entity>> {
        let [group_id] = entity.id.as_slice() else {
            bail!("invalid security group id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();

        let rules = client
            .describe_security_group_rules()
            .filters(
                Filter::builder()
                    .name("group-id")
                    .values(group_id)
                    .build(),
            )
            .send()
            .await
            .context("describing security-group rules")?;

        let mut dependents = Vec::new();
        for rule in rules.security_group_rules() {
            let Some(rule_id) = rule.security_group_rule_id() else {
                continue;
            };
            let direction = if rule.is_egress().unwrap_or(false) {
                "egress"
            } else {
                "ingress"
            };
            dependents.push(Entity::new(
                super::EC2_SECURITY_GROUP_RULE,
                vec![group_id.clone(), direction.to_string(), rule_id.to_string()],
            ));
        }

        Ok(dependents)
    }
}
