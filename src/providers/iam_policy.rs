//! Customer-managed IAM policies (global)
//!
//! Non-default versions must be deleted before the policy itself. Roles go
//! first so every attachment has already been detached.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_iam::types::PolicyScopeType;

use crate::aws::tags::iam_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct IamPolicy;

#[async_trait]
impl Provider for IamPolicy {
    fn kind(&self) -> Kind {
        super::IAM_POLICY
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::IAM_ROLE]
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [arn] = entity.id.as_slice() else {
            bail!("invalid IAM policy id: {:?}", entity.id);
        };
        let client = settings.aws.iam_client();

        let mut versions = client
            .list_policy_versions()
            .policy_arn(arn)
            .into_paginator()
            .send();
        while let Some(page) = versions.next().await {
            let page = page.with_context(|| format!("listing policy versions for {arn}"))?;
            for version in page.versions() {
                if version.is_default_version() {
                    continue;
                }
                client
                    .delete_policy_version()
                    .policy_arn(arn)
                    .set_version_id(version.version_id().map(String::from))
                    .send()
                    .await
                    .with_context(|| format!("deleting policy version for {arn}"))?;
            }
        }

        client
            .delete_policy()
            .policy_arn(arn)
            .send()
            .await
            .with_context(|| format!("deleting policy {arn}"))?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.iam_client();
        let mut entities = Vec::new();

        let mut pages = client
            .list_policies()
            .scope(PolicyScopeType::Local)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing policies")?;
            for policy in page.policies() {
                let Some(arn) = policy.arn() else {
                    continue;
                };
                let mut tags = std::collections::HashMap::new();
                let mut tag_pages = client
                    .list_policy_tags()
                    .policy_arn(arn)
                    .into_paginator()
                    .send();
                while let Some(tag_page) = tag_pages.next().await {
                    let tag_page =
                        tag_page.with_context(|| format!("listing tags for policy {arn}"))?;
                    tags.extend(iam_tags(tag_page.tags()));
                }

                entities.push(
                    Entity::new(self.kind(), vec![arn.to_string()]).with_tags(tags),
                );
            }
        }

        Ok(entities)
    }
}
