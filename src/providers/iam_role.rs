//! IAM roles (global)
//!
//! A role drags extra state along: inline policies must be deleted and
//! managed policies detached before DeleteRole succeeds. Instance profiles
//! holding the role are reported as dependents.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::aws::tags::iam_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct IamRole;

#[async_trait]
impl Provider for IamRole {
    fn kind(&self) -> Kind {
        super::IAM_ROLE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS_AND_DEPENDENTS
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [role] = entity.id.as_slice() else {
            bail!("invalid IAM role id: {:?}", entity.id);
        };
        let client = settings.aws.iam_client();

        // inline policies
        let mut inline = client
            .list_role_policies()
            .role_name(role)
            .into_paginator()
            .send();
        while let Some(page) = inline.next().await {
            let page = page.context("listing role policies")?;
            for policy in page.policy_names() {
                client
                    .delete_role_policy()
                    .role_name(role)
                    .policy_name(policy)
                    .send()
                    .await
                    .with_context(|| format!("deleting role policy {policy}"))?;
            }
        }

        // managed policies
        let mut attached = client
            .list_attached_role_policies()
            .role_name(role)
            .into_paginator()
            .send();
        while let Some(page) = attached.next().await {
            let page = page.context("listing attached role policies")?;
            for policy in page.attached_policies() {
                let Some(arn) = policy.policy_arn() else {
                    continue;
                };
                client
                    .detach_role_policy()
                    .role_name(role)
                    .policy_arn(arn)
                    .send()
                    .await
                    .with_context(|| format!("detaching role policy {arn}"))?;
            }
        }

        client
            .delete_role()
            .role_name(role)
            .send()
            .await
            .with_context(|| format!("deleting role {role}"))?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.iam_client();
        let mut entities = Vec::new();

        let mut pages = client.list_roles().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing roles")?;
            for role in page.roles() {
                let name = role.role_name();
                // ListRoles omits tags; fetch them per role
                let mut tags = std::collections::HashMap::new();
                let mut tag_pages = client
                    .list_role_tags()
                    .role_name(name)
                    .into_paginator()
                    .send();
                while let Some(tag_page) = tag_pages.next().await {
                    let tag_page = tag_page
                        .with_context(|| format!("listing tags for role {name}"))?;
                    tags.extend(iam_tags(tag_page.tags()));
                }

                entities.push(
                    Entity::new(self.kind(), vec![name.to_string()]).with_tags(tags),
                );
            }
        }

        Ok(entities)
    }

    async fn find_dependents(&self, settings: &Settings, entity: &Entity) -> Result<Vec<Entity>> {
        let [role] = entity.id.as_slice() else {
            bail!("invalid IAM role id: {:?}", entity.id);
        };
        let client = settings.aws.iam_client();
        let mut dependents = Vec::new();

        let mut pages = client
            .list_instance_profiles_for_role()
            .role_name(role)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page
                .with_context(|| format!("listing instance profiles for role {role}"))?;
            for profile in page.instance_profiles() {
                dependents.push(Entity::new(
                    super::IAM_INSTANCE_PROFILE,
                    vec![profile.instance_profile_name().to_string()],
                ));
            }
        }

        Ok(dependents)
    }
}
