//! IAM OpenID Connect providers (global); identified by ARN.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::aws::tags::iam_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct IamOidcProvider;

#[async_trait]
impl Provider for IamOidcProvider {
    fn kind(&self) -> Kind {
        super::IAM_OIDC_PROVIDER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [arn] = entity.id.as_slice() else {
            bail!("invalid OIDC provider id: {:?}", entity.id);
        };
        settings
            .aws
            .iam_client()
            .delete_open_id_connect_provider()
            .open_id_connect_provider_arn(arn)
            .send()
            .await
            .with_context(|| format!("deleting OIDC provider {arn}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.iam_client();
        let mut entities = Vec::new();

        let listed = client
            .list_open_id_connect_providers()
            .send()
            .await
            .context("listing OIDC providers")?;

        for provider in listed.open_id_connect_provider_list() {
            let Some(arn) = provider.arn() else {
                continue;
            };
            let mut tags = std::collections::HashMap::new();
            let mut tag_pages = client
                .list_open_id_connect_provider_tags()
                .open_id_connect_provider_arn(arn)
                .into_paginator()
                .send();
            while let Some(tag_page) = tag_pages.next().await {
                let tag_page =
                    tag_page.with_context(|| format!("listing tags for OIDC provider {arn}"))?;
                tags.extend(iam_tags(tag_page.tags()));
            }

            entities.push(Entity::new(self.kind(), vec![arn.to_string()]).with_tags(tags));
        }

        Ok(entities)
    }
}
