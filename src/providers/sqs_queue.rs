//! SQS queues; identified by queue URL.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct SqsQueue;

#[async_trait]
impl Provider for SqsQueue {
    fn kind(&self) -> Kind {
        super::SQS_QUEUE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [url] = entity.id.as_slice() else {
            bail!("invalid SQS queue id: {:?}", entity.id);
        };
        settings
            .aws
            .sqs_client()
            .delete_queue()
            .queue_url(url)
            .send()
            .await
            .with_context(|| format!("deleting queue {url}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.sqs_client();
        let mut entities = Vec::new();

        let mut pages = client.list_queues().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing queues")?;
            for url in page.queue_urls() {
                let tags = client
                    .list_queue_tags()
                    .queue_url(url)
                    .send()
                    .await
                    .with_context(|| format!("listing tags for queue {url}"))?
                    .tags()
                    .cloned()
                    .unwrap_or_default();

                entities.push(Entity::new(self.kind(), vec![url.clone()]).with_tags(tags));
            }
        }

        Ok(entities)
    }
}
