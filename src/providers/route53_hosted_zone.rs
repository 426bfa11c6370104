//! Route53 hosted zones
//!
//! Zones are a partition-wide namespace, so the provider is global. A zone
//! only deletes once every record set except its SOA and apex NS records
//! is gone; those are removed in change batches of up to 1000 first. The
//! entity id carries both the zone id and the zone name because record
//! deletion needs the apex name.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecordSet, RrType, TagResourceType,
};

use crate::aws::tags::route53_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

/// Route53 caps a change batch at 1000 changes.
const MAX_CHANGE_BATCH: usize = 1000;

pub struct Route53HostedZone;

#[async_trait]
impl Provider for Route53HostedZone {
    fn kind(&self) -> Kind {
        super::ROUTE53_HOSTED_ZONE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [zone_id, zone_name] = entity.id.as_slice() else {
            bail!("invalid hosted zone id: {:?}", entity.id);
        };
        let client = settings.aws.route53_client();

        let mut changes = Vec::new();
        let mut pages = client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing record sets")?;
            for record in page.resource_record_sets() {
                // the SOA and apex NS records go down with the zone itself
                if *record.r#type() == RrType::Soa {
                    continue;
                }
                if *record.r#type() == RrType::Ns && record.name() == zone_name {
                    continue;
                }

                let record_set = ResourceRecordSet::builder()
                    .name(record.name())
                    .r#type(record.r#type().clone())
                    .set_ttl(record.ttl())
                    .set_resource_records(
                        (!record.resource_records().is_empty())
                            .then(|| record.resource_records().to_vec()),
                    )
                    .set_alias_target(record.alias_target().cloned())
                    .build()
                    .context("building record-set change")?;
                changes.push(
                    Change::builder()
                        .action(ChangeAction::Delete)
                        .resource_record_set(record_set)
                        .build()
                        .context("building record-set change")?,
                );

                if changes.len() == MAX_CHANGE_BATCH {
                    apply_changes(&client, zone_id, std::mem::take(&mut changes)).await?;
                }
            }
        }
        if !changes.is_empty() {
            apply_changes(&client, zone_id, changes).await?;
        }

        client
            .delete_hosted_zone()
            .id(zone_id)
            .send()
            .await
            .with_context(|| format!("deleting hosted zone {zone_id}"))?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.route53_client();
        let mut entities = Vec::new();

        let mut pages = client.list_hosted_zones().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing hosted zones")?;
            for zone in page.hosted_zones() {
                // the API reports ids as /hostedzone/<id> but takes bare ids
                let id = zone.id().strip_prefix("/hostedzone/").unwrap_or(zone.id());

                let listed = client
                    .list_tags_for_resource()
                    .resource_type(TagResourceType::Hostedzone)
                    .resource_id(id)
                    .send()
                    .await
                    .with_context(|| format!("listing tags for zone {id}"))?;
                let tags = listed
                    .resource_tag_set()
                    .map(|set| route53_tags(set.tags()))
                    .unwrap_or_default();

                entities.push(
                    Entity::new(self.kind(), vec![id.to_string(), zone.name().to_string()])
                        .with_tags(tags),
                );
            }
        }

        Ok(entities)
    }
}

async fn apply_changes(
    client: &aws_sdk_route53::Client,
    zone_id: &str,
    changes: Vec<Change>,
) -> Result<()> {
    let batch = ChangeBatch::builder()
        .set_changes(Some(changes))
        .build()
        .context("building change batch")?;
    client
        .change_resource_record_sets()
        .hosted_zone_id(zone_id)
        .change_batch(batch)
        .send()
        .await
        .with_context(|| format!("updating record sets of zone {zone_id}"))?;
    Ok(())
}
