//! EC2 instances
//!
//! Root discovery narrows server-side to the run's tag pair and to states
//! other than terminated/shutting-down. EKS clusters must go first: a live
//! cluster fights instance termination by replacing the capacity.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::client::Waiters;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider, DEFAULT_DELETE_WAIT};
use crate::resource::{Entity, Kind};

pub struct Ec2Instance;

#[async_trait]
impl Provider for Ec2Instance {
    fn kind(&self) -> Kind {
        super::EC2_INSTANCE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EKS_CLUSTER]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [instance_id] = entity.id.as_slice() else {
            bail!("invalid EC2 instance id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();

        client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("terminating instance {instance_id}"))?;

        client
            .wait_until_instance_terminated()
            .instance_ids(instance_id)
            .wait(DEFAULT_DELETE_WAIT)
            .await
            .context("waiting for instance termination")?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.ec2_client();
        let filters = vec![
            Filter::builder()
                .name(format!("tag:{}", settings.filter.key))
                .values(&settings.filter.value)
                .build(),
            Filter::builder()
                .name("instance-state-name")
                .values("pending")
                .values("running")
                .values("stopping")
                .values("stopped")
                .build(),
        ];

        let mut entities = Vec::new();
        let mut pages = client
            .describe_instances()
            .set_filters(Some(filters))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing instances")?;
            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    if let Some(id) = instance.instance_id() {
                        entities.push(
                            Entity::new(self.kind(), vec![id.to_string()])
                                .with_tags(ec2_tags(instance.tags())),
                        );
                    }
                }
            }
        }

        Ok(entities)
    }
}
