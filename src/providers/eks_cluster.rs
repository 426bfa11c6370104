//! EKS clusters
//!
//! Clusters are listed by name; tags require a separate per-cluster call
//! against a constructed ARN. Nodegroups, fargate profiles, and pod-identity
//! associations are reported as dependents so they drain first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_eks::client::Waiters;

use crate::config::Settings;
use crate::provider::{Capabilities, Provider, DEFAULT_DELETE_WAIT};
use crate::resource::{Entity, Kind};

pub struct EksCluster;

#[async_trait]
impl Provider for EksCluster {
    fn kind(&self) -> Kind {
        super::EKS_CLUSTER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS_AND_DEPENDENTS
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [cluster] = entity.id.as_slice() else {
            bail!("invalid EKS cluster id: {:?}", entity.id);
        };
        let client = settings.aws.eks_client();

        client
            .delete_cluster()
            .name(cluster)
            .send()
            .await
            .with_context(|| format!("deleting EKS cluster {cluster}"))?;

        client
            .wait_until_cluster_deleted()
            .name(cluster)
            .wait(DEFAULT_DELETE_WAIT)
            .await
            .context("waiting for cluster deletion")?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.eks_client();
        let mut entities = Vec::new();

        let mut pages = client.list_clusters().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("listing EKS clusters")?;
            for cluster in page.clusters() {
                // tags are only reachable through the ARN
                let arn = format!(
                    "arn:{}:eks:{}:{}:cluster/{cluster}",
                    settings.partition, settings.region, settings.account
                );
                let tags = client
                    .list_tags_for_resource()
                    .resource_arn(&arn)
                    .send()
                    .await
                    .with_context(|| format!("listing tags for EKS cluster {cluster}"))?
                    .tags()
                    .cloned()
                    .unwrap_or_default();

                entities.push(
                    Entity::new(self.kind(), vec![cluster.clone()]).with_tags(tags),
                );
            }
        }

        Ok(entities)
    }

    async fn find_dependents(&self, settings: &Settings, entity: &Entity) -> Result<Vec<Entity>> {
        let [cluster] = entity.id.as_slice() else {
            bail!("invalid EKS cluster id: {:?}", entity.id);
        };
        let client = settings.aws.eks_client();
        let mut dependents = Vec::new();

        let mut profiles = client
            .list_fargate_profiles()
            .cluster_name(cluster)
            .into_paginator()
            .send();
        while let Some(page) = profiles.next().await {
            let page = page.context("listing EKS fargate profiles")?;
            for profile in page.fargate_profile_names() {
                dependents.push(Entity::new(
                    super::EKS_FARGATE_PROFILE,
                    vec![cluster.clone(), profile.clone()],
                ));
            }
        }

        let mut nodegroups = client
            .list_nodegroups()
            .cluster_name(cluster)
            .into_paginator()
            .send();
        while let Some(page) = nodegroups.next().await {
            let page = page.context("listing EKS nodegroups")?;
            for nodegroup in page.nodegroups() {
                dependents.push(Entity::new(
                    super::EKS_NODEGROUP,
                    vec![cluster.clone(), nodegroup.clone()],
                ));
            }
        }

        let mut associations = client
            .list_pod_identity_associations()
            .cluster_name(cluster)
            .into_paginator()
            .send();
        while let Some(page) = associations.next().await {
            let page = page.context("listing pod-identity associations")?;
            for assoc in page.associations() {
                if let Some(id) = assoc.association_id() {
                    dependents.push(Entity::new(
                        super::EKS_POD_IDENTITY_ASSOCIATION,
                        vec![cluster.clone(), id.to_string()],
                    ));
                }
            }
        }

        Ok(dependents)
    }
}
