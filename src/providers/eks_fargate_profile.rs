//! EKS fargate profiles; id is `[cluster, profile]`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_eks::client::Waiters;

use crate::config::Settings;
use crate::provider::{Provider, DEFAULT_DELETE_WAIT};
use crate::resource::{Entity, Kind};

pub struct EksFargateProfile;

#[async_trait]
impl Provider for EksFargateProfile {
    fn kind(&self) -> Kind {
        super::EKS_FARGATE_PROFILE
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [cluster, profile] = entity.id.as_slice() else {
            bail!("invalid EKS fargate profile id: {:?}", entity.id);
        };
        let client = settings.aws.eks_client();

        client
            .delete_fargate_profile()
            .cluster_name(cluster)
            .fargate_profile_name(profile)
            .send()
            .await
            .with_context(|| format!("deleting fargate profile {profile}"))?;

        client
            .wait_until_fargate_profile_deleted()
            .cluster_name(cluster)
            .fargate_profile_name(profile)
            .wait(DEFAULT_DELETE_WAIT)
            .await
            .context("waiting for fargate profile deletion")?;

        Ok(())
    }
}
