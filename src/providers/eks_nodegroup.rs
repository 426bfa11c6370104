//! EKS nodegroups
//!
//! Discovered as cluster dependents; id is `[cluster, nodegroup]`.
//! Nodegroup teardown drains instances and routinely outlives the default
//! wait, so this kind uses a longer waiter timeout.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_eks::client::Waiters;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

const NODEGROUP_DELETE_WAIT: Duration = Duration::from_secs(15 * 60);

pub struct EksNodegroup;

#[async_trait]
impl Provider for EksNodegroup {
    fn kind(&self) -> Kind {
        super::EKS_NODEGROUP
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [cluster, nodegroup] = entity.id.as_slice() else {
            bail!("invalid EKS nodegroup id: {:?}", entity.id);
        };
        let client = settings.aws.eks_client();

        client
            .delete_nodegroup()
            .cluster_name(cluster)
            .nodegroup_name(nodegroup)
            .send()
            .await
            .with_context(|| format!("deleting EKS nodegroup {nodegroup}"))?;

        client
            .wait_until_nodegroup_deleted()
            .cluster_name(cluster)
            .nodegroup_name(nodegroup)
            .wait(NODEGROUP_DELETE_WAIT)
            .await
            .context("waiting for nodegroup deletion")?;

        Ok(())
    }
}
