//! EKS pod-identity associations; id is `[cluster, association-id]`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct EksPodIdentityAssociation;

#[async_trait]
impl Provider for EksPodIdentityAssociation {
    fn kind(&self) -> Kind {
        super::EKS_POD_IDENTITY_ASSOCIATION
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [cluster, association] = entity.id.as_slice() else {
            bail!("invalid pod-identity association id: {:?}", entity.id);
        };
        settings
            .aws
            .eks_client()
            .delete_pod_identity_association()
            .cluster_name(cluster)
            .association_id(association)
            .send()
            .await
            .with_context(|| format!("deleting pod-identity association {association}"))?;
        Ok(())
    }
}
