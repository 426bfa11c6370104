//! EC2 network ACLs
//!
//! Discovered through the VPC; only non-default ACLs are deletable, and
//! only once their subnet associations are gone.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2NetworkAcl;

#[async_trait]
impl Provider for Ec2NetworkAcl {
    fn kind(&self) -> Kind {
        super::EC2_NETWORK_ACL
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EC2_SUBNET]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [acl_id] = entity.id.as_slice() else {
            bail!("invalid network ACL id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_network_acl()
            .network_acl_id(acl_id)
            .send()
            .await
            .with_context(|| format!("deleting network ACL {acl_id}"))?;
        Ok(())
    }
}
