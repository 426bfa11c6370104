//! IAM instance profiles (global); discovered as role dependents.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct IamInstanceProfile;

#[async_trait]
impl Provider for IamInstanceProfile {
    fn kind(&self) -> Kind {
        super::IAM_INSTANCE_PROFILE
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [profile] = entity.id.as_slice() else {
            bail!("invalid instance profile id: {:?}", entity.id);
        };
        let client = settings.aws.iam_client();

        // roles must be removed from the profile before deletion
        let current = client
            .get_instance_profile()
            .instance_profile_name(profile)
            .send()
            .await
            .with_context(|| format!("getting instance profile {profile}"))?;

        if let Some(instance_profile) = current.instance_profile() {
            for role in instance_profile.roles() {
                client
                    .remove_role_from_instance_profile()
                    .instance_profile_name(profile)
                    .role_name(role.role_name())
                    .send()
                    .await
                    .context("removing role from instance profile")?;
            }
        }

        client
            .delete_instance_profile()
            .instance_profile_name(profile)
            .send()
            .await
            .with_context(|| format!("deleting instance profile {profile}"))?;

        Ok(())
    }
}
