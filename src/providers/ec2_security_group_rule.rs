//! Security-group rules; id is `[group, ingress|egress, rule-id]`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::Settings;
use crate::provider::Provider;
use crate::resource::{Entity, Kind};

pub struct Ec2SecurityGroupRule;

#[async_trait]
impl Provider for Ec2SecurityGroupRule {
    fn kind(&self) -> Kind {
        super::EC2_SECURITY_GROUP_RULE
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [group_id, direction, rule_id] = entity.id.as_slice() else {
            bail!("invalid security-group rule id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();

        match direction.as_str() {
            "egress" => {
                client
                    .revoke_security_group_egress()
                    .group_id(group_id)
                    .security_group_rule_ids(rule_id)
                    .send()
                    .await
                    .with_context(|| format!("revoking egress rule {rule_id}"))?;
            }
            "ingress" => {
                client
                    .revoke_security_group_ingress()
                    .group_id(group_id)
                    .security_group_rule_ids(rule_id)
                    .send()
                    .await
                    .with_context(|| format!("revoking ingress rule {rule_id}"))?;
            }
            other => bail!("unknown rule direction {other:?}"),
        }

        Ok(())
    }
}
