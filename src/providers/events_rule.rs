//! EventBridge rules
//!
//! A rule refuses deletion while it still has targets, so those are
//! removed first. ListRules has no paginator in the SDK, hence the manual
//! token loop.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::aws::tags::events_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct EventsRule;

#[async_trait]
impl Provider for EventsRule {
    fn kind(&self) -> Kind {
        super::EVENTS_RULE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [rule_name] = entity.id.as_slice() else {
            bail!("invalid EventBridge rule id: {:?}", entity.id);
        };
        let client = settings.aws.events_client();

        let targets = client
            .list_targets_by_rule()
            .rule(rule_name)
            .send()
            .await
            .with_context(|| format!("listing targets of rule {rule_name}"))?;
        for target in targets.targets() {
            client
                .remove_targets()
                .rule(rule_name)
                .ids(target.id())
                .send()
                .await
                .with_context(|| format!("removing target {} of rule {rule_name}", target.id()))?;
        }

        client
            .delete_rule()
            .name(rule_name)
            .send()
            .await
            .with_context(|| format!("deleting rule {rule_name}"))?;

        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.events_client();
        let mut entities = Vec::new();

        let mut next_token: Option<String> = None;
        loop {
            let page = client
                .list_rules()
                .set_next_token(next_token.take())
                .send()
                .await
                .context("listing rules")?;

            for rule in page.rules() {
                let Some(name) = rule.name() else {
                    continue;
                };
                let tags = match rule.arn() {
                    Some(arn) => {
                        let listed = client
                            .list_tags_for_resource()
                            .resource_arn(arn)
                            .send()
                            .await
                            .with_context(|| format!("listing tags for rule {name}"))?;
                        events_tags(listed.tags())
                    }
                    None => Default::default(),
                };
                entities.push(Entity::new(self.kind(), vec![name.to_string()]).with_tags(tags));
            }

            next_token = page.next_token().map(String::from);
            if next_token.is_none() {
                break;
            }
        }

        Ok(entities)
    }
}
