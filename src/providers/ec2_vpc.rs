//! EC2 VPCs
//!
//! The VPC is the hub of the networking web. Everything living inside it
//! is reported as a dependent so the VPC itself goes last; the deletion
//! checklist in the VPC user guide drives the discovery list. Internet
//! gateways detach from the VPC during their own deletion, hence the
//! static edge.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;

use crate::aws::tags::ec2_tags;
use crate::config::Settings;
use crate::provider::{Capabilities, Provider};
use crate::resource::{Entity, Kind};

pub struct Ec2Vpc;

fn vpc_filter(vpc_id: &str) -> Filter {
    Filter::builder().name("vpc-id").values(vpc_id).build()
}

#[async_trait]
impl Provider for Ec2Vpc {
    fn kind(&self) -> Kind {
        super::EC2_VPC
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ROOTS_AND_DEPENDENTS
    }

    fn static_dependencies(&self) -> Vec<Kind> {
        vec![super::EKS_CLUSTER, super::EC2_INTERNET_GATEWAY]
    }

    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()> {
        let [vpc_id] = entity.id.as_slice() else {
            bail!("invalid VPC id: {:?}", entity.id);
        };
        settings
            .aws
            .ec2_client()
            .delete_vpc()
            .vpc_id(vpc_id)
            .send()
            .await
            .with_context(|| format!("deleting VPC {vpc_id}"))?;
        Ok(())
    }

    async fn find_roots(&self, settings: &Settings) -> Result<Vec<Entity>> {
        let client = settings.aws.ec2_client();
        let filter = Filter::builder()
            .name(format!("tag:{}", settings.filter.key))
            .values(&settings.filter.value)
            .build();

        let mut entities = Vec::new();
        let mut pages = client
            .describe_vpcs()
            .filters(filter)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing VPCs")?;
            for vpc in page.vpcs() {
                if let Some(id) = vpc.vpc_id() {
                    entities.push(
                        Entity::new(self.kind(), vec![id.to_string()])
                            .with_tags(ec2_tags(vpc.tags())),
                    );
                }
            }
        }

        Ok(entities)
    }

    async fn find_dependents(&self, settings: &Settings, entity: &Entity) -> Result<Vec<Entity>> {
        let [vpc_id] = entity.id.as_slice() else {
            bail!("invalid VPC id: {:?}", entity.id);
        };
        let client = settings.aws.ec2_client();
        let mut dependents = Vec::new();

        // instances, minus the ones an AWS service operator manages
        let mut pages = client
            .describe_instances()
            .filters(vpc_filter(vpc_id))
            .filters(
                Filter::builder()
                    .name("operator.managed")
                    .values("false")
                    .build(),
            )
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing instances")?;
            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    if let Some(id) = instance.instance_id() {
                        dependents.push(Entity::new(super::EC2_INSTANCE, vec![id.to_string()]));
                    }
                }
            }
        }

        // NAT gateways
        let mut pages = client
            .describe_nat_gateways()
            .filter(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing NAT gateways")?;
            for gateway in page.nat_gateways() {
                if let Some(id) = gateway.nat_gateway_id() {
                    dependents.push(Entity::new(super::EC2_NAT_GATEWAY, vec![id.to_string()]));
                }
            }
        }

        // subnets, minus the per-AZ defaults
        let mut pages = client
            .describe_subnets()
            .filters(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing subnets")?;
            for subnet in page.subnets() {
                if subnet.default_for_az().unwrap_or(false) {
                    continue;
                }
                if let Some(id) = subnet.subnet_id() {
                    dependents.push(Entity::new(super::EC2_SUBNET, vec![id.to_string()]));
                }
            }
        }

        // security groups, minus the undeletable default group
        let mut pages = client
            .describe_security_groups()
            .filters(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing security groups")?;
            for group in page.security_groups() {
                if group.group_name() == Some("default") {
                    continue;
                }
                if let Some(id) = group.group_id() {
                    dependents.push(Entity::new(super::EC2_SECURITY_GROUP, vec![id.to_string()]));
                }
            }
        }

        // network ACLs, minus the default one
        let mut pages = client
            .describe_network_acls()
            .filters(vpc_filter(vpc_id))
            .filters(Filter::builder().name("default").values("false").build())
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing network ACLs")?;
            for acl in page.network_acls() {
                if let Some(id) = acl.network_acl_id() {
                    dependents.push(Entity::new(super::EC2_NETWORK_ACL, vec![id.to_string()]));
                }
            }
        }

        // route tables, minus the main one
        let mut pages = client
            .describe_route_tables()
            .filters(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing route tables")?;
            for table in page.route_tables() {
                let is_main = table
                    .associations()
                    .iter()
                    .any(|assoc| assoc.main().unwrap_or(false));
                if is_main {
                    continue;
                }
                if let Some(id) = table.route_table_id() {
                    dependents.push(Entity::new(super::EC2_ROUTE_TABLE, vec![id.to_string()]));
                }
            }
        }

        // egress-only internet gateways
        let mut pages = client
            .describe_egress_only_internet_gateways()
            .filters(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing egress-only internet gateways")?;
            for gateway in page.egress_only_internet_gateways() {
                if let Some(id) = gateway.egress_only_internet_gateway_id() {
                    dependents.push(Entity::new(
                        super::EC2_EGRESS_ONLY_INTERNET_GATEWAY,
                        vec![id.to_string()],
                    ));
                }
            }
        }

        // VPC endpoints
        let mut pages = client
            .describe_vpc_endpoints()
            .filters(vpc_filter(vpc_id))
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing VPC endpoints")?;
            for endpoint in page.vpc_endpoints() {
                if let Some(id) = endpoint.vpc_endpoint_id() {
                    dependents.push(Entity::new(super::EC2_VPC_ENDPOINT, vec![id.to_string()]));
                }
            }
        }

        // v2 load balancers have no vpc-id filter, so describe all and match
        let elb = settings.aws.elb_client();
        let mut pages = elb.describe_load_balancers().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing load balancers")?;
            for lb in page.load_balancers() {
                if lb.vpc_id() != Some(vpc_id.as_str()) {
                    continue;
                }
                if let Some(arn) = lb.load_balancer_arn() {
                    dependents.push(Entity::new(super::ELB_LOAD_BALANCER, vec![arn.to_string()]));
                }
            }
        }

        let mut pages = elb.describe_target_groups().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("describing target groups")?;
            for group in page.target_groups() {
                if group.vpc_id() != Some(vpc_id.as_str()) {
                    continue;
                }
                if let Some(arn) = group.target_group_arn() {
                    dependents.push(Entity::new(super::ELB_TARGET_GROUP, vec![arn.to_string()]));
                }
            }
        }

        Ok(dependents)
    }
}
