//! Concrete AWS resource providers
//!
//! One module per resource kind. The kind set is closed: every static
//! dependency a provider declares references another kind in this list, so
//! [`all_providers`] always yields a registry the graph builder accepts.

use std::sync::Arc;

use crate::provider::Provider;
use crate::resource::Kind;

pub mod ec2_egress_only_internet_gateway;
pub mod ec2_eip;
pub mod ec2_instance;
pub mod ec2_internet_gateway;
pub mod ec2_launch_template;
pub mod ec2_nat_gateway;
pub mod ec2_network_acl;
pub mod ec2_route_table;
pub mod ec2_security_group;
pub mod ec2_security_group_rule;
pub mod ec2_subnet;
pub mod ec2_volume;
pub mod ec2_vpc;
pub mod ec2_vpc_endpoint;
pub mod eks_cluster;
pub mod eks_fargate_profile;
pub mod eks_nodegroup;
pub mod eks_pod_identity_association;
pub mod elb_load_balancer;
pub mod elb_target_group;
pub mod events_rule;
pub mod iam_instance_profile;
pub mod iam_oidc_provider;
pub mod iam_policy;
pub mod iam_role;
pub mod logs_log_group;
pub mod route53_hosted_zone;
pub mod sqs_queue;

pub const EKS_CLUSTER: Kind = Kind::new("AWS::EKS::Cluster");
pub const EKS_NODEGROUP: Kind = Kind::new("AWS::EKS::Nodegroup");
pub const EKS_FARGATE_PROFILE: Kind = Kind::new("AWS::EKS::FargateProfile");
pub const EKS_POD_IDENTITY_ASSOCIATION: Kind = Kind::new("AWS::EKS::PodIdentityAssociation");
pub const EC2_INSTANCE: Kind = Kind::new("AWS::EC2::Instance");
pub const EC2_SECURITY_GROUP: Kind = Kind::new("AWS::EC2::SecurityGroup");
pub const EC2_SECURITY_GROUP_RULE: Kind = Kind::new("AWS::EC2::SecurityGroupRule");
pub const EC2_VPC: Kind = Kind::new("AWS::EC2::VPC");
pub const EC2_SUBNET: Kind = Kind::new("AWS::EC2::Subnet");
pub const EC2_ROUTE_TABLE: Kind = Kind::new("AWS::EC2::RouteTable");
pub const EC2_INTERNET_GATEWAY: Kind = Kind::new("AWS::EC2::InternetGateway");
pub const EC2_EGRESS_ONLY_INTERNET_GATEWAY: Kind =
    Kind::new("AWS::EC2::EgressOnlyInternetGateway");
pub const EC2_NETWORK_ACL: Kind = Kind::new("AWS::EC2::NetworkAcl");
pub const EC2_VPC_ENDPOINT: Kind = Kind::new("AWS::EC2::VPCEndpoint");
pub const EC2_NAT_GATEWAY: Kind = Kind::new("AWS::EC2::NatGateway");
pub const EC2_EIP: Kind = Kind::new("AWS::EC2::EIP");
pub const EC2_VOLUME: Kind = Kind::new("AWS::EC2::Volume");
pub const EC2_LAUNCH_TEMPLATE: Kind = Kind::new("AWS::EC2::LaunchTemplate");
pub const ELB_LOAD_BALANCER: Kind = Kind::new("AWS::ElasticLoadBalancingV2::LoadBalancer");
pub const ELB_TARGET_GROUP: Kind = Kind::new("AWS::ElasticLoadBalancingV2::TargetGroup");
pub const IAM_ROLE: Kind = Kind::new("AWS::IAM::Role");
pub const IAM_INSTANCE_PROFILE: Kind = Kind::new("AWS::IAM::InstanceProfile");
pub const IAM_POLICY: Kind = Kind::new("AWS::IAM::Policy");
pub const IAM_OIDC_PROVIDER: Kind = Kind::new("AWS::IAM::OIDCProvider");
pub const LOGS_LOG_GROUP: Kind = Kind::new("AWS::Logs::LogGroup");
pub const SQS_QUEUE: Kind = Kind::new("AWS::SQS::Queue");
pub const EVENTS_RULE: Kind = Kind::new("AWS::Events::Rule");
pub const ROUTE53_HOSTED_ZONE: Kind = Kind::new("AWS::Route53::HostedZone");

/// Every provider this tool knows about, in registration order.
pub fn all_providers() -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(eks_cluster::EksCluster),
        Arc::new(eks_nodegroup::EksNodegroup),
        Arc::new(eks_fargate_profile::EksFargateProfile),
        Arc::new(eks_pod_identity_association::EksPodIdentityAssociation),
        Arc::new(ec2_instance::Ec2Instance),
        Arc::new(ec2_security_group::Ec2SecurityGroup),
        Arc::new(ec2_security_group_rule::Ec2SecurityGroupRule),
        Arc::new(ec2_vpc::Ec2Vpc),
        Arc::new(ec2_subnet::Ec2Subnet),
        Arc::new(ec2_route_table::Ec2RouteTable),
        Arc::new(ec2_internet_gateway::Ec2InternetGateway),
        Arc::new(ec2_egress_only_internet_gateway::Ec2EgressOnlyInternetGateway),
        Arc::new(ec2_network_acl::Ec2NetworkAcl),
        Arc::new(ec2_vpc_endpoint::Ec2VpcEndpoint),
        Arc::new(ec2_nat_gateway::Ec2NatGateway),
        Arc::new(ec2_eip::Ec2Eip),
        Arc::new(ec2_volume::Ec2Volume),
        Arc::new(ec2_launch_template::Ec2LaunchTemplate),
        Arc::new(elb_load_balancer::ElbLoadBalancer),
        Arc::new(elb_target_group::ElbTargetGroup),
        Arc::new(iam_role::IamRole),
        Arc::new(iam_instance_profile::IamInstanceProfile),
        Arc::new(iam_policy::IamPolicy),
        Arc::new(iam_oidc_provider::IamOidcProvider),
        Arc::new(logs_log_group::LogsLogGroup),
        Arc::new(sqs_queue::SqsQueue),
        Arc::new(events_rule::EventsRule),
        Arc::new(route53_hosted_zone::Route53HostedZone),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderRegistry;
    use crate::schedule::KindGraph;

    #[test]
    fn registry_builds_from_the_full_provider_set() {
        let registry = ProviderRegistry::new(all_providers()).unwrap();
        assert_eq!(registry.len(), 28);
    }

    #[test]
    fn static_dependencies_reference_registered_kinds() {
        let registry = ProviderRegistry::new(all_providers()).unwrap();
        for registered in registry.iter() {
            for &dep in &registered.static_deps {
                assert!(
                    registry.contains(dep),
                    "{} depends on unregistered kind {dep}",
                    registered.kind()
                );
            }
        }
    }

    #[test]
    fn static_dependencies_form_an_acyclic_graph() {
        let registry = ProviderRegistry::new(all_providers()).unwrap();
        let mut graph = KindGraph::new();
        for kind in registry.kinds() {
            graph.add_kind(kind);
        }
        for registered in registry.iter() {
            for &dep in &registered.static_deps {
                graph
                    .add_edge(dep, registered.kind())
                    .unwrap_or_else(|e| panic!("{} -> {}: {e}", dep, registered.kind()));
            }
        }
        graph.ensure_acyclic().unwrap();
    }

    #[test]
    fn global_kinds_are_the_partition_wide_ones() {
        let registry = ProviderRegistry::new(all_providers()).unwrap();
        let globals: Vec<_> = registry
            .iter()
            .filter(|r| r.global)
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            globals,
            vec![
                IAM_ROLE,
                IAM_INSTANCE_PROFILE,
                IAM_POLICY,
                IAM_OIDC_PROVIDER,
                ROUTE53_HOSTED_ZONE,
            ]
        );
    }
}
