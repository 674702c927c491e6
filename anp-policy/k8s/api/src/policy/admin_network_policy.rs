use super::{
    AdminNetworkPolicyEgressPeer, AdminNetworkPolicyIngressPeer, AdminNetworkPolicyPort,
    AdminNetworkPolicySubject,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A cluster-scoped network policy that takes precedence over namespaced network policies.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "policy.networking.k8s.io",
    version = "v1alpha1",
    kind = "AdminNetworkPolicy",
    shortname = "anp"
)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicySpec {
    /// Must be in `[0, 1000]`. Lower values take precedence.
    pub priority: i32,

    pub subject: AdminNetworkPolicySubject,

    /// Rules are evaluated in order; the first matching rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<Vec<AdminNetworkPolicyIngressRule>>,

    /// Rules are evaluated in order; the first matching rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress: Option<Vec<AdminNetworkPolicyEgressRule>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicyIngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub action: AdminNetworkPolicyRuleAction,

    pub from: Vec<AdminNetworkPolicyIngressPeer>,

    /// When unset, all ports match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<AdminNetworkPolicyPort>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicyEgressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub action: AdminNetworkPolicyRuleAction,

    pub to: Vec<AdminNetworkPolicyEgressPeer>,

    /// When unset, all ports match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<AdminNetworkPolicyPort>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum AdminNetworkPolicyRuleAction {
    Allow,
    Deny,
    /// Delegates the decision to lower-precedence policy.
    Pass,
}

impl std::fmt::Display for AdminNetworkPolicyRuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
            Self::Pass => f.write_str("Pass"),
        }
    }
}
