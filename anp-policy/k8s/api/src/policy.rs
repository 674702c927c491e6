pub mod admin_network_policy;
pub mod peer;
pub mod port;
pub mod subject;

pub use self::{
    admin_network_policy::{
        AdminNetworkPolicy, AdminNetworkPolicyEgressRule, AdminNetworkPolicyIngressRule,
        AdminNetworkPolicyRuleAction, AdminNetworkPolicySpec,
    },
    peer::{
        AdminNetworkPolicyEgressPeer, AdminNetworkPolicyIngressPeer, NamespacedPeer,
        NamespacedPodPeer, NamespacesKind, PeerKind,
    },
    port::{AdminNetworkPolicyPort, Port, PortKind, PortRange, Protocol, ProtocolParseError},
    subject::{AdminNetworkPolicySubject, NamespacedPodSubject, SubjectKind},
};
