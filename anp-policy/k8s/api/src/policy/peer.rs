use crate::labels::Selector;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An in-cluster peer to allow or deny traffic from.
///
/// Exactly one field must be set. When none is set, consumers must assume an unknown option has
/// been specified and fail closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicyIngressPeer {
    /// Selects all pods within a set of namespaces. Host-networked pods are not included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NamespacedPeer>,

    /// Selects a set of pods in a set of namespaces. Host-networked pods are not included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<NamespacedPodPeer>,
}

/// A peer to allow or deny traffic to.
///
/// Exactly one field must be set. When none is set, consumers must assume an unknown option has
/// been specified and fail closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicyEgressPeer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NamespacedPeer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<NamespacedPodPeer>,

    /// Selects a set of nodes. An empty selector selects all nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Selector>,
}

/// Selects namespaces, either by label selector or relative to the subject's namespace.
///
/// Exactly one field must be set. An empty `sameLabels` or `notSameLabels` list selects nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedPeer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<Selector>,

    /// Selects namespaces that carry all of these labels with the same values as the subject's
    /// namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_labels: Option<Vec<String>>,

    /// Selects namespaces that carry all of these labels, at least one of which has a different
    /// value than in the subject's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_same_labels: Option<Vec<String>>,
}

/// Selects pods within a set of namespaces. Both fields are required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedPodPeer {
    pub namespaces: NamespacedPeer,
    pub pod_selector: Selector,
}

/// A borrowed view of the populated peer field.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub enum PeerKind<'a> {
    Namespaces(&'a NamespacedPeer),
    Pods(&'a NamespacedPodPeer),
    Nodes(&'a Selector),
}

/// A borrowed view of the populated namespace predicate.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub enum NamespacesKind<'a> {
    Selector(&'a Selector),
    SameLabels(&'a [String]),
    NotSameLabels(&'a [String]),
}

// === impl AdminNetworkPolicyIngressPeer ===

impl AdminNetworkPolicyIngressPeer {
    pub fn namespaces(namespaces: NamespacedPeer) -> Self {
        Self {
            namespaces: Some(namespaces),
            pods: None,
        }
    }

    pub fn pods(namespaces: NamespacedPeer, pod_selector: Selector) -> Self {
        Self {
            namespaces: None,
            pods: Some(NamespacedPodPeer {
                namespaces,
                pod_selector,
            }),
        }
    }

    /// Returns the populated variant, or `None` unless exactly one field is set.
    pub fn kind(&self) -> Option<PeerKind<'_>> {
        match (&self.namespaces, &self.pods) {
            (Some(ns), None) => Some(PeerKind::Namespaces(ns)),
            (None, Some(pods)) => Some(PeerKind::Pods(pods)),
            _ => None,
        }
    }
}

// === impl AdminNetworkPolicyEgressPeer ===

impl AdminNetworkPolicyEgressPeer {
    pub fn namespaces(namespaces: NamespacedPeer) -> Self {
        Self {
            namespaces: Some(namespaces),
            ..Self::default()
        }
    }

    pub fn pods(namespaces: NamespacedPeer, pod_selector: Selector) -> Self {
        Self {
            pods: Some(NamespacedPodPeer {
                namespaces,
                pod_selector,
            }),
            ..Self::default()
        }
    }

    pub fn nodes(selector: Selector) -> Self {
        Self {
            nodes: Some(selector),
            ..Self::default()
        }
    }

    /// Returns the populated variant, or `None` unless exactly one field is set.
    pub fn kind(&self) -> Option<PeerKind<'_>> {
        match (&self.namespaces, &self.pods, &self.nodes) {
            (Some(ns), None, None) => Some(PeerKind::Namespaces(ns)),
            (None, Some(pods), None) => Some(PeerKind::Pods(pods)),
            (None, None, Some(nodes)) => Some(PeerKind::Nodes(nodes)),
            _ => None,
        }
    }
}

// === impl NamespacedPeer ===

impl NamespacedPeer {
    pub fn selector(selector: Selector) -> Self {
        Self {
            namespace_selector: Some(selector),
            ..Self::default()
        }
    }

    pub fn same_labels<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            same_labels: Some(keys.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn not_same_labels<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            not_same_labels: Some(keys.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Returns the populated predicate, or `None` unless exactly one field is set.
    pub fn kind(&self) -> Option<NamespacesKind<'_>> {
        match (
            &self.namespace_selector,
            &self.same_labels,
            &self.not_same_labels,
        ) {
            (Some(sel), None, None) => Some(NamespacesKind::Selector(sel)),
            (None, Some(keys), None) => Some(NamespacesKind::SameLabels(keys)),
            (None, None, Some(keys)) => Some(NamespacesKind::NotSameLabels(keys)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_presence_selects_kind() {
        let peer = serde_json::from_value::<NamespacedPeer>(serde_json::json!({
            "sameLabels": [],
        }))
        .unwrap();
        assert!(
            matches!(peer.kind(), Some(NamespacesKind::SameLabels(keys)) if keys.is_empty()),
            "an empty list is still a populated field"
        );

        let peer = serde_json::from_value::<NamespacedPeer>(serde_json::json!({})).unwrap();
        assert!(peer.kind().is_none(), "no fields set");

        let peer = serde_json::from_value::<NamespacedPeer>(serde_json::json!({
            "namespaceSelector": {},
            "notSameLabels": ["team"],
        }))
        .unwrap();
        assert!(peer.kind().is_none(), "two fields set");
    }

    #[test]
    fn unknown_peer_fields_are_unset() {
        let peer = serde_json::from_value::<AdminNetworkPolicyEgressPeer>(serde_json::json!({
            "networks": ["10.0.0.0/8"],
        }))
        .unwrap();
        assert!(peer.kind().is_none());
    }

    #[test]
    fn egress_peer_kind() {
        assert!(matches!(
            AdminNetworkPolicyEgressPeer::nodes(Selector::default()).kind(),
            Some(PeerKind::Nodes(_))
        ));
        let pods = AdminNetworkPolicyEgressPeer::pods(
            NamespacedPeer::same_labels(["team"]),
            Selector::default(),
        );
        assert!(matches!(pods.kind(), Some(PeerKind::Pods(_))));

        let both = AdminNetworkPolicyEgressPeer {
            nodes: Some(Selector::default()),
            ..pods
        };
        assert!(both.kind().is_none());
    }

    #[test]
    fn serializes_only_populated_fields() {
        let peer = AdminNetworkPolicyIngressPeer::namespaces(NamespacedPeer::not_same_labels([
            "team",
        ]));
        assert_eq!(
            serde_json::to_value(&peer).unwrap(),
            serde_json::json!({ "namespaces": { "notSameLabels": ["team"] } })
        );
    }
}
