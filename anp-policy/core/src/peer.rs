use crate::{
    k8s::{
        policy::{AdminNetworkPolicyEgressPeer, AdminNetworkPolicyIngressPeer, PeerKind},
        Labels,
    },
    namespaces, Endpoint, UnknownKind,
};

/// Matches rule peers against the far side of a connection.
pub trait MatchPeer {
    /// Checks whether `endpoint` is selected by this peer.
    ///
    /// `subject_namespace` holds the labels of the policy subject's namespace, which anchors
    /// `sameLabels`/`notSameLabels` comparisons.
    fn matches(
        &self,
        endpoint: Endpoint<'_>,
        subject_namespace: &Labels,
    ) -> Result<bool, UnknownKind>;
}

impl MatchPeer for AdminNetworkPolicyIngressPeer {
    fn matches(
        &self,
        endpoint: Endpoint<'_>,
        subject_namespace: &Labels,
    ) -> Result<bool, UnknownKind> {
        match_kind(self.kind(), endpoint, subject_namespace)
    }
}

impl MatchPeer for AdminNetworkPolicyEgressPeer {
    fn matches(
        &self,
        endpoint: Endpoint<'_>,
        subject_namespace: &Labels,
    ) -> Result<bool, UnknownKind> {
        match_kind(self.kind(), endpoint, subject_namespace)
    }
}

fn match_kind(
    kind: Option<PeerKind<'_>>,
    endpoint: Endpoint<'_>,
    subject_namespace: &Labels,
) -> Result<bool, UnknownKind> {
    match kind {
        Some(PeerKind::Namespaces(peer)) => {
            // Validate the namespace predicate even if the endpoint is a node.
            let Endpoint::Pod { namespace, .. } = endpoint else {
                peer.kind().ok_or(UnknownKind::Peer)?;
                return Ok(false);
            };
            namespaces::matches(peer, namespace, subject_namespace)
        }

        Some(PeerKind::Pods(peer)) => {
            let Endpoint::Pod { labels, namespace } = endpoint else {
                peer.namespaces.kind().ok_or(UnknownKind::Peer)?;
                return Ok(false);
            };
            Ok(namespaces::matches(&peer.namespaces, namespace, subject_namespace)?
                && peer.pod_selector.matches(labels))
        }

        Some(PeerKind::Nodes(selector)) => match endpoint {
            Endpoint::Node { labels } => Ok(selector.matches(labels)),
            Endpoint::Pod { .. } => Ok(false),
        },

        _ => Err(UnknownKind::Peer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::{policy::NamespacedPeer, Selector};
    use std::iter::FromIterator;

    struct Cluster {
        subject_ns: Labels,
        same_team_ns: Labels,
        other_team_ns: Labels,
        db: Labels,
        web: Labels,
        node: Labels,
    }

    impl Default for Cluster {
        fn default() -> Self {
            Self {
                subject_ns: Labels::from_iter(vec![("team", "a"), ("env", "prod")]),
                same_team_ns: Labels::from_iter(vec![("team", "a"), ("env", "dev")]),
                other_team_ns: Labels::from_iter(vec![("team", "b"), ("env", "prod")]),
                db: Labels::from_iter(Some(("app", "db"))),
                web: Labels::from_iter(Some(("app", "web"))),
                node: Labels::from_iter(Some(("kubernetes.io/os", "linux"))),
            }
        }
    }

    impl Cluster {
        fn pod<'a>(&'a self, labels: &'a Labels, namespace: &'a Labels) -> Endpoint<'a> {
            Endpoint::Pod { labels, namespace }
        }

        fn node(&self) -> Endpoint<'_> {
            Endpoint::Node { labels: &self.node }
        }
    }

    #[test]
    fn namespaces_peer() {
        let c = Cluster::default();
        let peer =
            AdminNetworkPolicyIngressPeer::namespaces(NamespacedPeer::same_labels(["team"]));

        assert_eq!(
            peer.matches(c.pod(&c.db, &c.same_team_ns), &c.subject_ns),
            Ok(true)
        );
        assert_eq!(
            peer.matches(c.pod(&c.web, &c.same_team_ns), &c.subject_ns),
            Ok(true),
            "pod labels are irrelevant"
        );
        assert_eq!(
            peer.matches(c.pod(&c.db, &c.other_team_ns), &c.subject_ns),
            Ok(false)
        );
    }

    #[test]
    fn pods_peer() {
        let c = Cluster::default();
        let peer = AdminNetworkPolicyIngressPeer::pods(
            NamespacedPeer::not_same_labels(["team"]),
            Selector::from_iter(Some(("app", "db"))),
        );

        assert_eq!(
            peer.matches(c.pod(&c.db, &c.other_team_ns), &c.subject_ns),
            Ok(true)
        );
        assert_eq!(
            peer.matches(c.pod(&c.web, &c.other_team_ns), &c.subject_ns),
            Ok(false),
            "pod selector must match"
        );
        assert_eq!(
            peer.matches(c.pod(&c.db, &c.same_team_ns), &c.subject_ns),
            Ok(false),
            "namespace must match"
        );
    }

    #[test]
    fn pods_peer_with_empty_pod_selector() {
        let c = Cluster::default();
        let peer = AdminNetworkPolicyEgressPeer::pods(
            NamespacedPeer::selector(Selector::from_iter(Some(("env", "prod")))),
            Selector::default(),
        );
        assert_eq!(
            peer.matches(c.pod(&c.web, &c.other_team_ns), &c.subject_ns),
            Ok(true)
        );
        assert_eq!(
            peer.matches(c.pod(&c.web, &c.same_team_ns), &c.subject_ns),
            Ok(false)
        );
    }

    #[test]
    fn nodes_peer() {
        let c = Cluster::default();
        let linux = AdminNetworkPolicyEgressPeer::nodes(Selector::from_iter(Some((
            "kubernetes.io/os",
            "linux",
        ))));
        let windows = AdminNetworkPolicyEgressPeer::nodes(Selector::from_iter(Some((
            "kubernetes.io/os",
            "windows",
        ))));
        let all = AdminNetworkPolicyEgressPeer::nodes(Selector::default());

        assert_eq!(linux.matches(c.node(), &c.subject_ns), Ok(true));
        assert_eq!(windows.matches(c.node(), &c.subject_ns), Ok(false));
        assert_eq!(all.matches(c.node(), &c.subject_ns), Ok(true));
        assert_eq!(
            all.matches(c.pod(&c.db, &c.subject_ns), &c.subject_ns),
            Ok(false),
            "node peers never select pods"
        );
    }

    #[test]
    fn pod_peers_never_select_nodes() {
        let c = Cluster::default();
        let peer = AdminNetworkPolicyEgressPeer::namespaces(NamespacedPeer::selector(
            Selector::default(),
        ));
        assert_eq!(peer.matches(c.node(), &c.subject_ns), Ok(false));

        let peer = AdminNetworkPolicyEgressPeer::pods(
            NamespacedPeer::selector(Selector::default()),
            Selector::default(),
        );
        assert_eq!(peer.matches(c.node(), &c.subject_ns), Ok(false));
    }

    #[test]
    fn unknown_peers_fail_closed() {
        let c = Cluster::default();
        let endpoint = c.pod(&c.db, &c.same_team_ns);

        assert_eq!(
            AdminNetworkPolicyIngressPeer::default().matches(endpoint, &c.subject_ns),
            Err(UnknownKind::Peer)
        );
        assert_eq!(
            AdminNetworkPolicyEgressPeer::default().matches(c.node(), &c.subject_ns),
            Err(UnknownKind::Peer)
        );

        let both = AdminNetworkPolicyEgressPeer {
            nodes: Some(Selector::default()),
            ..AdminNetworkPolicyEgressPeer::namespaces(NamespacedPeer::same_labels(["team"]))
        };
        assert_eq!(both.matches(endpoint, &c.subject_ns), Err(UnknownKind::Peer));

        let empty_namespaces = AdminNetworkPolicyIngressPeer::pods(
            NamespacedPeer::default(),
            Selector::default(),
        );
        assert_eq!(
            empty_namespaces.matches(endpoint, &c.subject_ns),
            Err(UnknownKind::Peer)
        );

        let empty_namespaces = AdminNetworkPolicyEgressPeer::namespaces(NamespacedPeer::default());
        assert_eq!(
            empty_namespaces.matches(c.node(), &c.subject_ns),
            Err(UnknownKind::Peer),
            "unknown namespace predicates fail closed for any endpoint"
        );
    }

    #[test]
    fn matching_is_repeatable() {
        let c = Cluster::default();
        let peer = AdminNetworkPolicyIngressPeer::pods(
            NamespacedPeer::same_labels(["team"]),
            Selector::from_iter(Some(("app", "db"))),
        );
        let endpoint = c.pod(&c.db, &c.same_team_ns);
        let first = peer.matches(endpoint, &c.subject_ns);
        assert_eq!(first, peer.matches(endpoint, &c.subject_ns));
        assert_eq!(first, Ok(true));
    }
}
