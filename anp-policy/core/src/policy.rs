use crate::{
    k8s::{
        policy::{
            AdminNetworkPolicyEgressRule, AdminNetworkPolicyIngressRule,
            AdminNetworkPolicyPort, AdminNetworkPolicyRuleAction, AdminNetworkPolicySpec,
        },
        Labels,
    },
    ports, subject, Endpoint, MatchPeer, NamedPorts, ProtocolPort,
};
use tracing::{debug, trace, warn};

/// A connection observed from a policy subject's pod.
#[derive(Copy, Clone)]
pub struct Traffic<'a> {
    /// The labels of the pod the policy may apply to.
    pub subject: &'a Labels,
    pub subject_namespace: &'a Labels,

    /// The source of ingress traffic or the destination of egress traffic.
    pub peer: Endpoint<'a>,

    /// The destination port of the connection.
    pub port: ProtocolPort,

    /// Named ports of the destination pod: the subject for ingress, the peer for egress.
    pub destination_ports: &'a dyn NamedPorts,
}

/// The first rule of a policy that selected a connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub index: usize,
    pub name: Option<&'a str>,
    pub action: AdminNetworkPolicyRuleAction,
}

/// Checks whether an ingress rule selects `traffic`.
///
/// Peers and ports of unknown kinds never match.
pub fn ingress_rule_matches(rule: &AdminNetworkPolicyIngressRule, traffic: &Traffic<'_>) -> bool {
    any_peer_matches(&rule.from, traffic) && any_port_matches(rule.ports.as_deref(), traffic)
}

/// Checks whether an egress rule selects `traffic`.
///
/// Peers and ports of unknown kinds never match.
pub fn egress_rule_matches(rule: &AdminNetworkPolicyEgressRule, traffic: &Traffic<'_>) -> bool {
    any_peer_matches(&rule.to, traffic) && any_port_matches(rule.ports.as_deref(), traffic)
}

/// Finds the first ingress rule of `spec` that selects `traffic`.
///
/// Returns `None` when the policy does not apply to the subject or when no rule matches.
pub fn evaluate_ingress<'s>(
    spec: &'s AdminNetworkPolicySpec,
    traffic: &Traffic<'_>,
) -> Option<RuleMatch<'s>> {
    if !subject_matches(spec, traffic) {
        return None;
    }

    let rules = spec.ingress.iter().flatten();
    first_match(rules.map(|r| (r.name.as_deref(), r.action, ingress_rule_matches(r, traffic))))
}

/// Finds the first egress rule of `spec` that selects `traffic`.
///
/// Returns `None` when the policy does not apply to the subject or when no rule matches.
pub fn evaluate_egress<'s>(
    spec: &'s AdminNetworkPolicySpec,
    traffic: &Traffic<'_>,
) -> Option<RuleMatch<'s>> {
    if !subject_matches(spec, traffic) {
        return None;
    }

    let rules = spec.egress.iter().flatten();
    first_match(rules.map(|r| (r.name.as_deref(), r.action, egress_rule_matches(r, traffic))))
}

fn subject_matches(spec: &AdminNetworkPolicySpec, traffic: &Traffic<'_>) -> bool {
    match subject::matches(&spec.subject, traffic.subject, traffic.subject_namespace) {
        Ok(matches) => matches,
        Err(error) => {
            warn!(%error, "Policy subject does not match");
            false
        }
    }
}

fn first_match<'s>(
    rules: impl Iterator<Item = (Option<&'s str>, AdminNetworkPolicyRuleAction, bool)>,
) -> Option<RuleMatch<'s>> {
    rules
        .enumerate()
        .find(|(_, (_, _, matched))| *matched)
        .map(|(index, (name, action, _))| {
            debug!(index, ?name, %action, "Rule matched");
            RuleMatch {
                index,
                name,
                action,
            }
        })
}

fn any_peer_matches<P: MatchPeer>(peers: &[P], traffic: &Traffic<'_>) -> bool {
    peers.iter().any(
        |peer| match peer.matches(traffic.peer, traffic.subject_namespace) {
            Ok(matches) => matches,
            Err(error) => {
                warn!(%error, "Peer does not match");
                false
            }
        },
    )
}

fn any_port_matches(
    rule_ports: Option<&[AdminNetworkPolicyPort]>,
    traffic: &Traffic<'_>,
) -> bool {
    let rule_ports = match rule_ports {
        Some(rule_ports) if !rule_ports.is_empty() => rule_ports,
        _ => return true,
    };

    rule_ports.iter().any(
        |port| match ports::matches(port, traffic.port, traffic.destination_ports) {
            Ok(matches) => {
                trace!(?port, target = ?traffic.port, matches);
                matches
            }
            Err(error) => {
                warn!(%error, "Port does not match");
                false
            }
        },
    )
}
