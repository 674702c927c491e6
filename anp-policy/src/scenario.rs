use anp_policy_core::{
    k8s::{
        labels::Map,
        policy::{AdminNetworkPolicy, Protocol},
        Labels, PodSpec,
    },
    policy::{evaluate_egress, evaluate_ingress},
    Endpoint, NamedPorts, NoNamedPorts, PodPorts, ProtocolPort, RuleMatch, Traffic,
};
use serde::Deserialize;
use tracing::debug;

/// A single connection to evaluate policies against.
///
/// ```yaml
/// direction: ingress
/// subject:
///   labels: {app: db}
///   namespaceLabels: {team: a}
/// peer:
///   pod:
///     labels: {app: client}
///     namespaceLabels: {team: b}
/// protocol: TCP
/// port: 5432
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    pub direction: Direction,
    pub subject: PodEndpoint,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub peer: PeerEndpoint,
    #[serde(default)]
    pub protocol: Protocol,
    pub port: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

/// A pod described by its labels, its namespace's labels, and optionally its spec.
///
/// The spec supplies named container ports and the host-network flag.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PodEndpoint {
    #[serde(default)]
    pub labels: Map,
    #[serde(default)]
    pub namespace_labels: Map,
    #[serde(default)]
    pub spec: Option<PodSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeerEndpoint {
    Pod(PodEndpoint),
    Node {
        #[serde(default)]
        labels: Map,
    },
}

// === impl Scenario ===

impl Scenario {
    pub fn from_yaml(input: &str) -> serde_yaml::Result<Self> {
        serde_yaml::from_str(input)
    }

    /// Returns the first rule of `policy` that selects this connection.
    ///
    /// Host-networked pods are never selected as subjects or pod peers.
    pub fn evaluate<'p>(&self, policy: &'p AdminNetworkPolicy) -> Option<RuleMatch<'p>> {
        if self.subject.is_host_network() {
            debug!("Subject pod uses the host network");
            return None;
        }

        let subject = Labels::from(self.subject.labels.clone());
        let subject_namespace = Labels::from(self.subject.namespace_labels.clone());
        let subject_ports = self.subject.named_ports();
        let port = ProtocolPort {
            protocol: self.protocol,
            port: self.port,
        };

        let (peer_labels, peer_namespace, peer_ports) = match &self.peer {
            PeerEndpoint::Pod(pod) if pod.is_host_network() => {
                debug!("Peer pod uses the host network");
                return None;
            }
            PeerEndpoint::Pod(pod) => (
                Labels::from(pod.labels.clone()),
                Some(Labels::from(pod.namespace_labels.clone())),
                Some(pod.named_ports()),
            ),
            PeerEndpoint::Node { labels } => (Labels::from(labels.clone()), None, None),
        };
        let peer = match peer_namespace.as_ref() {
            Some(namespace) => Endpoint::Pod {
                labels: &peer_labels,
                namespace,
            },
            None => Endpoint::Node {
                labels: &peer_labels,
            },
        };

        match self.direction {
            Direction::Ingress => {
                let traffic = Traffic {
                    subject: &subject,
                    subject_namespace: &subject_namespace,
                    peer,
                    port,
                    destination_ports: &subject_ports,
                };
                evaluate_ingress(&policy.spec, &traffic)
            }
            Direction::Egress => {
                let destination_ports: &dyn NamedPorts = match peer_ports.as_ref() {
                    Some(ports) => ports,
                    None => &NoNamedPorts,
                };
                let traffic = Traffic {
                    subject: &subject,
                    subject_namespace: &subject_namespace,
                    peer,
                    port,
                    destination_ports,
                };
                evaluate_egress(&policy.spec, &traffic)
            }
        }
    }
}

// === impl PodEndpoint ===

impl PodEndpoint {
    fn is_host_network(&self) -> bool {
        self.spec
            .as_ref()
            .and_then(|spec| spec.host_network)
            .unwrap_or(false)
    }

    fn named_ports(&self) -> PodPorts {
        self.spec
            .as_ref()
            .map(PodPorts::from_spec)
            .unwrap_or_default()
    }
}
