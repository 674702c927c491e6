use crate::{
    k8s::{
        policy::{AdminNetworkPolicyPort, PortKind, Protocol},
        PodSpec,
    },
    UnknownKind,
};
use ahash::AHashMap;
use std::{collections::HashMap, hash::BuildHasher};
use tracing::{debug, trace};

/// A port number qualified by its transport protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProtocolPort {
    pub protocol: Protocol,
    pub port: u16,
}

/// Resolves named ports for a specific pod.
///
/// Named ports are pod-specific: a name that a pod does not declare simply fails to resolve.
pub trait NamedPorts {
    fn resolve(&self, name: &str) -> Option<ProtocolPort>;
}

/// A resolver for endpoints that declare no named ports, e.g. nodes.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoNamedPorts;

/// An index of the named container ports in a pod spec.
#[derive(Clone, Debug, Default)]
pub struct PodPorts {
    by_name: AHashMap<String, ProtocolPort>,
}

/// Checks whether a connection to `target` is selected by `port`.
///
/// Named ports are resolved with `named_ports`, which must describe the destination pod. A name
/// that does not resolve is a non-match, not an error.
pub fn matches<N>(
    port: &AdminNetworkPolicyPort,
    target: ProtocolPort,
    named_ports: &N,
) -> Result<bool, UnknownKind>
where
    N: NamedPorts + ?Sized,
{
    match port.kind() {
        Some(PortKind::Number(p)) => {
            Ok(p.protocol == target.protocol && p.port == i32::from(target.port))
        }
        Some(PortKind::Range(r)) => Ok(r.protocol == target.protocol
            && r.start <= i32::from(target.port)
            && i32::from(target.port) <= r.end),
        Some(PortKind::Named(name)) => match named_ports.resolve(name) {
            Some(resolved) => Ok(resolved == target),
            None => {
                trace!(%name, "Named port not declared by pod");
                Ok(false)
            }
        },
        _ => Err(UnknownKind::Port),
    }
}

// === impl NamedPorts ===

impl NamedPorts for NoNamedPorts {
    #[inline]
    fn resolve(&self, _: &str) -> Option<ProtocolPort> {
        None
    }
}

impl<S: BuildHasher> NamedPorts for HashMap<String, ProtocolPort, S> {
    #[inline]
    fn resolve(&self, name: &str) -> Option<ProtocolPort> {
        self.get(name).copied()
    }
}

impl<F> NamedPorts for F
where
    F: Fn(&str) -> Option<ProtocolPort>,
{
    #[inline]
    fn resolve(&self, name: &str) -> Option<ProtocolPort> {
        (self)(name)
    }
}

// === impl PodPorts ===

impl PodPorts {
    /// Indexes the named ports of all containers in a pod spec.
    ///
    /// Kubernetes permits only one port per name within a pod; if a spec nonetheless repeats a
    /// name, the first declaration wins.
    pub fn from_spec(spec: &PodSpec) -> Self {
        let mut ports = Self::default();

        for container in spec.containers.iter() {
            for p in container.ports.iter().flatten() {
                let Some(name) = p.name.as_ref() else {
                    continue;
                };

                let protocol = match p.protocol.as_deref().unwrap_or_default().parse() {
                    Ok(protocol) => protocol,
                    Err(error) => {
                        debug!(%error, %name, container = %container.name, "Skipping port");
                        continue;
                    }
                };

                let port = match u16::try_from(p.container_port) {
                    Ok(port) if port != 0 => port,
                    _ => {
                        debug!(%name, port = p.container_port, "Skipping invalid port");
                        continue;
                    }
                };

                if ports.by_name.contains_key(name) {
                    debug!(%name, "Port name duplicated");
                    continue;
                }

                trace!(%name, %port, %protocol, "Adding named port");
                ports
                    .by_name
                    .insert(name.clone(), ProtocolPort { protocol, port });
            }
        }

        ports
    }
}

impl NamedPorts for PodPorts {
    #[inline]
    fn resolve(&self, name: &str) -> Option<ProtocolPort> {
        self.by_name.get(name).copied()
    }
}

impl std::iter::FromIterator<(String, ProtocolPort)> for PodPorts {
    fn from_iter<T: IntoIterator<Item = (String, ProtocolPort)>>(iter: T) -> Self {
        Self {
            by_name: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec};

    fn tcp(port: u16) -> ProtocolPort {
        ProtocolPort {
            protocol: Protocol::Tcp,
            port,
        }
    }

    fn udp(port: u16) -> ProtocolPort {
        ProtocolPort {
            protocol: Protocol::Udp,
            port,
        }
    }

    fn mk_container_port(name: &str, port: i32, protocol: Option<&str>) -> ContainerPort {
        ContainerPort {
            name: Some(name.to_string()),
            container_port: port,
            protocol: protocol.map(ToString::to_string),
            ..ContainerPort::default()
        }
    }

    fn mk_pod_spec(ports: Vec<ContainerPort>) -> PodSpec {
        PodSpec {
            containers: vec![Container {
                name: "main".to_string(),
                ports: Some(ports),
                ..Container::default()
            }],
            ..PodSpec::default()
        }
    }

    #[test]
    fn port_number() {
        let port = AdminNetworkPolicyPort::number(Protocol::Tcp, 8080);
        for (target, expected, msg) in [
            (tcp(8080), true, "same port"),
            (tcp(8081), false, "other port"),
            (udp(8080), false, "other protocol"),
        ] {
            assert_eq!(matches(&port, target, &NoNamedPorts), Ok(expected), "{msg}");
        }
    }

    #[test]
    fn port_range_is_inclusive() {
        let range = AdminNetworkPolicyPort::range(Protocol::Tcp, 80, 443);
        for (target, expected) in [
            (tcp(79), false),
            (tcp(80), true),
            (tcp(81), true),
            (tcp(443), true),
            (tcp(444), false),
            (udp(80), false),
        ] {
            assert_eq!(
                matches(&range, target, &NoNamedPorts),
                Ok(expected),
                "{target:?}"
            );
        }
    }

    #[test]
    fn named_port() {
        let http = AdminNetworkPolicyPort::named("http");
        let ports = maplit::hashmap! {
            "http".to_string() => tcp(8080),
        };

        assert_eq!(matches(&http, tcp(8080), &ports), Ok(true));
        assert_eq!(matches(&http, tcp(80), &ports), Ok(false));
        assert_eq!(matches(&http, udp(8080), &ports), Ok(false));
        assert_eq!(
            matches(&http, tcp(8080), &NoNamedPorts),
            Ok(false),
            "an undeclared name is a non-match"
        );

        let resolver = |name: &str| (name == "http").then_some(tcp(8080));
        assert_eq!(matches(&http, tcp(8080), &resolver), Ok(true));
    }

    #[test]
    fn unknown_port_fails_closed() {
        assert_eq!(
            matches(&AdminNetworkPolicyPort::default(), tcp(80), &NoNamedPorts),
            Err(UnknownKind::Port)
        );
        let both = AdminNetworkPolicyPort {
            named_port: Some("http".to_string()),
            ..AdminNetworkPolicyPort::number(Protocol::Tcp, 80)
        };
        assert_eq!(
            matches(&both, tcp(80), &NoNamedPorts),
            Err(UnknownKind::Port)
        );
    }

    #[test]
    fn pod_ports_from_spec() {
        let ports = PodPorts::from_spec(&mk_pod_spec(vec![
            mk_container_port("http", 8080, None),
            mk_container_port("dns", 53, Some("UDP")),
            mk_container_port("http", 9090, Some("TCP")),
            mk_container_port("weird", 7070, Some("ICMP")),
            ContainerPort {
                container_port: 9999,
                ..ContainerPort::default()
            },
        ]));

        assert_eq!(ports.resolve("http"), Some(tcp(8080)), "first name wins");
        assert_eq!(ports.resolve("dns"), Some(udp(53)));
        assert_eq!(ports.resolve("weird"), None, "unknown protocol");
        assert_eq!(ports.resolve("admin"), None);
    }

    #[test]
    fn pod_ports_named_port_is_pod_specific() {
        let http = AdminNetworkPolicyPort::named("http");
        let serving = PodPorts::from_spec(&mk_pod_spec(vec![mk_container_port(
            "http", 8080, None,
        )]));
        let other = PodPorts::from_spec(&mk_pod_spec(vec![mk_container_port(
            "metrics", 8080, None,
        )]));

        assert_eq!(matches(&http, tcp(8080), &serving), Ok(true));
        assert_eq!(matches(&http, tcp(8080), &other), Ok(false));
        assert_eq!(PodPorts::default().resolve("http"), None);
    }
}
