use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Selects network ports on the pods a rule applies to.
///
/// Exactly one field must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicyPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_number: Option<Port>,

    /// Selects a port by its name in the pod spec. Names are resolved per-pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    #[serde(default)]
    pub protocol: Protocol,

    /// Must be in `[1, 65535]`.
    pub port: i32,
}

/// An inclusive range of ports. `start` must be less than `end`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    #[serde(default)]
    pub protocol: Protocol,
    pub start: i32,
    pub end: i32,
}

/// A transport protocol.
///
/// An unset or empty protocol is read as TCP so that matchers only ever observe a defaulted
/// value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum Protocol {
    #[default]
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
    #[serde(rename = "SCTP")]
    Sctp,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported protocol: {0:?}")]
pub struct ProtocolParseError(String);

/// A borrowed view of the populated port field.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub enum PortKind<'a> {
    Number(&'a Port),
    Named(&'a str),
    Range(&'a PortRange),
}

// === impl AdminNetworkPolicyPort ===

impl AdminNetworkPolicyPort {
    pub fn number(protocol: Protocol, port: i32) -> Self {
        Self {
            port_number: Some(Port { protocol, port }),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            named_port: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn range(protocol: Protocol, start: i32, end: i32) -> Self {
        Self {
            port_range: Some(PortRange {
                protocol,
                start,
                end,
            }),
            ..Self::default()
        }
    }

    /// Returns the populated variant, or `None` unless exactly one field is set.
    pub fn kind(&self) -> Option<PortKind<'_>> {
        match (&self.port_number, &self.named_port, &self.port_range) {
            (Some(port), None, None) => Some(PortKind::Number(port)),
            (None, Some(name), None) => Some(PortKind::Named(name)),
            (None, None, Some(range)) => Some(PortKind::Range(range)),
            _ => None,
        }
    }
}

// === impl Protocol ===

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Sctp => "SCTP",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = ProtocolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            "SCTP" => Ok(Self::Sctp),
            s => Err(ProtocolParseError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Self::default()),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_defaults_to_tcp() {
        for (json, expected, msg) in [
            (serde_json::json!({ "port": 80 }), Protocol::Tcp, "absent"),
            (
                serde_json::json!({ "protocol": "", "port": 80 }),
                Protocol::Tcp,
                "empty",
            ),
            (
                serde_json::json!({ "protocol": null, "port": 80 }),
                Protocol::Tcp,
                "null",
            ),
            (
                serde_json::json!({ "protocol": "UDP", "port": 80 }),
                Protocol::Udp,
                "udp",
            ),
            (
                serde_json::json!({ "protocol": "SCTP", "port": 80 }),
                Protocol::Sctp,
                "sctp",
            ),
        ] {
            let port = serde_json::from_value::<Port>(json).expect(msg);
            assert_eq!(port.protocol, expected, "{}", msg);
        }
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(serde_json::from_value::<Port>(serde_json::json!({
            "protocol": "tcp",
            "port": 80,
        }))
        .is_err());
        assert_eq!(
            "ICMP".parse::<Protocol>(),
            Err(ProtocolParseError("ICMP".to_string()))
        );
    }

    #[test]
    fn port_kind() {
        assert!(matches!(
            AdminNetworkPolicyPort::named("http").kind(),
            Some(PortKind::Named("http"))
        ));
        assert!(matches!(
            AdminNetworkPolicyPort::range(Protocol::Udp, 53, 54).kind(),
            Some(PortKind::Range(PortRange { start: 53, end: 54, .. }))
        ));
        assert!(AdminNetworkPolicyPort::default().kind().is_none());
        let both = AdminNetworkPolicyPort {
            named_port: Some("http".to_string()),
            ..AdminNetworkPolicyPort::number(Protocol::Tcp, 80)
        };
        assert!(both.kind().is_none());
    }
}
