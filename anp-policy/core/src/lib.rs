#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Matching and validation for AdminNetworkPolicy rules.
//!
//! Every matcher is a pure function of its arguments: policies are read-only once validated and
//! may be evaluated concurrently without coordination. Cluster state (namespace, pod, and node
//! labels; named-port tables) is supplied by the caller.

mod endpoint;
pub mod namespaces;
pub mod peer;
pub mod policy;
pub mod ports;
pub mod subject;
pub mod validation;

pub use self::{
    endpoint::Endpoint,
    peer::MatchPeer,
    policy::{RuleMatch, Traffic},
    ports::{NamedPorts, NoNamedPorts, PodPorts, ProtocolPort},
    validation::{validate, ErrorKind, Report, Validate, Violation},
};
pub use anp_policy_k8s_api as k8s;

/// Indicates that a matcher was handed a specification it does not recognize.
///
/// This occurs when a policy was not validated or was written against a newer schema. Callers must
/// treat it as a non-match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum UnknownKind {
    #[error("unknown subject kind")]
    Subject,

    #[error("unknown peer kind")]
    Peer,

    #[error("unknown port kind")]
    Port,
}
