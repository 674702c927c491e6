use crate::k8s::{
    labels::{Expression, Operator},
    policy::{
        AdminNetworkPolicy, AdminNetworkPolicyEgressPeer, AdminNetworkPolicyEgressRule,
        AdminNetworkPolicyIngressPeer, AdminNetworkPolicyIngressRule, AdminNetworkPolicyPort,
        AdminNetworkPolicySpec, AdminNetworkPolicySubject, NamespacedPeer, NamespacedPodPeer,
        NamespacedPodSubject, Port, PortRange,
    },
    Selector,
};
use std::fmt;

const MAX_PRIORITY: i32 = 1000;
const MAX_RULES: usize = 100;
const MAX_PEERS: usize = 100;
const MAX_PORTS: usize = 100;
const MAX_LABEL_KEYS: usize = 100;
const MAX_RULE_NAME_LEN: usize = 100;
const MIN_PORT: i32 = 1;
const MAX_PORT: i32 = u16::MAX as i32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A group of mutually exclusive fields does not have exactly one field set.
    ExactlyOneViolation,

    /// A port range's start is not less than its end.
    RangeOrderViolation,

    /// A port is outside `[1, 65535]`.
    PortOutOfBounds,

    /// A list exceeds its maximum length.
    ListTooLong,

    /// A required list is empty.
    ListEmpty,

    /// A string exceeds its maximum length.
    StringTooLong,

    /// A policy priority is outside `[0, 1000]`.
    PriorityOutOfBounds,

    /// A label selector expression is malformed.
    InvalidSelector,
}

/// A single structural defect, located by its field path.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {kind}: {message}")]
pub struct Violation {
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// All violations found in an object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report(Vec<Violation>);

/// Validates the structure of a policy object, collecting every violation.
pub trait Validate {
    fn validate_at(&self, path: &Path, report: &mut Report);
}

/// A JSON-path-like location within an object, e.g. `spec.ingress[0].from[1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(String);

/// Validates `obj`, returning every violation found.
///
/// Validation never stops at the first violation so that a single report describes all
/// problems with an object.
pub fn validate<T: Validate + ?Sized>(obj: &T) -> Report {
    let mut report = Report::default();
    obj.validate_at(&Path::default(), &mut report);
    report
}

// === impl ErrorKind ===

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// === impl Report ===

impl Report {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Returns the violations of `kind` reported at exactly `path`.
    pub fn at<'a>(
        &'a self,
        path: &'a str,
        kind: ErrorKind,
    ) -> impl Iterator<Item = &'a Violation> {
        self.0
            .iter()
            .filter(move |v| v.path == path && v.kind == kind)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn push(&mut self, path: &Path, kind: ErrorKind, message: impl Into<String>) {
        self.0.push(Violation {
            path: path.to_string(),
            kind,
            message: message.into(),
        });
    }
}

impl IntoIterator for Report {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut violations = self.0.iter();
        match violations.next() {
            None => f.write_str("no violations"),
            Some(first) => {
                write!(f, "{first}")?;
                for v in violations {
                    write!(f, "; {v}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Report {}

// === impl Path ===

impl Path {
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        f.write_str(&self.0)
    }
}

// === helpers ===

/// Reports an `ExactlyOneViolation` unless exactly one of `fields` is set.
fn exactly_one(path: &Path, fields: &[(&str, bool)], report: &mut Report) {
    let set = fields
        .iter()
        .filter_map(|(name, set)| set.then_some(*name))
        .collect::<Vec<_>>();
    if set.len() == 1 {
        return;
    }

    let names = fields
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let message = if set.is_empty() {
        format!("exactly one of {names} must be set; none are set")
    } else {
        format!(
            "exactly one of {names} must be set; found {}",
            set.join(", ")
        )
    };
    report.push(path, ErrorKind::ExactlyOneViolation, message);
}

fn max_len(path: &Path, len: usize, max: usize, report: &mut Report) {
    if len > max {
        report.push(
            path,
            ErrorKind::ListTooLong,
            format!("must have at most {max} items; found {len}"),
        );
    }
}

fn port_bounds(path: &Path, port: i32, report: &mut Report) {
    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        report.push(
            path,
            ErrorKind::PortOutOfBounds,
            format!("port {port} must be in [{MIN_PORT}, {MAX_PORT}]"),
        );
    }
}

fn validate_all<T: Validate>(path: &Path, items: &[T], report: &mut Report) {
    for (i, item) in items.iter().enumerate() {
        item.validate_at(&path.index(i), report);
    }
}

// === impl Validate ===

impl<T: Validate + ?Sized> Validate for &T {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        (**self).validate_at(path, report)
    }
}

impl Validate for AdminNetworkPolicy {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        self.spec.validate_at(&path.field("spec"), report)
    }
}

impl Validate for AdminNetworkPolicySpec {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        if !(0..=MAX_PRIORITY).contains(&self.priority) {
            report.push(
                &path.field("priority"),
                ErrorKind::PriorityOutOfBounds,
                format!("priority {} must be in [0, {MAX_PRIORITY}]", self.priority),
            );
        }

        self.subject.validate_at(&path.field("subject"), report);

        if let Some(rules) = self.ingress.as_deref() {
            let path = path.field("ingress");
            max_len(&path, rules.len(), MAX_RULES, report);
            validate_all(&path, rules, report);
        }

        if let Some(rules) = self.egress.as_deref() {
            let path = path.field("egress");
            max_len(&path, rules.len(), MAX_RULES, report);
            validate_all(&path, rules, report);
        }
    }
}

impl Validate for AdminNetworkPolicySubject {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        exactly_one(
            path,
            &[
                ("namespaces", self.namespaces.is_some()),
                ("pods", self.pods.is_some()),
            ],
            report,
        );

        if let Some(ns) = self.namespaces.as_ref() {
            ns.validate_at(&path.field("namespaces"), report);
        }
        if let Some(pods) = self.pods.as_ref() {
            pods.validate_at(&path.field("pods"), report);
        }
    }
}

impl Validate for NamespacedPodSubject {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        self.namespace_selector
            .validate_at(&path.field("namespaceSelector"), report);
        self.pod_selector
            .validate_at(&path.field("podSelector"), report);
    }
}

impl Validate for AdminNetworkPolicyIngressRule {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        validate_rule_name(path, self.name.as_deref(), report);

        let from = path.field("from");
        if self.from.is_empty() {
            report.push(&from, ErrorKind::ListEmpty, "at least one peer must be set");
        }
        max_len(&from, self.from.len(), MAX_PEERS, report);
        validate_all(&from, &self.from, report);

        validate_rule_ports(path, self.ports.as_deref(), report);
    }
}

impl Validate for AdminNetworkPolicyEgressRule {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        validate_rule_name(path, self.name.as_deref(), report);

        let to = path.field("to");
        if self.to.is_empty() {
            report.push(&to, ErrorKind::ListEmpty, "at least one peer must be set");
        }
        max_len(&to, self.to.len(), MAX_PEERS, report);
        validate_all(&to, &self.to, report);

        validate_rule_ports(path, self.ports.as_deref(), report);
    }
}

fn validate_rule_name(path: &Path, name: Option<&str>, report: &mut Report) {
    if let Some(name) = name {
        let len = name.chars().count();
        if len > MAX_RULE_NAME_LEN {
            report.push(
                &path.field("name"),
                ErrorKind::StringTooLong,
                format!("must be at most {MAX_RULE_NAME_LEN} characters; found {len}"),
            );
        }
    }
}

fn validate_rule_ports(path: &Path, ports: Option<&[AdminNetworkPolicyPort]>, report: &mut Report) {
    if let Some(ports) = ports {
        let path = path.field("ports");
        max_len(&path, ports.len(), MAX_PORTS, report);
        validate_all(&path, ports, report);
    }
}

impl Validate for AdminNetworkPolicyIngressPeer {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        exactly_one(
            path,
            &[
                ("namespaces", self.namespaces.is_some()),
                ("pods", self.pods.is_some()),
            ],
            report,
        );

        if let Some(ns) = self.namespaces.as_ref() {
            ns.validate_at(&path.field("namespaces"), report);
        }
        if let Some(pods) = self.pods.as_ref() {
            pods.validate_at(&path.field("pods"), report);
        }
    }
}

impl Validate for AdminNetworkPolicyEgressPeer {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        exactly_one(
            path,
            &[
                ("namespaces", self.namespaces.is_some()),
                ("pods", self.pods.is_some()),
                ("nodes", self.nodes.is_some()),
            ],
            report,
        );

        if let Some(ns) = self.namespaces.as_ref() {
            ns.validate_at(&path.field("namespaces"), report);
        }
        if let Some(pods) = self.pods.as_ref() {
            pods.validate_at(&path.field("pods"), report);
        }
        if let Some(nodes) = self.nodes.as_ref() {
            nodes.validate_at(&path.field("nodes"), report);
        }
    }
}

impl Validate for NamespacedPeer {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        exactly_one(
            path,
            &[
                ("namespaceSelector", self.namespace_selector.is_some()),
                ("sameLabels", self.same_labels.is_some()),
                ("notSameLabels", self.not_same_labels.is_some()),
            ],
            report,
        );

        if let Some(selector) = self.namespace_selector.as_ref() {
            selector.validate_at(&path.field("namespaceSelector"), report);
        }
        if let Some(keys) = self.same_labels.as_ref() {
            max_len(&path.field("sameLabels"), keys.len(), MAX_LABEL_KEYS, report);
        }
        if let Some(keys) = self.not_same_labels.as_ref() {
            max_len(
                &path.field("notSameLabels"),
                keys.len(),
                MAX_LABEL_KEYS,
                report,
            );
        }
    }
}

impl Validate for NamespacedPodPeer {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        self.namespaces
            .validate_at(&path.field("namespaces"), report);
        self.pod_selector
            .validate_at(&path.field("podSelector"), report);
    }
}

impl Validate for AdminNetworkPolicyPort {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        exactly_one(
            path,
            &[
                ("portNumber", self.port_number.is_some()),
                ("namedPort", self.named_port.is_some()),
                ("portRange", self.port_range.is_some()),
            ],
            report,
        );

        if let Some(port) = self.port_number.as_ref() {
            port.validate_at(&path.field("portNumber"), report);
        }
        if let Some(range) = self.port_range.as_ref() {
            range.validate_at(&path.field("portRange"), report);
        }
    }
}

impl Validate for Port {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        port_bounds(&path.field("port"), self.port, report);
    }
}

impl Validate for PortRange {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        port_bounds(&path.field("start"), self.start, report);
        port_bounds(&path.field("end"), self.end, report);
        if self.start >= self.end {
            report.push(
                path,
                ErrorKind::RangeOrderViolation,
                format!(
                    "start ({}) must be less than end ({})",
                    self.start, self.end
                ),
            );
        }
    }
}

impl Validate for Selector {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        let path = path.field("matchExpressions");
        for (i, expr) in self.expressions().enumerate() {
            expr.validate_at(&path.index(i), report);
        }
    }
}

impl Validate for Expression {
    fn validate_at(&self, path: &Path, report: &mut Report) {
        if self.key.is_empty() {
            report.push(
                &path.field("key"),
                ErrorKind::InvalidSelector,
                "key must not be empty",
            );
        }

        let has_values = self.values().next().is_some();
        match self.operator {
            Operator::In | Operator::NotIn if !has_values => report.push(
                &path.field("values"),
                ErrorKind::InvalidSelector,
                format!("values must be set for operator {:?}", self.operator),
            ),
            Operator::Exists | Operator::DoesNotExist if has_values => report.push(
                &path.field("values"),
                ErrorKind::InvalidSelector,
                format!("values must be empty for operator {:?}", self.operator),
            ),
            _ => {}
        }
    }
}
