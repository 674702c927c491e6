use crate::labels::Selector;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Selects the pods a policy applies to.
///
/// Exactly one field must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNetworkPolicySubject {
    /// Selects all pods in the namespaces matched by this selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Selector>,

    /// Selects pods via namespace AND pod selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<NamespacedPodSubject>,
}

/// Selects pods within a set of namespaces. Empty selectors select everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedPodSubject {
    pub namespace_selector: Selector,
    pub pod_selector: Selector,
}

/// A borrowed view of the populated subject field.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub enum SubjectKind<'a> {
    Namespaces(&'a Selector),
    Pods(&'a NamespacedPodSubject),
}

// === impl AdminNetworkPolicySubject ===

impl AdminNetworkPolicySubject {
    pub fn namespaces(selector: Selector) -> Self {
        Self {
            namespaces: Some(selector),
            pods: None,
        }
    }

    pub fn pods(namespace_selector: Selector, pod_selector: Selector) -> Self {
        Self {
            namespaces: None,
            pods: Some(NamespacedPodSubject {
                namespace_selector,
                pod_selector,
            }),
        }
    }

    /// Returns the populated variant, or `None` unless exactly one field is set.
    pub fn kind(&self) -> Option<SubjectKind<'_>> {
        match (&self.namespaces, &self.pods) {
            (Some(ns), None) => Some(SubjectKind::Namespaces(ns)),
            (None, Some(pods)) => Some(SubjectKind::Pods(pods)),
            _ => None,
        }
    }
}
