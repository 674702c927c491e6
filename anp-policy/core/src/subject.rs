use crate::{
    k8s::{
        policy::{AdminNetworkPolicySubject, SubjectKind},
        Labels,
    },
    UnknownKind,
};

/// Checks whether a pod, in a namespace, is governed by `subject`.
///
/// Unlike namespace peers, empty subject selectors select everything.
pub fn matches(
    subject: &AdminNetworkPolicySubject,
    pod: &Labels,
    namespace: &Labels,
) -> Result<bool, UnknownKind> {
    match subject.kind() {
        Some(SubjectKind::Namespaces(selector)) => Ok(selector.matches(namespace)),
        Some(SubjectKind::Pods(pods)) => {
            Ok(pods.namespace_selector.matches(namespace) && pods.pod_selector.matches(pod))
        }
        _ => Err(UnknownKind::Subject),
    }
}
