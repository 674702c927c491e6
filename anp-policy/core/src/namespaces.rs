use crate::{
    k8s::{
        policy::{NamespacedPeer, NamespacesKind},
        Labels,
    },
    UnknownKind,
};

/// Checks whether `candidate` carries every key in `keys` with the same value as `subject`.
///
/// An empty key list selects nothing. A key missing from either label set never matches.
pub fn same_labels(keys: &[String], subject: &Labels, candidate: &Labels) -> bool {
    !keys.is_empty()
        && keys
            .iter()
            .all(|key| match (subject.get(key), candidate.get(key)) {
                (Some(s), Some(c)) => s == c,
                _ => false,
            })
}

/// Checks whether both label sets carry every key in `keys` and at least one of those keys has
/// differing values.
///
/// An empty key list selects nothing. A key missing from either label set never matches.
pub fn not_same_labels(keys: &[String], subject: &Labels, candidate: &Labels) -> bool {
    let mut differs = false;
    for key in keys {
        match (subject.get(key), candidate.get(key)) {
            (Some(s), Some(c)) => differs |= s != c,
            _ => return false,
        }
    }
    differs
}

/// Checks whether a candidate namespace is selected by `peer`.
///
/// `subject` holds the labels of the policy subject's namespace, against which `sameLabels` and
/// `notSameLabels` are compared.
pub fn matches(
    peer: &NamespacedPeer,
    candidate: &Labels,
    subject: &Labels,
) -> Result<bool, UnknownKind> {
    match peer.kind() {
        Some(NamespacesKind::Selector(selector)) => Ok(selector.matches(candidate)),
        Some(NamespacesKind::SameLabels(keys)) => Ok(same_labels(keys, subject, candidate)),
        Some(NamespacesKind::NotSameLabels(keys)) => Ok(not_same_labels(keys, subject, candidate)),
        _ => Err(UnknownKind::Peer),
    }
}
