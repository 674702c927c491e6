use crate::k8s::Labels;

/// The far side of a connection, as seen from a policy's subject.
///
/// Host-networked pods must not be presented as `Pod` endpoints.
#[derive(Copy, Clone, Debug)]
pub enum Endpoint<'a> {
    Pod {
        labels: &'a Labels,
        namespace: &'a Labels,
    },
    Node {
        labels: &'a Labels,
    },
}
