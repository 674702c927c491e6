use anp_policy_core::k8s::policy::AdminNetworkPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::{fs, path::Path};
use tracing::{debug, trace};

const KIND: &str = "AdminNetworkPolicy";

/// Reads all AdminNetworkPolicy resources from a YAML or JSON file.
pub fn read_policies(path: &Path) -> Result<Vec<AdminNetworkPolicy>> {
    let input =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    policies(&input).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses all AdminNetworkPolicy resources from a multi-document YAML stream.
///
/// Empty documents and documents of other kinds are skipped, so manifests that bundle other
/// resources may be loaded directly.
pub fn policies(input: &str) -> Result<Vec<AdminNetworkPolicy>> {
    let mut policies = Vec::new();
    for (i, doc) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value = Value::deserialize(doc).with_context(|| format!("invalid document {i}"))?;
        if value.is_null() {
            trace!(document = i, "Skipping empty document");
            continue;
        }

        let kind = value.get("kind").and_then(Value::as_str);
        if kind != Some(KIND) {
            debug!(document = i, ?kind, "Skipping resource");
            continue;
        }

        let policy = serde_yaml::from_value::<AdminNetworkPolicy>(value)
            .with_context(|| format!("invalid {KIND} in document {i}"))?;
        policies.push(policy);
    }
    Ok(policies)
}
