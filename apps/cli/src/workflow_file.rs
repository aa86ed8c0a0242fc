//! Loads a [`Workflow`] definition from a JSON or YAML file on disk.

use std::path::Path;

use anyhow::{bail, Context, Result};
use nebula_wf_model::Workflow;

/// Parse `path` as YAML if its extension is `.yaml`/`.yml`, otherwise JSON.
pub fn load(path: &Path) -> Result<Workflow> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&raw).with_context(|| format!("parsing {} as YAML", path.display())),
        Some("json") => serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display())),
        other => bail!("unsupported workflow file extension {other:?} for {}", path.display()),
    }
}
