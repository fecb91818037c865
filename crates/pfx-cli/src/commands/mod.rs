pub mod cases;
pub mod check;
pub mod export;
pub mod translate;
pub mod validate;

use anyhow::{Context, Result};
use pfx_batch::CaseRegistry;
use std::path::Path;

/// Built-in cases extended with the configured and the given case manifests.
pub fn case_registry(config_manifest: Option<&Path>, manifest: Option<&Path>) -> Result<CaseRegistry> {
    let mut registry = CaseRegistry::builtin();
    for path in config_manifest.into_iter().chain(manifest) {
        let added = registry
            .extend_from_manifest(path)
            .with_context(|| format!("loading case manifest '{}'", path.display()))?;
        tracing::info!("registered {} case(s) from {}", added, path.display());
    }
    Ok(registry)
}
