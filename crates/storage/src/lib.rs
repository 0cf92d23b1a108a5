#![forbid(unsafe_code)]

mod document;
mod error;

pub use document::*;
pub use error::StoreError;

use std::collections::BTreeMap;
use std::path::Path;

use pw_core::plan::Plan;

/// Reads one plan document from a JSON file and reconciles it.
pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan, StoreError> {
    let bytes = std::fs::read(path)?;
    let document: PlanDocument =
        serde_json::from_slice(&bytes).map_err(|_| StoreError::UnloadablePlan)?;
    Ok(decode_plan(document))
}

/// Writes a plan as JSON, identity and layout freshly reconciled.
pub fn save_plan(path: impl AsRef<Path>, plan: &Plan) -> Result<(), StoreError> {
    let document = encode_plan(plan);
    let bytes = serde_json::to_vec_pretty(&document)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reads a template file: a JSON object mapping template name → plan
/// document. Every entry is reconciled on the way in.
pub fn load_templates(path: impl AsRef<Path>) -> Result<BTreeMap<String, Plan>, StoreError> {
    let bytes = std::fs::read(path)?;
    let documents: BTreeMap<String, PlanDocument> =
        serde_json::from_slice(&bytes).map_err(|_| StoreError::UnloadablePlan)?;
    Ok(documents
        .into_iter()
        .map(|(name, document)| (name, decode_plan(document)))
        .collect())
}
