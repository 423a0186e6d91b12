pub mod assemble;
pub mod ast;
pub mod config;
pub mod emit;
pub mod error;
pub mod ident;
pub mod ir;
pub mod merge;
pub mod query;
pub mod relations;
pub mod types;
pub mod writer;

use indexmap::IndexMap;
use wasm_bindgen::prelude::*;

use assemble::{Generation, OutputLayout};
use error::GenError;
use ir::{OwnerPolicy, Schema};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Load a JSON model document and produce every artifact with default
/// owner policy and layout.
pub fn generate(source: &str) -> Result<Generation, GenError> {
    let schema = Schema::from_json(source)?;
    assemble::generate(&schema, &OwnerPolicy::default(), &OutputLayout::default())
}

/// Generate from a JSON model document; returns a JSON object mapping
/// relative output path to file contents.
#[wasm_bindgen(js_name = "generateArtifacts")]
pub fn generate_artifacts(source: &str) -> Result<String, String> {
    let generation = generate(source).map_err(|e| e.to_string())?;
    let files: IndexMap<String, &str> = generation
        .artifacts
        .iter()
        .map(|a| (a.path.to_string_lossy().replace('\\', "/"), a.contents.as_str()))
        .collect();
    serde_json::to_string(&files).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_artifacts_map() {
        let json = generate_artifacts(ir::tests::SAMPLE).unwrap();
        let files: serde_json::Value = serde_json::from_str(&json).unwrap();
        let files = files.as_object().unwrap();
        assert!(files.contains_key("generated/openapi.json"));
        assert!(files.contains_key("resources/users/users.controller.ts"));
        assert!(files["generated/model-types.enum.ts"].as_str().unwrap().contains("USER_TAG"));
    }

    #[test]
    fn test_generate_artifacts_reports_errors() {
        let err = generate_artifacts(r#"{ "models": {} }"#).unwrap_err();
        assert!(err.starts_with("Configuration error"));
    }
}
