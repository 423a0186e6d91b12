//! Deep merge of OpenAPI fragments into one document.
//!
//! Objects merge key by key, arrays append, and anything else is replaced by
//! the incoming value. Merging is not commutative: the order fragments arrive
//! in decides both override winners and key order in the output.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::ast::ApiDef;
use crate::emit::Fragment;
use crate::error::GenError;

#[derive(Debug, Clone)]
pub struct Merger {
    doc: Value,
}

impl Merger {
    /// Start from the `openapi`/`info`/`servers` header.
    pub fn new(api: &ApiDef) -> Self {
        let servers: Vec<Value> = api
            .servers
            .iter()
            .map(|s| json!({ "url": s.url, "description": s.description }))
            .collect();
        Self {
            doc: json!({
                "openapi": "3.0.0",
                "info": {
                    "title": api.title,
                    "description": api.description,
                    "version": api.version,
                },
                "servers": servers,
                "paths": {},
                "components": { "schemas": {} },
            }),
        }
    }

    pub fn merge(&mut self, fragment: Value) {
        merge_value(&mut self.doc, fragment);
    }

    /// Parse an emitted OpenAPI fragment and merge it in.
    pub fn merge_fragment(&mut self, fragment: &Fragment) -> Result<(), GenError> {
        let value: Value = serde_json::from_str(&fragment.text)?;
        self.merge(value);
        debug!(entity = %fragment.entity, "merged openapi fragment");
        Ok(())
    }

    pub fn into_document(self) -> Value {
        self.doc
    }
}

fn merge_value(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => merge_map(dst, src),
        (Value::Array(dst), Value::Array(src)) => dst.extend(src),
        (dst, src) => *dst = src,
    }
}

fn merge_map(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        match dst.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                dst.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::Surface;

    fn fragment(path: &str) -> Value {
        json!({ "paths": { path: { "get": { "tags": [path] } } } })
    }

    #[test]
    fn test_base_document() {
        let doc = Merger::new(&ApiDef::default()).into_document();
        assert_eq!(doc["openapi"], "3.0.0");
        assert_eq!(doc["info"]["version"], "1.0.0");
        assert_eq!(doc["servers"][0]["url"], "http://localhost:4000/web");
        assert!(doc["paths"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_objects_merge_and_arrays_append() {
        let mut a = json!({ "x": { "k": 1, "list": [1] }, "s": "old" });
        merge_value(&mut a, json!({ "x": { "j": 2, "list": [2] }, "s": "new" }));
        assert_eq!(a, json!({ "x": { "k": 1, "list": [1, 2], "j": 2 }, "s": "new" }));
    }

    #[test]
    fn test_type_conflict_overrides() {
        let mut a = json!({ "x": [1] });
        merge_value(&mut a, json!({ "x": { "y": 1 } }));
        assert_eq!(a, json!({ "x": { "y": 1 } }));
    }

    #[test]
    fn test_order_changes_key_order_only() {
        let api = ApiDef::default();
        let mut xy = Merger::new(&api);
        xy.merge(fragment("/x"));
        xy.merge(fragment("/y"));
        let mut yx = Merger::new(&api);
        yx.merge(fragment("/y"));
        yx.merge(fragment("/x"));

        let (xy, yx) = (xy.into_document(), yx.into_document());
        let keys = |doc: &Value| -> Vec<String> { doc["paths"].as_object().unwrap().keys().cloned().collect() };
        assert_eq!(keys(&xy), vec!["/x", "/y"]);
        assert_eq!(keys(&yx), vec!["/y", "/x"]);
        assert_eq!(xy["paths"]["/x"], yx["paths"]["/x"]);
    }

    #[test]
    fn test_merge_fragment_parses_text() {
        let mut merger = Merger::new(&ApiDef::default());
        let fragment = Fragment {
            surface: Surface::OpenApi,
            entity: "Tag".to_string(),
            text: r#"{ "paths": { "/tags": { "get": {} } }, "components": { "schemas": { "TagEntity": {} } } }"#.to_string(),
        };
        merger.merge_fragment(&fragment).unwrap();
        let doc = merger.into_document();
        assert!(doc["paths"]["/tags"]["get"].is_object());
        assert!(doc["components"]["schemas"]["TagEntity"].is_object());
        assert_eq!(doc["openapi"], "3.0.0");

        let broken = Fragment { text: "{".to_string(), ..fragment };
        let mut merger = Merger::new(&ApiDef::default());
        assert!(matches!(merger.merge_fragment(&broken), Err(GenError::Document(_))));
    }
}
