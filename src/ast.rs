//! Raw model document, as deserialized from JSON.
//!
//! Nothing here is validated; see [`crate::ir::Schema::load`].

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub models: Option<IndexMap<String, ModelDef>>,
    #[serde(default)]
    pub relationships: IndexMap<String, RelationshipDef>,
    #[serde(default)]
    pub api: ApiDef,
}

impl Document {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    pub table_name: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Absent and explicit `null` both land here; the loader tells them
    /// apart through [`DefaultDef`].
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default_value: Option<DefaultDef>,
    #[serde(default)]
    pub references: Option<ReferenceDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultDef {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

fn deserialize_default<'de, D>(de: D) -> Result<Option<DefaultDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<DefaultDef>::deserialize(de)?;
    Ok(Some(value.unwrap_or(DefaultDef::Null)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDef {
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexDef {
    #[serde(default)]
    pub unique: bool,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDef {
    #[serde(default)]
    pub has_one: IndexMap<String, RelationDef>,
    #[serde(default)]
    pub has_many: IndexMap<String, RelationDef>,
    #[serde(default)]
    pub belongs_to_one: IndexMap<String, RelationDef>,
    #[serde(default)]
    pub belongs_to_many: IndexMap<String, RelationDef>,
}

impl RelationshipDef {
    /// Target model names across all four kinds, in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &String> {
        self.has_one
            .keys()
            .chain(self.has_many.keys())
            .chain(self.belongs_to_one.keys())
            .chain(self.belongs_to_many.keys())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDef {
    pub alias: String,
    pub foreign_key: String,
    #[serde(default)]
    pub source_key: Option<String>,
    #[serde(default)]
    pub target_key: Option<String>,
    #[serde(default)]
    pub through: Option<String>,
}

/// Optional `api` block feeding the OpenAPI document header.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiDef {
    pub title: String,
    pub description: String,
    pub version: String,
    pub servers: Vec<ServerDef>,
}

impl Default for ApiDef {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            description: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            servers: vec![ServerDef {
                url: "http://localhost:4000/web".to_string(),
                description: "Local server".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDef {
    pub url: String,
    #[serde(default)]
    pub description: String,
}
