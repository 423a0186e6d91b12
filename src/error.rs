use std::path::PathBuf;

use crate::types::TypeTable;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Relationship {owner} -> {target}: {missing} is not a loaded model")]
    UnresolvedReference {
        owner: String,
        target: String,
        missing: String,
    },
    #[error("Entity {owner}: relationship to {target} names key `{key}`, which {entity} does not declare")]
    UnresolvedKey {
        owner: String,
        target: String,
        entity: String,
        key: String,
    },
    #[error("dataType `{data_type}` has no entry in the {table} type table")]
    TypeMappingGap { data_type: String, table: TypeTable },
    #[error("Entity {entity}: alias `{alias}` is declared more than once")]
    DuplicateAlias { entity: String, alias: String },
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
