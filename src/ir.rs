use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::{ApiDef, DefaultDef, Document, FieldDef, ModelDef, RelationDef, RelationshipDef};
use crate::error::GenError;
use crate::types::{DataType, SurfaceType, surface_type};

/// Normalized model set. Built once by [`Schema::load`] and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    pub entities: IndexMap<String, Entity>,
    pub api: ApiDef,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub table_name: String,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub surface: SurfaceType,
    pub required: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub default: Option<DefaultValue>,
    pub references: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    /// Current timestamp at insert.
    Now,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub unique: bool,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsToOne,
    BelongsToMany,
}

impl RelationKind {
    pub fn is_many(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsToOne => "belongsToOne",
            Self::BelongsToMany => "belongsToMany",
        }
    }
}

/// One declared relationship, as written. Resolution into lookups happens
/// in [`crate::relations`].
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: String,
    pub alias: String,
    pub foreign_key: String,
    pub source_key: Option<String>,
    pub target_key: Option<String>,
    pub through: Option<String>,
}

impl Field {
    /// Contract type, e.g. `string | null`.
    pub fn ts_type(&self) -> String {
        if self.required {
            self.surface.as_str().to_string()
        } else {
            format!("{} | null", self.surface.as_str())
        }
    }

    pub fn is_timestamp(&self) -> bool {
        self.data_type.is_temporal() || self.name.ends_with("_at")
    }

    /// Integer primary keys are auto-incrementing in both ORM targets.
    pub fn is_serial(&self) -> bool {
        self.primary_key && self.data_type == DataType::Integer
    }
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared primary key column, `id` if none is declared.
    pub fn primary_key(&self) -> &str {
        self.fields
            .iter()
            .find(|f| f.primary_key)
            .map(|f| f.name.as_str())
            .unwrap_or("id")
    }
}

impl Schema {
    pub fn from_json(source: &str) -> Result<Self, GenError> {
        let doc = Document::from_json(source)?;
        Self::load(&doc)
    }

    /// Build the IR. Fields of every model are normalized before any
    /// relationship is attached, so relationship checks can see the whole set.
    pub fn load(doc: &Document) -> Result<Self, GenError> {
        let models = match &doc.models {
            Some(models) if !models.is_empty() => models,
            _ => {
                return Err(GenError::Configuration(
                    "document declares no models".to_string(),
                ));
            }
        };

        let mut entities = IndexMap::with_capacity(models.len());
        for (name, model) in models {
            entities.insert(name.clone(), load_entity(name, model)?);
        }

        for (owner, def) in &doc.relationships {
            let Some(entity) = entities.get_mut(owner) else {
                match def.targets().next() {
                    Some(target) => {
                        return Err(GenError::UnresolvedReference {
                            owner: owner.clone(),
                            target: target.clone(),
                            missing: owner.clone(),
                        });
                    }
                    None => {
                        warn!(owner = %owner, "empty relationships block for unknown model ignored");
                        continue;
                    }
                }
            };
            entity.relations = load_relations(entity, def)?;
        }

        debug!(entities = entities.len(), "schema loaded");

        Ok(Schema {
            entities,
            api: doc.api.clone(),
        })
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

fn load_entity(name: &str, model: &ModelDef) -> Result<Entity, GenError> {
    let fields = model
        .fields
        .iter()
        .map(|(field_name, def)| load_field(field_name, def))
        .collect::<Result<Vec<_>, _>>()?;

    if fields.iter().filter(|f| f.primary_key).count() > 1 {
        return Err(GenError::Configuration(format!(
            "entity {name} declares more than one primary key"
        )));
    }

    let mut indexes = Vec::with_capacity(model.indexes.len());
    for index in &model.indexes {
        if let Some(missing) = index
            .fields
            .iter()
            .find(|f| !fields.iter().any(|field| &field.name == *f))
        {
            return Err(GenError::Configuration(format!(
                "entity {name}: index names unknown field {missing}"
            )));
        }
        indexes.push(Index {
            unique: index.unique,
            fields: index.fields.clone(),
        });
    }

    Ok(Entity {
        name: name.to_string(),
        table_name: model.table_name.clone(),
        fields,
        indexes,
        relations: Vec::new(),
    })
}

fn load_field(name: &str, def: &FieldDef) -> Result<Field, GenError> {
    let data_type = DataType::parse(&def.data_type)?;

    let default = def.default_value.as_ref().map(|d| match d {
        DefaultDef::Null => DefaultValue::Null,
        DefaultDef::Str(s) if s == "now" => DefaultValue::Now,
        DefaultDef::Str(s) => DefaultValue::Str(s.clone()),
        DefaultDef::Bool(b) => DefaultValue::Bool(*b),
        DefaultDef::Int(n) => DefaultValue::Int(*n),
        DefaultDef::Float(n) => DefaultValue::Float(*n),
    });

    Ok(Field {
        name: name.to_string(),
        data_type,
        surface: surface_type(data_type),
        required: def.required,
        primary_key: def.primary_key,
        unique: def.unique,
        min_length: def.min_length,
        max_length: def.max_length,
        default,
        references: def.references.as_ref().map(|r| r.model.clone()),
    })
}

fn load_relations(entity: &Entity, def: &RelationshipDef) -> Result<Vec<Relation>, GenError> {
    let groups = [
        (RelationKind::HasOne, &def.has_one),
        (RelationKind::HasMany, &def.has_many),
        (RelationKind::BelongsToOne, &def.belongs_to_one),
        (RelationKind::BelongsToMany, &def.belongs_to_many),
    ];

    let mut relations: Vec<Relation> = Vec::new();
    for (kind, group) in groups {
        for (target, rel) in group {
            let taken = relations.iter().any(|r| r.alias == rel.alias)
                || entity.field(&rel.alias).is_some();
            if taken {
                return Err(GenError::DuplicateAlias {
                    entity: entity.name.clone(),
                    alias: rel.alias.clone(),
                });
            }
            relations.push(relation(kind, target, rel));
        }
    }
    Ok(relations)
}

fn relation(kind: RelationKind, target: &str, def: &RelationDef) -> Relation {
    Relation {
        kind,
        target: target.to_string(),
        alias: def.alias.clone(),
        foreign_key: def.foreign_key.clone(),
        source_key: def.source_key.clone(),
        target_key: def.target_key.clone(),
        through: def.through.clone(),
    }
}

/// Decides which field on an entity identifies its owning user.
///
/// The first field, in declaration order, whose `references.model` names
/// `owner_model` wins. Reordering fields in the document can therefore change
/// the owner field.
#[derive(Debug, Clone)]
pub struct OwnerPolicy {
    pub owner_model: String,
    pub default_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerField<'a> {
    Detected(&'a str),
    Fallback(&'a str),
}

impl Default for OwnerPolicy {
    fn default() -> Self {
        Self {
            owner_model: "User".to_string(),
            default_field: "owner_id".to_string(),
        }
    }
}

impl OwnerPolicy {
    pub fn owner_field<'a>(&'a self, entity: &'a Entity) -> OwnerField<'a> {
        entity
            .fields
            .iter()
            .find(|f| f.references.as_deref() == Some(self.owner_model.as_str()))
            .map(|f| OwnerField::Detected(f.name.as_str()))
            .unwrap_or(OwnerField::Fallback(self.default_field.as_str()))
    }
}

impl OwnerField<'_> {
    pub fn name(&self) -> &str {
        match self {
            Self::Detected(name) | Self::Fallback(name) => name,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Users, their auth providers, tags and the user-tag join.
    pub(crate) const SAMPLE: &str = r#"{
        "models": {
            "User": {
                "tableName": "users",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "email": { "dataType": "string", "required": true, "unique": true, "maxLength": 255 },
                    "bio": { "dataType": "text" },
                    "age": { "dataType": "integer" },
                    "verified": { "dataType": "boolean", "required": true, "defaultValue": false },
                    "created_at": { "dataType": "datetime", "required": true, "defaultValue": "now" }
                },
                "indexes": [{ "unique": true, "fields": ["email"] }]
            },
            "UserAuthProvider": {
                "tableName": "user_auth_providers",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "user_id": { "dataType": "integer", "required": true, "references": { "model": "User" } },
                    "provider_name": { "dataType": "string", "required": true, "minLength": 2 }
                }
            },
            "Tag": {
                "tableName": "tags",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "name": { "dataType": "string", "required": true }
                }
            },
            "UserTag": {
                "tableName": "user_tags",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "user_id": { "dataType": "integer", "required": true, "references": { "model": "User" } },
                    "tag_id": { "dataType": "integer", "required": true, "references": { "model": "Tag" } }
                }
            }
        },
        "relationships": {
            "User": {
                "hasMany": {
                    "UserAuthProvider": { "alias": "authProviders", "foreignKey": "user_id", "sourceKey": "id" }
                },
                "belongsToMany": {
                    "Tag": { "alias": "tags", "foreignKey": "user_id", "targetKey": "id", "through": "UserTag" }
                }
            },
            "UserAuthProvider": {
                "belongsToOne": {
                    "User": { "alias": "user", "foreignKey": "user_id", "targetKey": "id" }
                }
            },
            "UserTag": {
                "belongsToOne": {
                    "User": { "alias": "user", "foreignKey": "user_id", "targetKey": "id" },
                    "Tag": { "alias": "tag", "foreignKey": "tag_id", "targetKey": "id" }
                }
            }
        },
        "api": { "title": "Sample API", "version": "2.0.0" }
    }"#;

    /// Posts labelled through a join keyed on `code` rather than the primary key.
    pub(crate) const POSTS: &str = r#"{
        "models": {
            "Post": {
                "tableName": "posts",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "code": { "dataType": "integer", "required": true, "unique": true }
                }
            },
            "Label": {
                "tableName": "labels",
                "fields": {
                    "id": { "dataType": "integer", "required": true, "primaryKey": true },
                    "name": { "dataType": "string", "required": true }
                }
            },
            "PostLabel": {
                "tableName": "post_labels",
                "fields": {
                    "post_code": { "dataType": "integer", "required": true },
                    "label_id": { "dataType": "integer", "required": true, "references": { "model": "Label" } }
                }
            }
        },
        "relationships": {
            "Post": {
                "hasMany": {
                    "Label": { "alias": "labels", "foreignKey": "post_code", "sourceKey": "code", "through": "PostLabel" }
                }
            }
        }
    }"#;

    pub(crate) fn sample() -> Schema {
        Schema::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_load_sample() {
        let schema = sample();
        let names: Vec<&str> = schema.entities.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["User", "UserAuthProvider", "Tag", "UserTag"]);

        let user = schema.entity("User").unwrap();
        assert_eq!(user.table_name, "users");
        assert_eq!(user.fields.len(), 6);
        assert_eq!(user.fields[1].name, "email");
        assert_eq!(user.relations.len(), 2);
        assert_eq!(user.relations[1].kind, RelationKind::BelongsToMany);
        assert_eq!(user.relations[1].through.as_deref(), Some("UserTag"));
        assert_eq!(schema.api.title, "Sample API");
    }

    #[test]
    fn test_nullable_surface_type() {
        let schema = sample();
        let user = schema.entity("User").unwrap();
        assert_eq!(user.field("email").unwrap().ts_type(), "string");
        assert_eq!(user.field("bio").unwrap().ts_type(), "string | null");
        assert_eq!(user.field("age").unwrap().ts_type(), "number | null");
        assert_eq!(user.field("created_at").unwrap().default, Some(DefaultValue::Now));
    }

    #[test]
    fn test_missing_models_is_configuration_error() {
        for input in [r#"{}"#, r#"{ "models": {} }"#] {
            let err = Schema::from_json(input).unwrap_err();
            assert!(matches!(err, GenError::Configuration(_)), "{input}");
        }
    }

    #[test]
    fn test_relationships_for_unknown_owner() {
        let input = r#"{
            "models": { "A": { "tableName": "as", "fields": { "id": { "dataType": "integer", "primaryKey": true } } } },
            "relationships": { "Ghost": { "belongsToOne": { "A": { "alias": "a", "foreignKey": "a_id" } } } }
        }"#;
        let err = Schema::from_json(input).unwrap_err();
        assert!(matches!(
            &err,
            GenError::UnresolvedReference { owner, target, missing }
                if owner == "Ghost" && target == "A" && missing == "Ghost"
        ));
        assert_eq!(err.to_string(), "Relationship Ghost -> A: Ghost is not a loaded model");

        let input = r#"{
            "models": { "A": { "tableName": "as", "fields": { "id": { "dataType": "integer" } } } },
            "relationships": { "Ghost": {} }
        }"#;
        assert!(Schema::from_json(input).is_ok());
    }

    #[test]
    fn test_unknown_data_type_aborts_load() {
        let input = r#"{ "models": { "A": { "tableName": "as", "fields": {
            "x": { "dataType": "money" } } } } }"#;
        let err = Schema::from_json(input).unwrap_err();
        assert!(matches!(err, GenError::TypeMappingGap { .. }));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let input = r#"{
            "models": {
                "A": { "tableName": "as", "fields": { "id": { "dataType": "integer", "primaryKey": true } } },
                "B": { "tableName": "bs", "fields": { "a_id": { "dataType": "integer" } } },
                "C": { "tableName": "cs", "fields": { "a_id": { "dataType": "integer" } } }
            },
            "relationships": {
                "A": {
                    "hasOne": { "B": { "alias": "child", "foreignKey": "a_id" } },
                    "hasMany": { "C": { "alias": "child", "foreignKey": "a_id" } }
                }
            }
        }"#;
        let err = Schema::from_json(input).unwrap_err();
        match err {
            GenError::DuplicateAlias { entity, alias } => {
                assert_eq!(entity, "A");
                assert_eq!(alias, "child");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_alias_shadowing_field_rejected() {
        let input = r#"{
            "models": {
                "A": { "tableName": "as", "fields": { "b": { "dataType": "string" } } },
                "B": { "tableName": "bs", "fields": { "a_id": { "dataType": "integer" } } }
            },
            "relationships": {
                "A": { "hasOne": { "B": { "alias": "b", "foreignKey": "a_id" } } }
            }
        }"#;
        assert!(matches!(
            Schema::from_json(input).unwrap_err(),
            GenError::DuplicateAlias { .. }
        ));
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        let input = r#"{ "models": { "A": { "tableName": "as", "fields": {
            "id": { "dataType": "integer", "primaryKey": true },
            "code": { "dataType": "string", "primaryKey": true } } } } }"#;
        assert!(matches!(
            Schema::from_json(input).unwrap_err(),
            GenError::Configuration(_)
        ));
    }

    #[test]
    fn test_owner_policy_first_reference_wins() {
        let input = r#"{ "models": {
            "User": { "tableName": "users", "fields": { "id": { "dataType": "integer", "primaryKey": true } } },
            "Doc": { "tableName": "docs", "fields": {
                "editor_id": { "dataType": "integer", "references": { "model": "User" } },
                "author_id": { "dataType": "integer", "references": { "model": "User" } }
            } }
        } }"#;
        let schema = Schema::from_json(input).unwrap();
        let policy = OwnerPolicy::default();

        let doc = schema.entity("Doc").unwrap();
        assert_eq!(policy.owner_field(doc), OwnerField::Detected("editor_id"));

        let user = schema.entity("User").unwrap();
        let owner = policy.owner_field(user);
        assert!(!owner.is_detected());
        assert_eq!(owner.name(), "owner_id");
    }
}
