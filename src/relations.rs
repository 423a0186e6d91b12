//! Relationship resolution.
//!
//! Turns each declared [`Relation`] into an [`Accessor`]: which entity's
//! column is queried, with which value from the owning row, and whether the
//! lookup hops through a join entity first.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::GenError;
use crate::ident::to_snake;
use crate::ir::{Entity, Relation, RelationKind, Schema};
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub kind: RelationKind,
    pub alias: String,
    pub target: String,
    pub association: Association,
}

/// `entity.column == parent[parent_key]`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLookup {
    pub entity: String,
    pub column: String,
    pub parent_key: String,
    /// Type of `entity.column`, the side that carries the key.
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Association {
    /// Related rows are found with a single lookup on the target.
    Direct(KeyLookup),
    /// Join rows are found first; targets are those whose `target_column`
    /// is among the join rows' `join_column` values.
    Joined {
        through: String,
        lookup: KeyLookup,
        join_column: String,
        target_column: String,
    },
}

impl Association {
    /// The lookup performed against the owning row.
    pub fn first_hop(&self) -> &KeyLookup {
        match self {
            Self::Direct(lookup) => lookup,
            Self::Joined { lookup, .. } => lookup,
        }
    }
}

impl Accessor {
    /// Contract property type, e.g. `TagEntity[]`.
    pub fn contract_type(&self) -> String {
        if self.kind.is_many() {
            format!("{}Entity[]", self.target)
        } else {
            format!("{}Entity", self.target)
        }
    }
}

/// Accessors per entity, in entity and relation declaration order.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    accessors: IndexMap<String, Vec<Accessor>>,
}

impl Resolved {
    pub fn for_entity(&self, name: &str) -> &[Accessor] {
        self.accessors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn resolve(schema: &Schema) -> Result<Resolved, GenError> {
    let mut accessors = IndexMap::with_capacity(schema.entities.len());
    for entity in schema.entities.values() {
        let resolved = entity
            .relations
            .iter()
            .map(|rel| resolve_relation(schema, entity, rel))
            .collect::<Result<Vec<_>, _>>()?;
        accessors.insert(entity.name.clone(), resolved);
    }
    Ok(Resolved { accessors })
}

fn resolve_relation(schema: &Schema, owner: &Entity, rel: &Relation) -> Result<Accessor, GenError> {
    let target = lookup_entity(schema, owner, &rel.target, &rel.target)?;

    let through = match (&rel.through, rel.kind.is_many()) {
        (Some(join), true) => Some(lookup_entity(schema, owner, &rel.target, join)?),
        (Some(join), false) => {
            warn!(
                entity = %owner.name,
                alias = %rel.alias,
                through = %join,
                "`through` only applies to many-relations; resolving directly"
            );
            None
        }
        (None, _) => None,
    };

    let association = match through {
        Some(join) => joined(owner, target, join, rel)?,
        None => direct(owner, target, rel)?,
    };

    Ok(Accessor {
        kind: rel.kind,
        alias: rel.alias.clone(),
        target: target.name.clone(),
        association,
    })
}

fn direct(owner: &Entity, target: &Entity, rel: &Relation) -> Result<Association, GenError> {
    let (column, parent_key) = match rel.kind {
        RelationKind::HasOne | RelationKind::HasMany => (
            rel.foreign_key.clone(),
            rel.source_key
                .clone()
                .unwrap_or_else(|| owner.primary_key().to_string()),
        ),
        RelationKind::BelongsToOne | RelationKind::BelongsToMany => (
            rel.target_key
                .clone()
                .unwrap_or_else(|| target.primary_key().to_string()),
            rel.foreign_key.clone(),
        ),
    };

    let lookup = key_lookup(owner, target, target, column, parent_key)?;
    Ok(Association::Direct(lookup))
}

fn joined(
    owner: &Entity,
    target: &Entity,
    join: &Entity,
    rel: &Relation,
) -> Result<Association, GenError> {
    let (parent_key, target_column) = match rel.kind {
        RelationKind::BelongsToMany => (
            owner.primary_key().to_string(),
            rel.target_key
                .clone()
                .unwrap_or_else(|| target.primary_key().to_string()),
        ),
        _ => (
            rel.source_key
                .clone()
                .unwrap_or_else(|| owner.primary_key().to_string()),
            target.primary_key().to_string(),
        ),
    };

    let lookup = key_lookup(owner, target, join, rel.foreign_key.clone(), parent_key)?;

    let join_column = join
        .fields
        .iter()
        .find(|f| f.references.as_deref() == Some(target.name.as_str()))
        .map(|f| f.name.clone())
        .unwrap_or_else(|| format!("{}_id", to_snake(&target.name)));
    require_column(owner, target, join, &join_column)?;
    require_column(owner, target, target, &target_column)?;

    Ok(Association::Joined {
        through: join.name.clone(),
        lookup,
        join_column,
        target_column,
    })
}

fn key_lookup(
    owner: &Entity,
    target: &Entity,
    queried: &Entity,
    column: String,
    parent_key: String,
) -> Result<KeyLookup, GenError> {
    require_column(owner, target, owner, &parent_key)?;
    let data_type = require_column(owner, target, queried, &column)?;
    Ok(KeyLookup {
        entity: queried.name.clone(),
        column,
        parent_key,
        data_type,
    })
}

fn lookup_entity<'a>(
    schema: &'a Schema,
    owner: &Entity,
    target: &str,
    name: &str,
) -> Result<&'a Entity, GenError> {
    schema
        .entity(name)
        .ok_or_else(|| GenError::UnresolvedReference {
            owner: owner.name.clone(),
            target: target.to_string(),
            missing: name.to_string(),
        })
}

// An undeclared `id` key is allowed: it is the implicit primary key.
fn require_column(
    owner: &Entity,
    target: &Entity,
    on: &Entity,
    column: &str,
) -> Result<DataType, GenError> {
    match on.field(column) {
        Some(field) => Ok(field.data_type),
        None if column == "id" && on.primary_key() == "id" => Ok(DataType::Integer),
        None => Err(GenError::UnresolvedKey {
            owner: owner.name.clone(),
            target: target.name.clone(),
            entity: on.name.clone(),
            key: column.to_string(),
        }),
    }
}
