//! Per-entity artifact emitters.
//!
//! Each emitter reads one [`Model`] and returns a [`Fragment`]. Emitters never
//! see each other's output; stitching fragments into files is done by
//! [`crate::assemble`].

mod contract;
mod drizzle;
mod dto;
mod graphql;
mod openapi;
mod scaffold;
mod sequelize;

pub use contract::ContractEmitter;
pub use drizzle::{DrizzleEmitter, DrizzleRelationsEmitter};
pub use dto::{CreateDtoEmitter, SearchDtoEmitter, UpdateDtoEmitter};
pub use graphql::{GraphqlEmitter, GraphqlSdlEmitter};
pub use openapi::OpenApiEmitter;
pub use scaffold::{ControllerEmitter, GuardEmitter, RepositoryEmitter, ServiceEmitter};
pub use sequelize::{SequelizeAssociationsEmitter, SequelizeEmitter};

use crate::ident::{pluralize, to_kebab, to_screaming_snake, to_var_name};
use crate::ir::{Entity, OwnerField};
use crate::relations::Accessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Contract,
    SequelizeModel,
    SequelizeAssociations,
    DrizzleTable,
    DrizzleRelations,
    GraphqlSdl,
    Graphql,
    OpenApi,
    CreateDto,
    UpdateDto,
    SearchDto,
    Controller,
    Service,
    Guard,
    Repository,
}

/// One emitter's output for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub surface: Surface,
    pub entity: String,
    pub text: String,
}

/// Everything an emitter may read about one entity.
#[derive(Debug, Clone, Copy)]
pub struct Model<'a> {
    pub entity: &'a Entity,
    pub accessors: &'a [Accessor],
    pub owner: &'a OwnerField<'a>,
}

pub trait Emitter {
    fn surface(&self) -> Surface;

    fn render(&self, model: &Model<'_>) -> String;

    fn emit(&self, model: &Model<'_>) -> Fragment {
        Fragment {
            surface: self.surface(),
            entity: model.entity.name.clone(),
            text: self.render(model),
        }
    }
}

/// Derived identifiers for one entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub model: String,
    pub plural: String,
    pub var: String,
    pub kebab_plural: String,
    pub token: String,
}

impl Names {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            plural: pluralize(model),
            var: to_var_name(model),
            kebab_plural: pluralize(&to_kebab(model)),
            token: format!("{}_REPO_INJECT_TOKEN", to_screaming_snake(model)),
        }
    }

    /// Drizzle table binding, e.g. `userTags`.
    pub fn table_var(&self) -> String {
        to_var_name(&self.plural)
    }
}
