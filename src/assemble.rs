//! Runs every emitter over every entity and stitches fragments into files.
//!
//! Entities are processed in declaration order. Nothing touches the disk
//! here; the result is a list of [`Artifact`]s for [`crate::writer`].

use std::fmt::Write;
use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::emit::{
    ContractEmitter, ControllerEmitter, CreateDtoEmitter, DrizzleEmitter, DrizzleRelationsEmitter,
    Emitter, GraphqlEmitter, GraphqlSdlEmitter, GuardEmitter, Model, Names, OpenApiEmitter,
    RepositoryEmitter, SearchDtoEmitter, SequelizeAssociationsEmitter, SequelizeEmitter,
    ServiceEmitter, Surface, UpdateDtoEmitter,
};
use crate::error::GenError;
use crate::ident::{to_screaming_snake, to_var_name};
use crate::ir::{OwnerPolicy, Schema};
use crate::merge::Merger;
use crate::query::comparator_regex;
use crate::relations::resolve;
use crate::writer::WritePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative to the output root.
    pub path: PathBuf,
    pub contents: String,
    pub policy: WritePolicy,
}

/// Directories relative to the output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub resources_dir: PathBuf,
    pub reference_dir: PathBuf,
    pub generated_dir: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("resources"),
            reference_dir: PathBuf::from("generated/resources"),
            generated_dir: PathBuf::from("generated"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub artifacts: Vec<Artifact>,
}

impl Generation {
    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == PathBuf::from(path))
    }

    fn push(&mut self, path: PathBuf, contents: String, policy: WritePolicy) {
        debug!(path = %path.display(), ?policy, "artifact");
        self.artifacts.push(Artifact {
            path,
            contents,
            policy,
        });
    }
}

/// Every emitter, in the order their fragments are produced per entity.
const EMITTERS: [&dyn Emitter; 15] = [
    &ContractEmitter,
    &SequelizeEmitter,
    &SequelizeAssociationsEmitter,
    &DrizzleEmitter,
    &DrizzleRelationsEmitter,
    &GraphqlSdlEmitter,
    &GraphqlEmitter,
    &OpenApiEmitter,
    &ControllerEmitter,
    &ServiceEmitter,
    &GuardEmitter,
    &RepositoryEmitter,
    &CreateDtoEmitter,
    &UpdateDtoEmitter,
    &SearchDtoEmitter,
];

/// Fragment texts of the aggregated surfaces, in entity order.
#[derive(Default)]
struct Aggregates(IndexMap<Surface, Vec<String>>);

impl Aggregates {
    fn push(&mut self, surface: Surface, text: String) {
        self.0.entry(surface).or_default().push(text);
    }

    fn parts(&self, surface: Surface) -> &[String] {
        self.0.get(&surface).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Scaffold file for a per-entity surface, relative to a resources root.
fn scaffold_path(surface: Surface, kp: &str) -> Option<String> {
    let path = match surface {
        Surface::Controller => format!("{kp}/{kp}.controller.ts"),
        Surface::Service => format!("{kp}/{kp}.service.ts"),
        Surface::Guard => format!("{kp}/{kp}.guard.ts"),
        Surface::Repository => format!("{kp}/{kp}.repository.ts"),
        Surface::CreateDto => format!("{kp}/dto/{kp}.create.dto.ts"),
        Surface::UpdateDto => format!("{kp}/dto/{kp}.update.dto.ts"),
        Surface::SearchDto => format!("{kp}/dto/{kp}.search.dto.ts"),
        _ => return None,
    };
    Some(path)
}

/// Resolve relations, emit every surface and assemble the output set.
///
/// Any error aborts the whole run; partial aggregates are never returned.
pub fn generate(
    schema: &Schema,
    policy: &OwnerPolicy,
    layout: &OutputLayout,
) -> Result<Generation, GenError> {
    let resolved = resolve(schema)?;
    let mut merger = Merger::new(&schema.api);
    let mut agg = Aggregates::default();
    let mut generation = Generation::default();

    for entity in schema.entities.values() {
        let owner = policy.owner_field(entity);
        let model = Model {
            entity,
            accessors: resolved.for_entity(&entity.name),
            owner: &owner,
        };
        info!(
            entity = %entity.name,
            fields = entity.fields.len(),
            relations = model.accessors.len(),
            owner = owner.name(),
            "generating"
        );

        let kp = Names::new(&entity.name).kebab_plural;
        for emitter in EMITTERS {
            let fragment = emitter.emit(&model);
            if let Some(rel) = scaffold_path(fragment.surface, &kp) {
                generation.push(
                    layout.resources_dir.join(&rel),
                    fragment.text.clone(),
                    WritePolicy::SkipIfExists,
                );
                generation.push(layout.reference_dir.join(&rel), fragment.text, WritePolicy::Overwrite);
            } else if fragment.surface == Surface::OpenApi {
                merger.merge_fragment(&fragment)?;
            } else {
                agg.push(fragment.surface, fragment.text);
            }
        }
    }

    let openapi = serde_json::to_string_pretty(&merger.into_document())?;
    let gen_dir = &layout.generated_dir;
    let aggregates = [
        ("model-interfaces.ts", contracts_file(&agg)),
        ("models.sequelize.ts", sequelize_file(&agg)),
        ("models.drizzle.ts", drizzle_file(&agg)),
        ("schema.graphql.ts", graphql_file(schema, &agg)),
        ("openapi.json", format!("{openapi}\n")),
        ("model-types.enum.ts", model_types_file(schema)),
        ("repository.service.ts", repository_service_file(schema)),
        ("common.regex.ts", regex_file()),
    ];
    for (name, contents) in aggregates {
        generation.push(gen_dir.join(name), contents, WritePolicy::Overwrite);
    }

    info!(
        entities = schema.entities.len(),
        artifacts = generation.artifacts.len(),
        "generation complete"
    );
    Ok(generation)
}

fn join_nonempty(parts: &[String], sep: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(sep)
}

fn contracts_file(agg: &Aggregates) -> String {
    let mut out = String::from("export interface _BaseEntity {}\n\n");
    out.push_str(&join_nonempty(agg.parts(Surface::Contract), "\n"));
    out
}

fn sequelize_file(agg: &Aggregates) -> String {
    let mut out = String::new();
    out.push_str("import { DataTypes } from \"sequelize\";\n");
    out.push_str("import { sequelize } from \"../lib/sequelize\";\n\n");
    out.push_str(&join_nonempty(agg.parts(Surface::SequelizeModel), "\n"));
    let associations = join_nonempty(agg.parts(Surface::SequelizeAssociations), "");
    if !associations.is_empty() {
        out.push_str("\n// Associations\n\n");
        out.push_str(&associations);
    }
    out
}

fn drizzle_file(agg: &Aggregates) -> String {
    let mut out = String::new();
    out.push_str(
        "import { boolean, check, date, index, integer, json, jsonb, pgTable, real, serial, text, time, timestamp, uniqueIndex, uuid, varchar } from \"drizzle-orm/pg-core\";\n",
    );
    out.push_str("import { relations, sql } from \"drizzle-orm\";\n\n");
    out.push_str(&join_nonempty(agg.parts(Surface::DrizzleTable), "\n"));
    let rels = join_nonempty(agg.parts(Surface::DrizzleRelations), "\n");
    if !rels.is_empty() {
        out.push_str("\n// Relations\n\n");
        out.push_str(&rels);
    }
    out
}

fn graphql_file(schema: &Schema, agg: &Aggregates) -> String {
    let mut out = String::new();
    out.push_str(
        "import { GraphQLBoolean, GraphQLFloat, GraphQLInt, GraphQLList, GraphQLNonNull, GraphQLObjectType, GraphQLString } from \"graphql\";\n",
    );
    out.push_str("import { Container } from \"typedi\";\n");
    let entities: Vec<String> = schema.entities.keys().map(|n| format!("{n}Entity")).collect();
    let _ = writeln!(out, "import {{ {} }} from \"./model-interfaces\";", entities.join(", "));
    for name in schema.entities.keys() {
        let n = Names::new(name);
        let _ = writeln!(
            out,
            "import {{ {} }} from \"../resources/{kp}/{kp}.repository\";",
            n.token,
            kp = n.kebab_plural
        );
    }
    out.push_str("\nexport const typeDefs = `\n");
    out.push_str(&join_nonempty(agg.parts(Surface::GraphqlSdl), "\n"));
    out.push_str("`;\n\n");
    out.push_str(&join_nonempty(agg.parts(Surface::Graphql), "\n"));
    out
}

fn model_types_file(schema: &Schema) -> String {
    let mut out = String::from("export enum ModelTypes {\n");
    for name in schema.entities.keys() {
        let constant = to_screaming_snake(name);
        let _ = writeln!(out, "  {constant} = \"{constant}\",");
    }
    out.push_str("}\n");
    out
}

fn repository_service_file(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("import \"reflect-metadata\";\n");
    out.push_str("import { Inject, Service } from \"typedi\";\n");
    out.push_str("import { IModelCrud } from \"../lib/utils/sequelize.utils\";\n");
    let entities: Vec<String> = schema.entities.keys().map(|n| format!("{n}Entity")).collect();
    let _ = writeln!(out, "import {{ {} }} from \"./model-interfaces\";", entities.join(", "));
    for name in schema.entities.keys() {
        let n = Names::new(name);
        let _ = writeln!(
            out,
            "import {{ {} }} from \"../resources/{kp}/{kp}.repository\";",
            n.token,
            kp = n.kebab_plural
        );
    }
    out.push_str("\n@Service()\nexport class RepositoryService {\n  constructor(\n");
    for name in schema.entities.keys() {
        let n = Names::new(name);
        let _ = writeln!(
            out,
            "    @Inject({}) public readonly {}Repo: IModelCrud<{}Entity>,",
            n.token,
            to_var_name(name),
            name
        );
    }
    out.push_str("  ) {}\n}\n");
    out
}

fn regex_file() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "export const ALPHANUMERIC_SPACE_DASH_UNDERSCORE_DOT_COMMA_COLON_SLASH_REGEX = /^[a-zA-Z0-9\\s\\-\\_\\.\\,\\:\\/]{{1,250}}$/;"
    );
    let _ = writeln!(out, "export const BOOLEAN_REGEX = /^(true|false)$/;");
    let _ = writeln!(out, "export const INTEGER_REGEX = /^(\\d+)$/;");
    let _ = writeln!(out, "export const INTEGER_WITH_COMPARATOR_REGEX = {};", comparator_regex());
    out
}
