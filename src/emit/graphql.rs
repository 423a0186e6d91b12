use crate::relations::{Accessor, Association};
use crate::types::{display_type, graphql_runtime, graphql_scalar};

use super::{Emitter, Model, Names, Surface};

/// SDL `type` block.
pub struct GraphqlSdlEmitter;

/// graphql-js object type plus one resolver function per relation.
pub struct GraphqlEmitter;

impl Emitter for GraphqlSdlEmitter {
    fn surface(&self) -> Surface {
        Surface::GraphqlSdl
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let mut out = format!("type {} {{\n", entity.name);
        for field in &entity.fields {
            let bang = if field.required { "!" } else { "" };
            out.push_str(&format!(
                "  {}: {}{}\n",
                field.name,
                graphql_scalar(field.data_type),
                bang
            ));
        }
        for accessor in model.accessors {
            let lookup = accessor.association.first_hop();
            let ty = if accessor.kind.is_many() {
                format!("[{}!]!", accessor.target)
            } else {
                accessor.target.clone()
            };
            out.push_str(&format!(
                "  {}({}: {}): {}\n",
                accessor.alias,
                lookup.column,
                graphql_scalar(lookup.data_type),
                ty
            ));
        }
        out.push_str("}\n");
        out
    }
}

impl Emitter for GraphqlEmitter {
    fn surface(&self) -> Surface {
        Surface::Graphql
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let mut out = format!(
            "export const {name}Type: GraphQLObjectType = new GraphQLObjectType({{\n  name: \"{name}\",\n  fields: () => ({{\n",
            name = entity.name
        );

        for field in &entity.fields {
            let runtime = graphql_runtime(field.data_type);
            let ty = if field.required {
                format!("new GraphQLNonNull({runtime})")
            } else {
                runtime.to_string()
            };
            out.push_str(&format!("    {}: {{ type: {} }},\n", field.name, ty));
        }

        for accessor in model.accessors {
            out.push_str(&relation_field(&entity.name, accessor));
        }
        out.push_str("  }),\n});\n");

        if !model.accessors.is_empty() {
            out.push('\n');
            out.push_str(&format!("export const {}Resolvers = {{\n", entity.name));
            for accessor in model.accessors {
                out.push_str(&resolver(accessor));
            }
            out.push_str("};\n");
        }

        out
    }
}

fn relation_field(owner: &str, accessor: &Accessor) -> String {
    let lookup = accessor.association.first_hop();
    let target_type = format!("{}Type", accessor.target);
    let ty = if accessor.kind.is_many() {
        format!("new GraphQLList({target_type})")
    } else {
        target_type
    };
    format!(
        "    {alias}: {{\n      type: {ty},\n      args: {{ {col}: {{ type: {arg} }} }},\n      \
         resolve: (parent: {owner}Entity, args: {{ {col}?: {key} }}) =>\n        \
         {owner}Resolvers.{alias}(args.{col} ?? parent.{parent_key}),\n    }},\n",
        alias = accessor.alias,
        col = lookup.column,
        arg = graphql_runtime(lookup.data_type),
        key = display_type(lookup.data_type),
        parent_key = lookup.parent_key,
    )
}

fn resolver(accessor: &Accessor) -> String {
    let lookup = accessor.association.first_hop();
    let key = display_type(lookup.data_type);
    let result = accessor.contract_type();
    let find = if accessor.kind.is_many() { "findAll" } else { "findOne" };

    let body = match &accessor.association {
        Association::Direct(lookup) => {
            let token = Names::new(&lookup.entity).token;
            format!(
                "    return Container.get({token}).{find}({{ where: {{ {}: key }} }});\n",
                lookup.column
            )
        }
        Association::Joined {
            through,
            lookup,
            join_column,
            target_column,
        } => {
            let join_token = Names::new(through).token;
            let target_token = Names::new(&accessor.target).token;
            format!(
                "    const joins = await Container.get({join_token}).findAll({{ where: {{ {}: key }} }});\n    \
                 return Container.get({target_token}).{find}({{ where: {{ {target_column}: joins.map((row) => row.{join_column}) }} }});\n",
                lookup.column
            )
        }
    };

    format!(
        "  {}: async (key: {key}): Promise<{result}> => {{\n{body}  }},\n",
        accessor.alias
    )
}
