use crate::ir::{DefaultValue, Field};
use crate::relations::Association;
use crate::types::{DataType, drizzle_type};

use super::{Emitter, Model, Names, Surface};

/// `pgTable` declaration with builder-style columns, indexes and length checks.
pub struct DrizzleEmitter;

/// `relations(...)` block for one table; rendered in a separate pass.
pub struct DrizzleRelationsEmitter;

impl Emitter for DrizzleEmitter {
    fn surface(&self) -> Surface {
        Surface::DrizzleTable
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let names = Names::new(&entity.name);
        let mut out = format!(
            "export const {} = pgTable(\"{}\", {{\n",
            names.table_var(),
            entity.table_name
        );
        for field in &entity.fields {
            out.push_str(&format!("  {}: {},\n", field.name, column(field)));
        }

        let mut extras = Vec::new();
        for index in &entity.indexes {
            let builder = if index.unique { "uniqueIndex" } else { "index" };
            let columns: Vec<String> = index.fields.iter().map(|f| format!("table.{f}")).collect();
            extras.push(format!(
                "{}(\"{}_{}_idx\").on({})",
                builder,
                entity.table_name,
                index.fields.join("_"),
                columns.join(", ")
            ));
        }
        for field in &entity.fields {
            if let Some(min) = field.min_length {
                extras.push(format!(
                    "check(\"{}_{}_min_length\", sql`char_length(${{table.{}}}) >= {}`)",
                    entity.table_name, field.name, field.name, min
                ));
            }
        }

        if extras.is_empty() {
            out.push_str("});\n");
        } else {
            out.push_str("}, (table) => [\n");
            for extra in extras {
                out.push_str(&format!("  {extra},\n"));
            }
            out.push_str("]);\n");
        }
        out
    }
}

fn column(field: &Field) -> String {
    let mut col = if field.is_serial() {
        format!("serial(\"{}\")", field.name)
    } else {
        match (field.data_type, field.max_length) {
            (DataType::String, Some(len)) => format!("varchar(\"{}\", {{ length: {} }})", field.name, len),
            (dt, _) => format!("{}(\"{}\")", drizzle_type(dt), field.name),
        }
    };

    if field.primary_key {
        col.push_str(".primaryKey()");
    } else if field.required {
        col.push_str(".notNull()");
    }
    if field.unique {
        col.push_str(".unique()");
    }
    match &field.default {
        Some(DefaultValue::Now) => col.push_str(".defaultNow()"),
        Some(DefaultValue::Null) => col.push_str(".default(null)"),
        Some(DefaultValue::Bool(b)) => col.push_str(&format!(".default({b})")),
        Some(DefaultValue::Int(n)) => col.push_str(&format!(".default({n})")),
        Some(DefaultValue::Float(n)) => col.push_str(&format!(".default({n})")),
        Some(DefaultValue::Str(s)) => {
            let literal = serde_json::Value::String(s.clone()).to_string();
            col.push_str(&format!(".default({literal})"));
        }
        None => {}
    }
    col
}

impl Emitter for DrizzleRelationsEmitter {
    fn surface(&self) -> Surface {
        Surface::DrizzleRelations
    }

    fn render(&self, model: &Model<'_>) -> String {
        if model.accessors.is_empty() {
            return String::new();
        }

        let owner = Names::new(&model.entity.name);
        let owner_table = owner.table_var();
        let mut out = format!(
            "export const {owner_table}Relations = relations({owner_table}, ({{ one, many }}) => ({{\n"
        );

        for accessor in model.accessors {
            let alias = &accessor.alias;
            let line = match &accessor.association {
                Association::Joined { through, .. } => {
                    let join_table = Names::new(through).table_var();
                    format!("many({join_table}, {{ relationName: \"{alias}\" }})")
                }
                Association::Direct(lookup) if accessor.kind.is_many() => {
                    let target_table = Names::new(&lookup.entity).table_var();
                    format!("many({target_table}, {{ relationName: \"{alias}\" }})")
                }
                Association::Direct(lookup) => {
                    let target_table = Names::new(&lookup.entity).table_var();
                    format!(
                        "one({target_table}, {{ fields: [{owner_table}.{}], references: [{target_table}.{}], relationName: \"{alias}\" }})",
                        lookup.parent_key, lookup.column
                    )
                }
            };
            out.push_str(&format!("  {alias}: {line},\n"));
        }

        out.push_str("}));\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::Fixture;

    #[test]
    fn test_table_columns() {
        let fx = Fixture::sample();
        let text = fx.render(&DrizzleEmitter, "User");
        assert!(text.starts_with("export const users = pgTable(\"users\", {\n"));
        assert!(text.contains("  id: serial(\"id\").primaryKey(),\n"));
        assert!(text.contains("  email: varchar(\"email\", { length: 255 }).notNull().unique(),\n"));
        assert!(text.contains("  bio: text(\"bio\"),\n"));
        assert!(text.contains("  verified: boolean(\"verified\").notNull().default(false),\n"));
        assert!(text.contains("  created_at: timestamp(\"created_at\").notNull().defaultNow(),\n"));
        assert!(text.contains("  uniqueIndex(\"users_email_idx\").on(table.email),\n"));
    }

    #[test]
    fn test_min_length_check() {
        let fx = Fixture::sample();
        let text = fx.render(&DrizzleEmitter, "UserAuthProvider");
        assert!(text.contains(
            "  check(\"user_auth_providers_provider_name_min_length\", sql`char_length(${table.provider_name}) >= 2`),\n"
        ));
    }

    #[test]
    fn test_string_and_null_defaults() {
        let fx = Fixture::from_json(
            r#"{ "models": { "Note": { "tableName": "notes", "fields": {
                "title": { "dataType": "string", "defaultValue": "untitled \"draft\"" },
                "body": { "dataType": "text", "defaultValue": null }
            } } } }"#,
        );
        let text = fx.render(&DrizzleEmitter, "Note");
        assert!(text.contains("  title: varchar(\"title\").default(\"untitled \\\"draft\\\"\"),\n"));
        assert!(text.contains("  body: text(\"body\").default(null),\n"));
        assert!(text.ends_with("});\n"));
    }

    #[test]
    fn test_relations_pass() {
        let fx = Fixture::sample();
        let text = fx.render(&DrizzleRelationsEmitter, "User");
        assert_eq!(
            text,
            "export const usersRelations = relations(users, ({ one, many }) => ({\n  \
             authProviders: many(userAuthProviders, { relationName: \"authProviders\" }),\n  \
             tags: many(userTags, { relationName: \"tags\" }),\n\
             }));\n"
        );

        let text = fx.render(&DrizzleRelationsEmitter, "UserAuthProvider");
        assert!(text.contains(
            "  user: one(users, { fields: [userAuthProviders.user_id], references: [users.id], relationName: \"user\" }),\n"
        ));

        assert_eq!(fx.render(&DrizzleRelationsEmitter, "Tag"), "");
    }
}
