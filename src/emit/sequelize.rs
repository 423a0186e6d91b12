use crate::ir::RelationKind;
use crate::relations::Association;
use crate::types::sequelize_type;

use super::{Emitter, Model, Surface};

/// `sequelize.define` with one column per field, plus composite indexes.
pub struct SequelizeEmitter;

/// `Model.hasOne/hasMany/belongsTo/belongsToMany` statements. Kept apart
/// from the defines so every model exists before it is associated.
pub struct SequelizeAssociationsEmitter;

impl Emitter for SequelizeEmitter {
    fn surface(&self) -> Surface {
        Surface::SequelizeModel
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let mut out = format!(
            "export const {} = sequelize.define(\"{}\", {{\n",
            entity.name, entity.table_name
        );

        for field in &entity.fields {
            out.push_str(&format!(
                "  {}: {{ type: DataTypes.{}, allowNull: {}",
                field.name,
                sequelize_type(field.data_type),
                !field.required
            ));
            if field.primary_key {
                out.push_str(", primaryKey: true");
                if field.is_serial() {
                    out.push_str(", autoIncrement: true");
                }
            }
            if field.unique {
                out.push_str(", unique: true");
            }
            out.push_str(" },\n");
        }

        if entity.indexes.is_empty() {
            out.push_str("});\n");
        } else {
            out.push_str("}, {\n  indexes: [\n");
            for index in &entity.indexes {
                let fields: Vec<String> = index.fields.iter().map(|f| format!("\"{f}\"")).collect();
                out.push_str(&format!(
                    "    {{ unique: {}, fields: [{}] }},\n",
                    index.unique,
                    fields.join(", ")
                ));
            }
            out.push_str("  ],\n});\n");
        }

        out
    }
}

impl Emitter for SequelizeAssociationsEmitter {
    fn surface(&self) -> Surface {
        Surface::SequelizeAssociations
    }

    fn render(&self, model: &Model<'_>) -> String {
        let owner = &model.entity.name;
        let mut out = String::new();

        for accessor in model.accessors {
            let lookup = accessor.association.first_hop();
            let mut options = format!("as: \"{}\"", accessor.alias);

            // Sequelize only accepts `through` on belongsToMany.
            let method = match (&accessor.association, accessor.kind) {
                (Association::Joined { through, join_column, .. }, _) => {
                    options.push_str(&format!(
                        ", through: {}, foreignKey: \"{}\", otherKey: \"{}\"",
                        through, lookup.column, join_column
                    ));
                    if lookup.parent_key != model.entity.primary_key() {
                        options.push_str(&format!(", sourceKey: \"{}\"", lookup.parent_key));
                    }
                    "belongsToMany"
                }
                (Association::Direct(_), RelationKind::HasOne | RelationKind::HasMany) => {
                    options.push_str(&format!(
                        ", foreignKey: \"{}\", sourceKey: \"{}\"",
                        lookup.column, lookup.parent_key
                    ));
                    if accessor.kind.is_many() { "hasMany" } else { "hasOne" }
                }
                (Association::Direct(_), RelationKind::BelongsToOne | RelationKind::BelongsToMany) => {
                    options.push_str(&format!(
                        ", foreignKey: \"{}\", targetKey: \"{}\"",
                        lookup.parent_key, lookup.column
                    ));
                    if accessor.kind.is_many() { "belongsToMany" } else { "belongsTo" }
                }
            };

            out.push_str(&format!(
                "{}.{}({}, {{ {} }});\n",
                owner, method, accessor.target, options
            ));
        }

        out
    }
}
