use std::fmt::Write;

use super::{Emitter, Model, Surface};

/// TypeScript entity interface. Plain fields first, relations after.
pub struct ContractEmitter;

impl Emitter for ContractEmitter {
    fn surface(&self) -> Surface {
        Surface::Contract
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let mut out = String::new();

        let _ = writeln!(out, "export interface {}Entity extends _BaseEntity {{", entity.name);
        for field in &entity.fields {
            let _ = writeln!(out, "  {}: {};", field.name, field.ts_type());
        }

        if !model.accessors.is_empty() {
            out.push('\n');
            for accessor in model.accessors {
                let _ = writeln!(out, "  {}?: {};", accessor.alias, accessor.contract_type());
            }
        }

        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::Fixture;

    #[test]
    fn test_contract_fields_then_relations() {
        let fx = Fixture::sample();
        let text = fx.render(&ContractEmitter, "User");
        let expected = "\
export interface UserEntity extends _BaseEntity {
  id: number;
  email: string;
  bio: string | null;
  age: number | null;
  verified: boolean;
  created_at: string;

  authProviders?: UserAuthProviderEntity[];
  tags?: TagEntity[];
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_contract_without_relations() {
        let fx = Fixture::sample();
        let text = fx.render(&ContractEmitter, "Tag");
        assert!(text.ends_with("  name: string;\n}\n"));
    }

    #[test]
    fn test_has_many_yields_optional_array() {
        let fx = Fixture::from_json(
            r#"{
                "models": {
                    "A": { "tableName": "as", "fields": { "s": { "dataType": "integer", "primaryKey": true } } },
                    "B": { "tableName": "bs", "fields": { "f": { "dataType": "integer" } } }
                },
                "relationships": { "A": { "hasMany": { "B": { "alias": "bs", "foreignKey": "f", "sourceKey": "s" } } } }
            }"#,
        );
        let text = fx.render(&ContractEmitter, "A");
        assert!(text.contains("  bs?: BEntity[];\n"));
    }
}
