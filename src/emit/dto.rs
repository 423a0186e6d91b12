use std::fmt::Write;

use crate::ir::Field;
use crate::types::SurfaceType;

use super::{Emitter, Model, Surface};

pub const STRING_SEARCH_REGEX: &str = "ALPHANUMERIC_SPACE_DASH_UNDERSCORE_DOT_COMMA_COLON_SLASH_REGEX";
pub const COMPARATOR_REGEX: &str = "INTEGER_WITH_COMPARATOR_REGEX";

pub struct CreateDtoEmitter;

pub struct UpdateDtoEmitter;

/// Query-string DTO. Numeric fields become `<field>_op` comparator strings.
pub struct SearchDtoEmitter;

impl Emitter for CreateDtoEmitter {
    fn surface(&self) -> Surface {
        Surface::CreateDto
    }

    fn render(&self, model: &Model<'_>) -> String {
        body_dto("Create", model)
    }
}

impl Emitter for UpdateDtoEmitter {
    fn surface(&self) -> Surface {
        Surface::UpdateDto
    }

    fn render(&self, model: &Model<'_>) -> String {
        body_dto("Update", model)
    }
}

fn type_check(surface: SurfaceType) -> &'static str {
    match surface {
        SurfaceType::String => "@IsString()",
        SurfaceType::Number => "@IsInt()",
        SurfaceType::Boolean => "@IsBoolean()",
    }
}

fn header(out: &mut String, entity: &str, extra: &[&str]) {
    let _ = writeln!(
        out,
        "import {{ {entity}Entity }} from \"../../../generated/model-interfaces\";"
    );
    let mut validators = vec!["IsBoolean", "IsDefined", "IsInt", "IsOptional", "IsString"];
    validators.extend_from_slice(extra);
    let _ = writeln!(out, "import {{ {} }} from \"class-validator\";", validators.join(", "));
}

fn body_dto(prefix: &str, model: &Model<'_>) -> String {
    let name = &model.entity.name;
    let mut out = String::new();
    header(&mut out, name, &[]);
    let _ = writeln!(out);
    let _ = writeln!(out, "export class {prefix}{name}Dto implements Partial<{name}Entity> {{");
    for field in &model.entity.fields {
        let _ = writeln!(out);
        let check = type_check(field.surface);
        if field.required {
            let _ = writeln!(out, "  @IsDefined()\n  {check}\n  {}: {};", field.name, field.surface.as_str());
        } else {
            let _ = writeln!(out, "  @IsOptional()\n  {check}\n  {}?: {};", field.name, field.ts_type());
        }
    }
    out.push_str("}\n");
    out
}

impl Emitter for SearchDtoEmitter {
    fn surface(&self) -> Surface {
        Surface::SearchDto
    }

    fn render(&self, model: &Model<'_>) -> String {
        let name = &model.entity.name;
        let mut out = String::new();
        header(&mut out, name, &["Matches"]);
        let _ = writeln!(
            out,
            "import {{ {STRING_SEARCH_REGEX}, {COMPARATOR_REGEX} }} from \"../../../generated/common.regex\";"
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "export class Search{name}Dto {{");
        for field in &model.entity.fields {
            let _ = writeln!(out);
            out.push_str(&search_field(field));
        }
        out.push_str("}\n");
        out
    }
}

fn search_field(field: &Field) -> String {
    match field.surface {
        SurfaceType::String => format!(
            "  @IsOptional()\n  @IsString()\n  @Matches({STRING_SEARCH_REGEX})\n  {}?: string | null;\n",
            field.name
        ),
        SurfaceType::Boolean => format!(
            "  @IsOptional()\n  @IsBoolean()\n  {}?: boolean | null;\n",
            field.name
        ),
        SurfaceType::Number => format!(
            "  @IsOptional()\n  @IsString()\n  @Matches({COMPARATOR_REGEX})\n  {}_op?: string | null;\n",
            field.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::Fixture;

    #[test]
    fn test_create_required_and_optional() {
        let fx = Fixture::sample();
        let text = fx.render(&CreateDtoEmitter, "User");
        assert!(text.contains("export class CreateUserDto implements Partial<UserEntity> {\n"));
        assert!(text.contains("  @IsDefined()\n  @IsString()\n  email: string;\n"));
        assert!(text.contains("  @IsOptional()\n  @IsString()\n  bio?: string | null;\n"));
        assert!(text.contains("  @IsOptional()\n  @IsInt()\n  age?: number | null;\n"));
        assert!(text.contains("  @IsDefined()\n  @IsBoolean()\n  verified: boolean;\n"));
    }

    #[test]
    fn test_update_shares_field_rules() {
        let fx = Fixture::sample();
        let text = fx.render(&UpdateDtoEmitter, "Tag");
        assert!(text.contains("export class UpdateTagDto implements Partial<TagEntity> {\n"));
        assert!(text.contains("  @IsDefined()\n  @IsString()\n  name: string;\n"));

        let text = fx.render(&UpdateDtoEmitter, "User");
        assert!(text.contains("export class UpdateUserDto implements Partial<UserEntity> {\n"));
        assert!(text.contains("  @IsOptional()\n  @IsString()\n  bio?: string | null;\n"));
        assert!(text.contains("  @IsOptional()\n  @IsInt()\n  age?: number | null;\n"));
    }

    #[test]
    fn test_search_rewrites_numbers() {
        let fx = Fixture::sample();
        let text = fx.render(&SearchDtoEmitter, "User");
        assert!(text.contains("  @IsOptional()\n  @IsString()\n  @Matches(INTEGER_WITH_COMPARATOR_REGEX)\n  age_op?: string | null;\n"));
        assert!(text.contains("  id_op?: string | null;\n"));
        assert!(!text.contains("  age?:"));
        assert!(text.contains(
            "  @Matches(ALPHANUMERIC_SPACE_DASH_UNDERSCORE_DOT_COMMA_COLON_SLASH_REGEX)\n  email?: string | null;\n"
        ));
        assert!(text.contains("  @IsOptional()\n  @IsBoolean()\n  verified?: boolean | null;\n"));
    }
}
