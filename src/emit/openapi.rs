use serde_json::{Map, Value, json};

use crate::ident::to_sentence;
use crate::ir::{Entity, Field};
use crate::query::{Comparator, ComparatorExpr};
use crate::types::{DataType, SurfaceType};

use super::{Emitter, Model, Names, Surface};

/// OpenAPI 3.0 fragment: `paths` and `components.schemas` for one entity.
///
/// Fragments are combined by [`crate::merge::Merger`]; this emitter never sees
/// the base document.
pub struct OpenApiEmitter;

impl OpenApiEmitter {
    pub fn document(&self, model: &Model<'_>) -> Value {
        let entity = model.entity;
        let names = Names::new(&entity.name);
        let name = &names.model;
        let plural = &names.plural;
        let base = format!("/{}", names.kebab_plural);

        let properties: Map<String, Value> = entity
            .fields
            .iter()
            .map(|f| (f.name.clone(), property(f)))
            .collect();
        let required: Vec<&str> = entity
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        let example: Map<String, Value> = entity
            .fields
            .iter()
            .map(|f| (f.name.clone(), example_value(f)))
            .collect();

        let entity_ref = json!({ "$ref": format!("#/components/schemas/{name}Entity") });
        let entity_list = json!({ "type": "array", "items": entity_ref });
        let id_param = id_parameter(entity);
        let body = |dto: &str| {
            json!({
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{dto}{name}Dto") },
                        "example": example,
                    }
                }
            })
        };
        let ok = |description: String, schema: &Value| {
            json!({ "description": description, "content": { "application/json": { "schema": schema } } })
        };
        let not_found = json!({ "description": format!("{name} not found") });

        let mut paths = Map::new();
        paths.insert(
            base.clone(),
            json!({
                "get": {
                    "tags": [name],
                    "summary": format!("Get all {plural}"),
                    "operationId": format!("get{plural}"),
                    "parameters": [],
                    "responses": { "200": ok(format!("List of {plural}"), &entity_list) },
                },
                "post": {
                    "tags": [name],
                    "summary": format!("Create a new {name}"),
                    "operationId": format!("create{name}"),
                    "requestBody": body("Create"),
                    "responses": { "201": ok(format!("Created {name}"), &entity_ref) },
                },
            }),
        );
        paths.insert(
            format!("{base}/search"),
            json!({
                "get": {
                    "tags": [name],
                    "summary": format!("Get {plural} by search"),
                    "operationId": format!("search{plural}"),
                    "parameters": entity.fields.iter().map(search_parameter).collect::<Vec<_>>(),
                    "responses": { "200": ok(format!("List of {plural}"), &entity_list) },
                }
            }),
        );
        paths.insert(
            format!("{base}/{{id}}"),
            json!({
                "get": {
                    "tags": [name],
                    "summary": format!("Get {name} by ID"),
                    "operationId": format!("get{name}ById"),
                    "parameters": [id_param],
                    "responses": { "200": ok(format!("{name} found"), &entity_ref), "404": not_found },
                },
                "put": {
                    "tags": [name],
                    "summary": format!("Update {name} by ID"),
                    "operationId": format!("update{name}"),
                    "parameters": [id_param],
                    "requestBody": body("Update"),
                    "responses": { "200": ok(format!("{name} updated"), &entity_ref), "404": not_found },
                },
                "patch": {
                    "tags": [name],
                    "summary": format!("Patch {name} by ID"),
                    "operationId": format!("patch{name}"),
                    "parameters": [id_param],
                    "requestBody": body("Update"),
                    "responses": { "200": ok(format!("{name} updated"), &entity_ref), "404": not_found },
                },
                "delete": {
                    "tags": [name],
                    "summary": format!("Delete {name} by ID"),
                    "operationId": format!("delete{name}"),
                    "parameters": [id_param],
                    "responses": { "204": { "description": format!("{name} deleted") }, "404": not_found },
                },
            }),
        );

        let dto_schema = |kind: &str| {
            json!({
                "type": "object",
                "description": format!("{kind} {name} DTO"),
                "properties": properties,
            })
        };
        let mut schemas = Map::new();
        schemas.insert(
            format!("{name}Entity"),
            json!({
                "type": "object",
                "description": format!("{name} entity"),
                "properties": properties,
                "required": required,
            }),
        );
        for kind in ["Create", "Update", "Search"] {
            schemas.insert(format!("{kind}{name}Dto"), dto_schema(kind));
        }

        json!({ "paths": paths, "components": { "schemas": schemas } })
    }
}

impl Emitter for OpenApiEmitter {
    fn surface(&self) -> Surface {
        Surface::OpenApi
    }

    fn render(&self, model: &Model<'_>) -> String {
        serde_json::to_string_pretty(&self.document(model)).unwrap_or_default()
    }
}

fn schema_type(field: &Field) -> &'static str {
    match field.data_type {
        DataType::Integer => "integer",
        DataType::Float => "number",
        DataType::Boolean => "boolean",
        _ => "string",
    }
}

fn schema_format(field: &Field) -> Option<&'static str> {
    if field.is_timestamp() {
        return Some("date-time");
    }
    match field.data_type {
        DataType::Integer => Some("int64"),
        DataType::Float => Some("double"),
        DataType::Uuid => Some("uuid"),
        _ => None,
    }
}

fn property(field: &Field) -> Value {
    let mut prop = Map::new();
    prop.insert("type".into(), json!(schema_type(field)));
    if let Some(format) = schema_format(field) {
        prop.insert("format".into(), json!(format));
    }
    prop.insert("description".into(), json!(to_sentence(&field.name)));
    Value::Object(prop)
}

fn example_value(field: &Field) -> Value {
    if field.is_timestamp() {
        return json!("2024-01-01T00:00:00Z");
    }
    match schema_type(field) {
        "integer" | "number" => json!(1),
        "boolean" => json!(true),
        _ => json!(""),
    }
}

fn id_parameter(entity: &Entity) -> Value {
    let mut schema = Map::new();
    match entity.field(entity.primary_key()) {
        Some(pk) => {
            schema.insert("type".into(), json!(schema_type(pk)));
            if let Some(format) = schema_format(pk) {
                schema.insert("format".into(), json!(format));
            }
        }
        None => {
            schema.insert("type".into(), json!("integer"));
            schema.insert("format".into(), json!("int64"));
        }
    }
    json!({
        "name": "id",
        "in": "path",
        "description": format!("ID of {}", entity.name),
        "required": true,
        "schema": schema,
    })
}

// Query strings are untyped; numeric fields travel as comparator expressions.
fn search_parameter(field: &Field) -> Value {
    match field.surface {
        SurfaceType::Number => {
            let example = ComparatorExpr {
                op: Comparator::Eq,
                operands: vec![1],
            };
            json!({
                "name": format!("{}_op", field.name),
                "in": "query",
                "required": false,
                "description": to_sentence(&field.name),
                "schema": { "type": "string" },
                "example": example.to_string(),
            })
        }
        SurfaceType::Boolean => json!({
            "name": field.name,
            "in": "query",
            "required": false,
            "description": to_sentence(&field.name),
            "schema": { "type": "boolean" },
        }),
        SurfaceType::String => json!({
            "name": field.name,
            "in": "query",
            "required": false,
            "description": to_sentence(&field.name),
            "schema": { "type": "string" },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::Fixture;
    use crate::ir::OwnerField;

    fn user_document() -> Value {
        let fx = Fixture::sample();
        let entity = fx.schema.entity("User").unwrap();
        let owner = OwnerField::Fallback("owner_id");
        let model = Model {
            entity,
            accessors: fx.resolved.for_entity("User"),
            owner: &owner,
        };
        OpenApiEmitter.document(&model)
    }

    #[test]
    fn test_paths_and_operation_ids() {
        let doc = user_document();
        let paths = doc["paths"].as_object().unwrap();
        let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/users", "/users/search", "/users/{id}"]);
        assert_eq!(doc["paths"]["/users"]["get"]["operationId"], "getUsers");
        assert_eq!(doc["paths"]["/users"]["post"]["operationId"], "createUser");
        assert_eq!(doc["paths"]["/users/search"]["get"]["operationId"], "searchUsers");
        assert_eq!(doc["paths"]["/users/{id}"]["get"]["operationId"], "getUserById");
        assert_eq!(doc["paths"]["/users/{id}"]["patch"]["operationId"], "patchUser");
        assert_eq!(doc["paths"]["/users/{id}"]["delete"]["operationId"], "deleteUser");
    }

    #[test]
    fn test_entity_schema_properties() {
        let doc = user_document();
        let schema = &doc["components"]["schemas"]["UserEntity"];
        assert_eq!(schema["required"], json!(["id", "email", "verified", "created_at"]));
        assert_eq!(schema["properties"]["id"], json!({ "type": "integer", "format": "int64", "description": "Id" }));
        assert_eq!(
            schema["properties"]["created_at"],
            json!({ "type": "string", "format": "date-time", "description": "Created at" })
        );
        assert_eq!(schema["properties"]["bio"], json!({ "type": "string", "description": "Bio" }));
        for dto in ["CreateUserDto", "UpdateUserDto", "SearchUserDto"] {
            assert!(doc["components"]["schemas"][dto].is_object(), "{dto}");
        }
    }

    #[test]
    fn test_search_parameters_use_comparators() {
        let doc = user_document();
        let params = doc["paths"]["/users/search"]["get"]["parameters"].as_array().unwrap();
        let age = params.iter().find(|p| p["name"] == "age_op").unwrap();
        assert_eq!(age["example"], "eq<1>");
        assert!(params.iter().any(|p| p["name"] == "email"));
        assert!(!params.iter().any(|p| p["name"] == "age"));
    }

    #[test]
    fn test_request_example() {
        let doc = user_document();
        let example = &doc["paths"]["/users"]["post"]["requestBody"]["content"]["application/json"]["example"];
        assert_eq!(example["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(example["age"], 1);
        assert_eq!(example["verified"], true);
        assert_eq!(example["email"], "");
    }
}
