//! Field dataType and its mapping into each target type vocabulary.
//!
//! Every table is an exhaustive `match`, so a mapping gap is a compile error
//! rather than a silent default. The only runtime gap is an unknown dataType
//! string in the document, rejected by [`DataType::parse`].

use std::fmt;

use crate::error::GenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Time,
    Uuid,
    Json,
    Jsonb,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        Self::String,
        Self::Text,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Time,
        Self::Uuid,
        Self::Json,
        Self::Jsonb,
    ];

    /// Parse a document dataType. `double` and `number` are accepted as
    /// aliases of `float`.
    pub fn parse(s: &str) -> Result<Self, GenError> {
        match s {
            "string" => Ok(Self::String),
            "text" => Ok(Self::Text),
            "integer" => Ok(Self::Integer),
            "float" | "double" | "number" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::Datetime),
            "time" => Ok(Self::Time),
            "uuid" => Ok(Self::Uuid),
            "json" => Ok(Self::Json),
            "jsonb" => Ok(Self::Jsonb),
            other => Err(GenError::TypeMappingGap {
                data_type: other.to_string(),
                table: TypeTable::Surface,
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Datetime | Self::Time)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way classification shared by the TypeScript-shaped emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    String,
    Number,
    Boolean,
}

impl SurfaceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Names each table so diagnostics can say which one is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTable {
    Surface,
    Sequelize,
    Drizzle,
    GraphqlScalar,
    GraphqlRuntime,
    Display,
}

impl fmt::Display for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Surface => "surface",
            Self::Sequelize => "sequelize",
            Self::Drizzle => "drizzle",
            Self::GraphqlScalar => "graphql scalar",
            Self::GraphqlRuntime => "graphql runtime",
            Self::Display => "display",
        };
        f.write_str(name)
    }
}

/// `date` and `time` fall into the catch-all and surface as `boolean`.
pub fn surface_type(dt: DataType) -> SurfaceType {
    match dt {
        DataType::String
        | DataType::Text
        | DataType::Datetime
        | DataType::Uuid
        | DataType::Json
        | DataType::Jsonb => SurfaceType::String,
        DataType::Integer | DataType::Float => SurfaceType::Number,
        DataType::Boolean | DataType::Date | DataType::Time => SurfaceType::Boolean,
    }
}

/// `DataTypes.<NAME>` member used in `sequelize.define`.
pub fn sequelize_type(dt: DataType) -> &'static str {
    match dt {
        DataType::String => "STRING",
        DataType::Text => "TEXT",
        DataType::Integer => "INTEGER",
        DataType::Float => "FLOAT",
        DataType::Boolean => "BOOLEAN",
        DataType::Date => "DATEONLY",
        DataType::Datetime => "DATE",
        DataType::Time => "TIME",
        DataType::Uuid => "UUID",
        DataType::Json => "JSON",
        DataType::Jsonb => "JSONB",
    }
}

/// Drizzle `pg-core` column builder.
pub fn drizzle_type(dt: DataType) -> &'static str {
    match dt {
        DataType::String => "varchar",
        DataType::Text => "text",
        DataType::Integer => "integer",
        DataType::Float => "real",
        DataType::Boolean => "boolean",
        DataType::Date => "date",
        DataType::Datetime => "timestamp",
        DataType::Time => "time",
        DataType::Uuid => "uuid",
        DataType::Json => "json",
        DataType::Jsonb => "jsonb",
    }
}

pub fn graphql_scalar(dt: DataType) -> &'static str {
    match dt {
        DataType::Integer => "Int",
        DataType::Float => "Float",
        DataType::Boolean => "Boolean",
        DataType::String
        | DataType::Text
        | DataType::Date
        | DataType::Datetime
        | DataType::Time
        | DataType::Uuid
        | DataType::Json
        | DataType::Jsonb => "String",
    }
}

/// graphql-js runtime constructor for [`graphql_scalar`].
pub fn graphql_runtime(dt: DataType) -> &'static str {
    match graphql_scalar(dt) {
        "Int" => "GraphQLInt",
        "Float" => "GraphQLFloat",
        "Boolean" => "GraphQLBoolean",
        _ => "GraphQLString",
    }
}

/// TypeScript annotation used where the richer type is wanted.
pub fn display_type(dt: DataType) -> &'static str {
    match dt {
        DataType::Integer | DataType::Float => "number",
        DataType::Boolean => "boolean",
        DataType::Json | DataType::Jsonb => "Record<string, unknown>",
        DataType::String
        | DataType::Text
        | DataType::Date
        | DataType::Datetime
        | DataType::Time
        | DataType::Uuid => "string",
    }
}
