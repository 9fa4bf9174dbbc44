//! Model descriptors: a table plus its ordered fields

use crate::error::{Error, Result};
use crate::models::field::FieldInfo;
use indexmap::IndexMap;

/// Table name plus ordered field descriptors with one primary key
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    table: String,
    fields: IndexMap<String, FieldInfo>,
    pk: String,
    engine: Option<String>,
}

impl ModelInfo {
    pub fn builder(table: impl Into<String>) -> ModelInfoBuilder {
        ModelInfoBuilder {
            table: table.into(),
            fields: Vec::new(),
            engine: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The primary key field
    pub fn pk(&self) -> &FieldInfo {
        // The builder guarantees the pk entry exists
        &self.fields[self.pk.as_str()]
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Field by physical column name
    pub fn field_by_column(&self, column: &str) -> Option<&FieldInfo> {
        self.fields.values().find(|f| f.column == column)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values()
    }

    /// Auto-increment fields
    pub fn auto_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values().filter(|f| f.auto)
    }

    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }
}

pub struct ModelInfoBuilder {
    table: String,
    fields: Vec<FieldInfo>,
    engine: Option<String>,
}

impl ModelInfoBuilder {
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// MySQL storage engine for this table
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn build(self) -> Result<ModelInfo> {
        if self.table.is_empty() {
            return Err(Error::invalid_model("table name must not be empty"));
        }

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            if field.column.is_empty() {
                return Err(Error::invalid_model(format!(
                    "field '{}' of table '{}' has an empty column name",
                    field.name, self.table
                )));
            }
            if field.auto && !field.field_type.is_numeric_key() {
                return Err(Error::invalid_model(format!(
                    "auto field '{}' of table '{}' must be an integer",
                    field.name, self.table
                )));
            }
            let name = field.name.clone();
            if fields.insert(name.clone(), field).is_some() {
                return Err(Error::invalid_model(format!(
                    "field '{}' declared twice on table '{}'",
                    name, self.table
                )));
            }
        }

        let pks: Vec<&String> = fields
            .iter()
            .filter(|(_, f)| f.pk || f.auto)
            .map(|(name, _)| name)
            .collect();

        let pk = match pks.as_slice() {
            [only] => (*only).clone(),
            [] => {
                return Err(Error::invalid_model(format!(
                    "table '{}' has no primary key",
                    self.table
                )))
            }
            _ => {
                return Err(Error::invalid_model(format!(
                    "table '{}' declares {} primary keys",
                    self.table,
                    pks.len()
                )))
            }
        };

        Ok(ModelInfo {
            table: self.table,
            fields,
            pk,
            engine: self.engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::FieldType;

    #[test]
    fn test_fields_keep_declaration_order() {
        let model = ModelInfo::builder("orders")
            .field(FieldInfo::auto("id", FieldType::BigInteger))
            .field(FieldInfo::new("name", FieldType::VarChar))
            .field(FieldInfo::new("amount", FieldType::Decimal).decimal(10, 2))
            .build()
            .unwrap();

        let names: Vec<&str> = model.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "amount"]);
        assert_eq!(model.pk().name, "id");
        assert_eq!(model.auto_fields().count(), 1);
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let err = ModelInfo::builder("logs")
            .field(FieldInfo::new("line", FieldType::Text))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        let err = ModelInfo::builder("pairs")
            .field(FieldInfo::new("a", FieldType::Integer).primary_key())
            .field(FieldInfo::new("b", FieldType::Integer).primary_key())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("2 primary keys"));
    }

    #[test]
    fn test_string_auto_field_rejected() {
        let err = ModelInfo::builder("users")
            .field(FieldInfo::auto("id", FieldType::VarChar))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn test_lookup_by_column() {
        let model = ModelInfo::builder("users")
            .field(FieldInfo::new("code", FieldType::Char).size(8).primary_key())
            .field(FieldInfo::new("email", FieldType::VarChar).column("email_address"))
            .build()
            .unwrap();

        assert_eq!(model.field_by_column("email_address").unwrap().name, "email");
        assert_eq!(model.pk().field_type, FieldType::Char);
    }
}
