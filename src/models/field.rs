//! Field descriptors read by the dialect layer
//!
//! The model-metadata system owns these; dialects only read them to pick a
//! column type, decide on RETURNING support, or wrap a filtered column.

use serde::{Deserialize, Serialize};

/// Logical storage kind of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    VarChar,
    Char,
    Text,
    Time,
    Date,
    DateTime,
    /// 8-bit signed integer
    Bit,
    SmallInteger,
    Integer,
    BigInteger,
    /// 8-bit unsigned integer
    PositiveBit,
    PositiveSmallInteger,
    PositiveInteger,
    PositiveBigInteger,
    Float,
    Decimal,
    Json,
    Jsonb,
}

impl FieldType {
    /// Signed integer kinds
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::Bit | FieldType::SmallInteger | FieldType::Integer | FieldType::BigInteger
        )
    }

    /// Unsigned integer kinds
    pub fn is_positive_integer(&self) -> bool {
        matches!(
            self,
            FieldType::PositiveBit
                | FieldType::PositiveSmallInteger
                | FieldType::PositiveInteger
                | FieldType::PositiveBigInteger
        )
    }

    pub fn is_numeric_key(&self) -> bool {
        self.is_integer() || self.is_positive_integer()
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::VarChar | FieldType::Char | FieldType::Text
        )
    }

    /// Type-table key for this kind, before any format variant is applied
    pub fn kind_key(&self) -> &'static str {
        match self {
            FieldType::Boolean => "bool",
            FieldType::VarChar => "string",
            FieldType::Char => "string-char",
            FieldType::Text => "string-text",
            FieldType::Time => "time-clock",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Bit => "int8",
            FieldType::SmallInteger => "int16",
            FieldType::Integer => "int32",
            FieldType::BigInteger => "int64",
            FieldType::PositiveBit => "uint8",
            FieldType::PositiveSmallInteger => "uint16",
            FieldType::PositiveInteger => "uint32",
            FieldType::PositiveBigInteger => "uint64",
            FieldType::Float => "float64",
            FieldType::Decimal => "float64-decimal",
            FieldType::Json => "json",
            FieldType::Jsonb => "jsonb",
        }
    }
}

/// Default VARCHAR length when a string field declares none
pub const DEFAULT_STRING_SIZE: u32 = 255;

/// Describes one model column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Logical field name used by the query layer
    pub name: String,
    /// Physical column name
    pub column: String,
    pub field_type: FieldType,
    /// Database-generated key
    pub auto: bool,
    pub pk: bool,
    pub null: bool,
    pub unique: bool,
    pub index: bool,
    pub size: Option<u32>,
    pub digits: Option<u32>,
    pub decimals: Option<u32>,
    pub time_precision: Option<u32>,
    /// Raw SQL default expression
    pub default: Option<String>,
    pub description: Option<String>,
}

impl FieldInfo {
    /// New field whose column name equals its logical name
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            field_type,
            auto: false,
            pk: false,
            null: false,
            unique: false,
            index: false,
            size: None,
            digits: None,
            decimals: None,
            time_precision: None,
            default: None,
            description: None,
        }
    }

    /// Auto-increment primary key
    pub fn auto(name: impl Into<String>, field_type: FieldType) -> Self {
        let mut field = Self::new(name, field_type);
        field.auto = true;
        field.pk = true;
        field
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn decimal(mut self, digits: u32, decimals: u32) -> Self {
        self.digits = Some(digits);
        self.decimals = Some(decimals);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.time_precision = Some(precision);
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn size_or_default(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_STRING_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_classification() {
        assert!(FieldType::BigInteger.is_integer());
        assert!(!FieldType::BigInteger.is_positive_integer());
        assert!(FieldType::PositiveInteger.is_positive_integer());
        assert!(FieldType::PositiveInteger.is_numeric_key());
        assert!(!FieldType::VarChar.is_numeric_key());
        assert!(!FieldType::Decimal.is_numeric_key());
    }

    #[test]
    fn test_auto_field_is_primary_key() {
        let id = FieldInfo::auto("id", FieldType::BigInteger);
        assert!(id.auto);
        assert!(id.pk);
        assert_eq!(id.column, "id");
    }

    #[test]
    fn test_builder_flags() {
        let field = FieldInfo::new("email", FieldType::VarChar)
            .column("email_address")
            .size(120)
            .unique()
            .nullable();

        assert_eq!(field.column, "email_address");
        assert_eq!(field.size_or_default(), 120);
        assert!(field.unique && field.null && !field.pk);
        assert_eq!(FieldInfo::new("x", FieldType::VarChar).size_or_default(), 255);
    }
}
