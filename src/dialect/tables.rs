//! Operator and column-type tables
//!
//! Each dialect builds its tables once, from static pairs, when it is
//! constructed. Tables are never mutated afterwards, so a dialect can be
//! shared across threads without locking.

use crate::error::{Error, Result};
use crate::models::field::FieldInfo;
use std::collections::HashMap;

/// The neutral placeholder marker used in every generated statement
pub const MARK: char = '?';

/// Logical filter operator → SQL template with exactly one [`MARK`]
#[derive(Debug, Clone)]
pub struct OperatorTable {
    dialect: &'static str,
    entries: HashMap<&'static str, &'static str>,
}

impl OperatorTable {
    pub fn new(dialect: &'static str, pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            dialect,
            entries: pairs.iter().copied().collect(),
        }
    }

    /// Look an operator up; a miss means the caller emitted an operator
    /// this dialect cannot express
    pub fn get(&self, operator: &str) -> Result<&'static str> {
        self.entries.get(operator).copied().ok_or_else(|| {
            log::error!(
                "{} dialect has no SQL for operator '{}'",
                self.dialect,
                operator
            );
            Error::unknown_operator(self.dialect, operator)
        })
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.entries.contains_key(operator)
    }

    /// Operator names, sorted
    pub fn operators(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field kind → DDL template
///
/// Templates may reference `{size}`, `{digits}`, `{decimals}`, `{precision}`
/// and `{col}`; [`TypeTable::render`] fills them from a field descriptor.
#[derive(Debug, Clone)]
pub struct TypeTable {
    dialect: &'static str,
    entries: HashMap<&'static str, &'static str>,
}

impl TypeTable {
    pub fn new(dialect: &'static str, pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            dialect,
            entries: pairs.iter().copied().collect(),
        }
    }

    /// Raw template for a kind
    pub fn get(&self, kind: &str) -> Result<&'static str> {
        self.entries.get(kind).copied().ok_or_else(|| {
            log::error!("{} dialect has no column type for '{}'", self.dialect, kind);
            Error::unknown_field_kind(self.dialect, kind)
        })
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Kind names, sorted
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Template for `kind` with every slot filled from `field`
    pub fn render(&self, kind: &str, field: &FieldInfo) -> Result<String> {
        let template = self.get(kind)?;
        fill_template(template, field)
    }
}

fn fill_template(template: &str, field: &FieldInfo) -> Result<String> {
    let mut out = template.to_string();

    if out.contains("{size}") {
        out = out.replace("{size}", &field.size_or_default().to_string());
    }

    if out.contains("{digits}") || out.contains("{decimals}") {
        let (digits, decimals) = match (field.digits, field.decimals) {
            (Some(d), Some(s)) => (d, s),
            _ => {
                return Err(Error::invalid_model(format!(
                    "decimal field '{}' needs digits and decimals",
                    field.name
                )))
            }
        };
        out = out
            .replace("{digits}", &digits.to_string())
            .replace("{decimals}", &decimals.to_string());
    }

    if out.contains("{precision}") {
        let precision = field.time_precision.ok_or_else(|| {
            Error::invalid_model(format!(
                "field '{}' uses a precision type without a precision",
                field.name
            ))
        })?;
        out = out.replace("{precision}", &precision.to_string());
    }

    if out.contains("{col}") {
        out = out.replace("{col}", &field.column);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::FieldType;

    fn sample_types() -> TypeTable {
        TypeTable::new(
            "test",
            &[
                ("string", "varchar({size})"),
                ("float64-decimal", "numeric({digits}, {decimals})"),
                ("datetime-precision", "timestamp({precision})"),
                ("uint8", "smallint CHECK(\"{col}\" >= 0)"),
                ("bool", "bool"),
            ],
        )
    }

    #[test]
    fn test_operator_miss_is_an_error() {
        let ops = OperatorTable::new("test", &[("exact", "= ?")]);
        assert_eq!(ops.get("exact").unwrap(), "= ?");

        let err = ops.get("regex").unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));
    }

    #[test]
    fn test_render_fills_slots() {
        let types = sample_types();

        let name = FieldInfo::new("name", FieldType::VarChar).size(64);
        assert_eq!(types.render("string", &name).unwrap(), "varchar(64)");

        let plain = FieldInfo::new("note", FieldType::VarChar);
        assert_eq!(types.render("string", &plain).unwrap(), "varchar(255)");

        let amount = FieldInfo::new("amount", FieldType::Decimal).decimal(10, 2);
        assert_eq!(
            types.render("float64-decimal", &amount).unwrap(),
            "numeric(10, 2)"
        );

        let level = FieldInfo::new("level", FieldType::PositiveBit).column("lvl");
        assert_eq!(
            types.render("uint8", &level).unwrap(),
            "smallint CHECK(\"lvl\" >= 0)"
        );
    }

    #[test]
    fn test_render_requires_parameters() {
        let types = sample_types();

        let amount = FieldInfo::new("amount", FieldType::Decimal);
        assert!(types.render("float64-decimal", &amount).is_err());

        let at = FieldInfo::new("at", FieldType::DateTime);
        assert!(types.render("datetime-precision", &at).is_err());

        let err = types.render("jsonb", &at).unwrap_err();
        assert!(matches!(err, Error::UnknownFieldKind { .. }));
    }
}
