//! INSERT with generated-key retrieval
//!
//! A single-row insert either gets its key back inline, when the dialect
//! appends a RETURNING-equivalent clause, or from the driver's last insert
//! id afterwards. Inserting an explicit value into an auto field can leave
//! a sequence behind the table, so those inserts end with
//! [`Dialect::setval`].

use crate::context::ExecContext;
use crate::database::querier::Querier;
use crate::database::value::SqlValue;
use crate::dialect::{Dialect, MARK};
use crate::error::{Error, Result};
use crate::models::model::ModelInfo;

/// Values of one row, keyed by field name
pub type RowValues<'v> = [(&'v str, SqlValue)];

/// Columns and values actually sent, with the auto columns given explicitly
struct PreparedRow {
    columns: Vec<String>,
    values: Vec<SqlValue>,
    explicit_auto: Vec<String>,
}

fn prepare_row(model: &ModelInfo, values: &RowValues<'_>) -> Result<PreparedRow> {
    let mut row = PreparedRow {
        columns: Vec::with_capacity(values.len()),
        values: Vec::with_capacity(values.len()),
        explicit_auto: Vec::new(),
    };

    for (name, value) in values {
        let field = model.field(name).ok_or_else(|| {
            Error::invalid_argument(format!("unknown field '{}' on '{}'", name, model.table()))
        })?;

        if field.auto {
            if value.is_unset_key() {
                // Left out so the database generates the key
                continue;
            }
            row.explicit_auto.push(field.column.clone());
        }
        row.columns.push(field.column.clone());
        row.values.push(value.clone().typed_for(field.field_type));
    }

    Ok(row)
}

fn insert_head(dialect: &dyn Dialect, ctx: &ExecContext, model: &ModelInfo, columns: &[String]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| dialect.quote(c)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.qualify_table(ctx, model.table()),
        cols.join(", ")
    )
}

fn value_group(count: usize) -> String {
    format!("({})", vec![MARK.to_string(); count].join(", "))
}

/// Insert one row and return its primary key when it is numeric
///
/// Explicit auto-field values are inserted as given and followed by a
/// sequence resync. A generated key that the driver cannot report is an
/// [`Error::LastInsertIdUnavailable`].
pub async fn insert_one(
    dialect: &dyn Dialect,
    ctx: &ExecContext,
    querier: &dyn Querier,
    model: &ModelInfo,
    values: &RowValues<'_>,
) -> Result<Option<i64>> {
    let row = prepare_row(model, values)?;
    let pk = model.pk();

    let sql = if row.columns.is_empty() {
        format!(
            "INSERT INTO {} {}",
            dialect.qualify_table(ctx, model.table()),
            dialect.default_values_insert(model)
        )
    } else {
        insert_head(dialect, ctx, model, &row.columns) + &value_group(row.columns.len())
    };
    let mut sql = dialect.replace_marks(&sql).into_owned();

    let explicit_pk = values
        .iter()
        .find(|(name, _)| *name == pk.name)
        .filter(|(_, value)| !value.is_unset_key())
        .and_then(|(_, value)| value.as_i64());

    let id = if dialect.has_returning_id(model, Some(&mut sql)) {
        let returned = querier.query_row(ctx, &sql, row.values).await?;
        match returned.as_ref().and_then(|r| r.get_i64(0)) {
            Some(id) => Some(id),
            None => {
                return Err(Error::decode(
                    pk.column.clone(),
                    "RETURNING produced no integer key",
                ))
            }
        }
    } else {
        let result = querier.exec(ctx, &sql, row.values).await?;
        match (result.last_insert_id, explicit_pk) {
            (_, Some(id)) => Some(id),
            (Some(id), None) if pk.auto => Some(id),
            (None, None) if pk.auto => {
                return Err(Error::last_insert_id_unavailable(dialect.name()));
            }
            _ => None,
        }
    };

    if !row.explicit_auto.is_empty() {
        dialect.setval(ctx, querier, model, &row.explicit_auto).await?;
    }

    log::debug!("inserted into '{}', key {:?}", model.table(), id);
    Ok(id)
}

/// Insert several rows in one statement, returning the affected count
///
/// Every row must send the same columns; an auto field is either given in
/// all rows or in none.
pub async fn insert_multi(
    dialect: &dyn Dialect,
    ctx: &ExecContext,
    querier: &dyn Querier,
    model: &ModelInfo,
    rows: &[Vec<(&str, SqlValue)>],
) -> Result<u64> {
    let mut prepared = rows
        .iter()
        .map(|values| prepare_row(model, values))
        .collect::<Result<Vec<_>>>()?;

    let first = match prepared.first() {
        Some(first) => first,
        None => return Ok(0),
    };
    if first.columns.is_empty() {
        return Err(Error::invalid_argument("multi-row insert needs at least one column"));
    }
    if prepared.iter().any(|r| r.columns != first.columns) {
        return Err(Error::invalid_argument(
            "every row of a multi-row insert must set the same fields",
        ));
    }

    let columns = first.columns.clone();
    let explicit_auto = first.explicit_auto.clone();
    let group = value_group(columns.len());
    let groups = vec![group.as_str(); prepared.len()].join(", ");
    let sql = insert_head(dialect, ctx, model, &columns) + &groups;
    let sql = dialect.replace_marks(&sql).into_owned();

    let params: Vec<SqlValue> = prepared.iter_mut().flat_map(|r| r.values.drain(..)).collect();
    let result = querier.exec(ctx, &sql, params).await?;

    if !explicit_auto.is_empty() {
        dialect.setval(ctx, querier, model, &explicit_auto).await?;
    }

    log::debug!(
        "inserted {} rows into '{}'",
        result.rows_affected,
        model.table()
    );
    Ok(result.rows_affected)
}
