//! Model metadata and the statement builders driven by it

pub mod ddl;
pub mod field;
pub mod filter;
pub mod insert;
pub mod model;
pub mod query;

pub use ddl::{create_table_sql, sync_table, CreateTableSql, IndexDefinition};
pub use field::{FieldInfo, FieldType, DEFAULT_STRING_SIZE};
pub use filter::{render_where, Condition, Connector, ModelFilter};
pub use insert::{insert_multi, insert_one};
pub use model::{ModelInfo, ModelInfoBuilder};
pub use query::{ModelQuery, OrderDirection, Statement};
