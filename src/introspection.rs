use serde_json::Value as JsonValue;

use crate::connection::Cursor;
use crate::error::N1qlMiddlewareDbError;

/// Metadata statement listing every index and the engine backing it.
pub const TABLE_LIST_QUERY: &str = "SELECT DISTINCT name, using FROM system:indexes";

/// One entry of the table list: an index name and its engine (`gsi`, `view`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub kind: String,
}

/// Schema introspection backed by the `system:indexes` keyspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseIntrospection;

impl DatabaseIntrospection {
    /// Run [`TABLE_LIST_QUERY`] and map each row's `name`/`using` fields.
    ///
    /// Nothing is cached; every call re-runs the statement.
    ///
    /// # Errors
    ///
    /// Propagates statement errors, and returns `InterfaceError` for a row
    /// missing either string field.
    pub async fn get_table_list(
        &self,
        cursor: &mut Cursor<'_>,
    ) -> Result<Vec<TableInfo>, N1qlMiddlewareDbError> {
        cursor.execute(TABLE_LIST_QUERY, &[]).await?;
        cursor.fetch_all()?.iter().map(table_info).collect()
    }
}

fn table_info(row: &JsonValue) -> Result<TableInfo, N1qlMiddlewareDbError> {
    let field = |key: &str| {
        row.get(key).and_then(JsonValue::as_str).ok_or_else(|| {
            N1qlMiddlewareDbError::InterfaceError(format!(
                "system:indexes row is missing string field '{key}': {row}"
            ))
        })
    };
    Ok(TableInfo {
        name: field("name")?.to_string(),
        kind: field("using")?.to_string(),
    })
}
