//! The `run_sql_query` tool exposed to the agent service.
//!
//! One tool, one connection: each chat turn checks out a single pooled
//! connection and every query the agent issues during that turn runs on
//! it. Rows come back as JSON objects keyed by column name, which is
//! what gets serialized into the tool output fed back to the agent.

use serde_json::{Map, Value};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, Sqlite};

use tt_domain::error::{Error, Result};
use tt_domain::tool::ToolDefinition;

/// Tool name the agent service dispatches on.
pub const SQL_TOOL_NAME: &str = "run_sql_query";

/// Tool definitions advertised on every run request.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: SQL_TOOL_NAME.to_owned(),
        description: "Execute a SQL query against the business database and \
                      return the resulting rows as JSON."
            .to_owned(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute."
                }
            },
            "required": ["query"]
        }),
    }]
}

/// Pull the query string out of tool-call arguments.
///
/// Accepts the schema-conformant object form as well as a bare JSON
/// string, which some models emit despite the schema.
pub fn parse_query_argument(arguments: &Value) -> Result<String> {
    match arguments {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::Object(map) => match map.get("query") {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            _ => Err(Error::Sql(
                "tool call is missing a 'query' argument".into(),
            )),
        },
        _ => Err(Error::Sql("tool call arguments are not a query".into())),
    }
}

/// Runs agent-issued SQL on one pooled connection for the duration of a
/// chat turn.
pub struct SqlQueryTool {
    conn: PoolConnection<Sqlite>,
}

impl SqlQueryTool {
    pub fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self { conn }
    }

    /// Run a query and return each row as a JSON object keyed by column
    /// name.
    pub async fn run_sql_query(&mut self, query: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query(query)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| Error::Sql(e.to_string()))?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut map = Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_owned(), decode_column(row, idx));
    }
    Value::Object(map)
}

/// SQLite columns are dynamically typed, so decoding is a fallback chain:
/// integer, real, text, boolean, else null.
fn decode_column(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}
