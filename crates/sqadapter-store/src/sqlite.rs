//! SQLite implementation of the store traits.
//!
//! Each index is a table named `seg_<index name>` with one column per field.
//! Index definitions are kept CBOR-encoded in the `segment_indexes` catalog
//! so an index can be resolved by name after a restart. rusqlite calls run
//! inside `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use sqadapter_core::{FieldValue, IndexDefinition, Lookup, ScalarType, Segment};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Database, KeyIter, SegmentIndex, SegmentIter};
use crate::validate::{
    key_string, key_value, primary_position, resolve_lookup, resolve_segment, to_segment,
};

/// SQLite-backed segment database.
///
/// Thread-safe via internal Mutex. Index handles share the connection.
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Handle to one SQLite-backed index.
#[derive(Clone)]
pub struct SqliteIndex {
    conn: Arc<Mutex<Connection>>,
    definition: Arc<IndexDefinition>,
    table: String,
}

impl SqliteIndex {
    fn new(conn: Arc<Mutex<Connection>>, definition: IndexDefinition) -> Self {
        let table = quote(&format!("seg_{}", definition.name));
        Self {
            conn,
            definition: Arc::new(definition),
            table,
        }
    }

    fn primary_column(&self) -> Result<String> {
        let position = primary_position(&self.definition)?;
        Ok(quote(&self.definition.fields[position].name))
    }

    fn columns(&self) -> String {
        self.definition
            .fields
            .iter()
            .map(|f| quote(&f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Poisoned(format!("connection mutex: {}", e)))
}

/// Run `f` against the connection on the blocking pool.
async fn run_blocking<F, T>(conn: Arc<Mutex<Connection>>, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = lock(&conn)?;
        f(&mut guard)
    })
    .await
    .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
}

/// Quote an identifier. Names are validated identifier-safe beforehand.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => Value::Text(s.clone()),
        FieldValue::Int64(i) => Value::Integer(*i),
    }
}

fn from_sql(data_type: ScalarType, value: Value) -> Result<FieldValue> {
    match (data_type, value) {
        (ScalarType::String, Value::Text(s)) => Ok(FieldValue::String(s)),
        (ScalarType::Int64, Value::Integer(i)) => Ok(FieldValue::Int64(i)),
        (expected, other) => Err(StoreError::SchemaMismatch(format!(
            "stored {:?} where {} expected",
            other.data_type(),
            expected.name()
        ))),
    }
}

fn create_table_sql(table: &str, definition: &IndexDefinition) -> String {
    let columns: Vec<String> = definition
        .fields
        .iter()
        .map(|f| {
            let column = match f.data_type {
                ScalarType::String => format!("{} TEXT NOT NULL DEFAULT ''", quote(&f.name)),
                ScalarType::Int64 => format!("{} INTEGER NOT NULL DEFAULT 0", quote(&f.name)),
            };
            if f.is_primary {
                column + " PRIMARY KEY"
            } else {
                column
            }
        })
        .collect();

    format!("CREATE TABLE {} ({})", table, columns.join(", "))
}

fn encode_definition(definition: &IndexDefinition) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(definition, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_definition(bytes: &[u8]) -> Result<IndexDefinition> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl Database for SqliteDatabase {
    type Index = SqliteIndex;

    async fn index_by_name(&self, name: &str) -> Result<Option<SqliteIndex>> {
        let name = name.to_string();

        let definition = run_blocking(self.conn.clone(), move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT definition FROM segment_indexes WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            bytes.as_deref().map(decode_definition).transpose()
        })
        .await?;

        Ok(definition.map(|d| SqliteIndex::new(self.conn.clone(), d)))
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<SqliteIndex> {
        definition.validate()?;

        let index = SqliteIndex::new(self.conn.clone(), definition.clone());
        let create_sql = create_table_sql(&index.table, definition);
        let encoded = encode_definition(definition)?;
        let name = definition.name.clone();

        run_blocking(self.conn.clone(), move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM segment_indexes WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StoreError::IndexExists(name));
            }

            tx.execute_batch(&create_sql)?;
            tx.execute(
                "INSERT INTO segment_indexes (name, definition, created_at) VALUES (?1, ?2, ?3)",
                params![name, encoded, migration::now_millis()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!(index = %definition.name, "created sqlite index");
        Ok(index)
    }
}

#[async_trait]
impl SegmentIndex for SqliteIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    async fn truncate(&self) -> Result<()> {
        let sql = format!("DELETE FROM {}", self.table);

        let removed = run_blocking(self.conn.clone(), move |conn| Ok(conn.execute(&sql, [])?)).await?;

        tracing::debug!(index = %self.definition.name, removed, "truncated index");
        Ok(())
    }

    async fn insert_segment(&self, segment: &Segment) -> Result<String> {
        let row = resolve_segment(&self.definition, segment)?;
        let placeholders: Vec<String> = (1..=row.values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.table,
            self.columns(),
            placeholders.join(", ")
        );
        let values: Vec<Value> = row.values.iter().map(to_sql).collect();

        run_blocking(self.conn.clone(), move |conn| {
            conn.execute(&sql, params_from_iter(values))?;
            Ok(())
        })
        .await?;

        Ok(row.key)
    }

    async fn delete_segment(&self, key: &str) -> Result<bool> {
        let key = to_sql(&key_value(&self.definition, key)?);
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.table, self.primary_column()?);

        let removed = run_blocking(self.conn.clone(), move |conn| Ok(conn.execute(&sql, [key])?)).await?;
        Ok(removed > 0)
    }

    async fn lookup(&self, lookup: &Lookup) -> Result<KeyIter> {
        let constraints = resolve_lookup(&self.definition, lookup)?;
        let primary = primary_position(&self.definition)?;
        let primary_type = self.definition.fields[primary].data_type;
        let primary_column = self.primary_column()?;

        let mut sql = format!("SELECT {} FROM {}", primary_column, self.table);
        if !constraints.is_empty() {
            let clauses: Vec<String> = constraints
                .iter()
                .enumerate()
                .map(|(i, (position, _))| {
                    format!("{} = ?{}", quote(&self.definition.fields[*position].name), i + 1)
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {}", primary_column));

        let values: Vec<Value> = constraints.iter().map(|(_, v)| to_sql(v)).collect();

        let raw: Vec<Value> = run_blocking(self.conn.clone(), move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let keys = stmt
                .query_map(params_from_iter(values), |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<Value>>>()?;
            Ok(keys)
        })
        .await?;

        Ok(Box::new(raw.into_iter().map(move |value| {
            from_sql(primary_type, value).map(|key| key_string(&key))
        })))
    }

    async fn segments(&self) -> Result<SegmentIter> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.columns(),
            self.table,
            self.primary_column()?
        );
        let width = self.definition.fields.len();

        let rows: Vec<Vec<Value>> = run_blocking(self.conn.clone(), move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<rusqlite::Result<Vec<_>>>()
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;

        let definition = Arc::clone(&self.definition);
        Ok(Box::new(rows.into_iter().map(move |row| {
            let values = definition
                .fields
                .iter()
                .zip(row)
                .map(|(field, value)| from_sql(field.data_type, value))
                .collect::<Result<Vec<_>>>()?;
            Ok(to_segment(&definition, values))
        })))
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 =
            run_blocking(self.conn.clone(), move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
                .await?;
        Ok(count as usize)
    }
}
