//! Category lookup tables and the lookup-or-create resolver
//!
//! Companies and industries are normalized into their own tables with a
//! generated id and a unique name. Records reference them by id; callers only
//! ever see the name.

use crate::record::RecordKind;
use crate::{Error, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The two normalized lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTable {
    /// Employer of an external employee
    Company,
    /// Industry of a customer
    Industry,
}

impl CategoryTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTable::Company => "company",
            CategoryTable::Industry => "industry",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            CategoryTable::Company => "companies",
            CategoryTable::Industry => "industries",
        }
    }

    /// Generated id column, also the foreign key column name on the record side
    pub fn id_column(&self) -> &'static str {
        match self {
            CategoryTable::Company => "company_id",
            CategoryTable::Industry => "industry_id",
        }
    }

    /// The record kind that references this table
    pub fn referenced_by(&self) -> RecordKind {
        match self {
            CategoryTable::Company => RecordKind::ExternalEmployee,
            CategoryTable::Industry => RecordKind::Customer,
        }
    }

    pub fn all() -> &'static [CategoryTable] {
        &[CategoryTable::Company, CategoryTable::Industry]
    }
}

impl FromStr for CategoryTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "company" | "companies" | "firm" => Ok(CategoryTable::Company),
            "industry" | "industries" | "sector" => Ok(CategoryTable::Industry),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for CategoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Generated by the store, never changes
    pub id: i64,
    pub name: String,
}

/// A category together with the number of records referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    #[serde(flatten)]
    pub category: Category,
    pub records: usize,
}

/// How [`CategoryResolver`] turns a name into an id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// One `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement
    #[default]
    Upsert,
    /// Select, insert, and re-select once if the insert hit the unique index
    SelectInsertReselect,
}

/// Resolves category names to ids, creating missing rows.
///
/// Runs on whatever connection or transaction the caller passes in, so the
/// category row commits or rolls back together with the record that needs it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryResolver {
    table: CategoryTable,
    strategy: ResolveStrategy,
}

impl CategoryResolver {
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table,
            strategy: ResolveStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn table(&self) -> CategoryTable {
        self.table
    }

    /// Return the id for `name`, inserting the row if it does not exist yet.
    pub fn resolve(&self, conn: &Connection, name: &str) -> Result<i64> {
        match self.strategy {
            ResolveStrategy::Upsert => self.upsert(conn, name),
            ResolveStrategy::SelectInsertReselect => self.select_insert_reselect(conn, name),
        }
    }

    /// Look up the id for `name` without creating anything
    pub fn find_id(&self, conn: &Connection, name: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT {id} FROM {table} WHERE name = ?1",
            id = self.table.id_column(),
            table = self.table.table(),
        );
        conn.query_row(&sql, [name], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    fn upsert(&self, conn: &Connection, name: &str) -> Result<i64> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let sql = format!(
            "INSERT INTO {table} (name) VALUES (?1) \
             ON CONFLICT(name) DO UPDATE SET name = excluded.name \
             RETURNING {id}",
            id = self.table.id_column(),
            table = self.table.table(),
        );
        let id: i64 = conn.query_row(&sql, [name], |row| row.get(0))?;
        tracing::debug!("Resolved {} '{}' to id {}", self.table, name, id);
        Ok(id)
    }

    fn select_insert_reselect(&self, conn: &Connection, name: &str) -> Result<i64> {
        if let Some(id) = self.find_id(conn, name)? {
            return Ok(id);
        }

        let sql = format!("INSERT INTO {} (name) VALUES (?1)", self.table.table());
        match conn.execute(&sql, [name]) {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                tracing::debug!("Created {} '{}' with id {}", self.table, name, id);
                Ok(id)
            }
            Err(err) if is_unique_violation(&err) => self.reselect_after_conflict(conn, name),
            Err(err) => Err(err.into()),
        }
    }

    /// Someone else inserted `name` between our select and insert.
    pub(crate) fn reselect_after_conflict(&self, conn: &Connection, name: &str) -> Result<i64> {
        tracing::warn!("Concurrent creation of {} '{}', re-selecting", self.table, name);
        self.find_id(conn, name)?.ok_or_else(|| Error::CategoryResolution {
            table: self.table,
            name: name.to_string(),
        })
    }

    /// All categories of this table, by name, with reference counts.
    pub fn list(&self, conn: &Connection) -> Result<Vec<CategoryUsage>> {
        let referencing = self.table.referenced_by().table();
        let sql = format!(
            "SELECT c.{id}, c.name, COUNT(r.{id}) \
             FROM {table} c \
             LEFT JOIN {referencing} r ON r.{id} = c.{id} \
             GROUP BY c.{id}, c.name \
             ORDER BY c.name",
            id = self.table.id_column(),
            table = self.table.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let records: i64 = row.get(2)?;
            Ok(CategoryUsage {
                category: Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                records: records as usize,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

/// True for a UNIQUE or PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;

    fn schema_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).unwrap();
        }
        conn
    }

    fn count(conn: &Connection, table: CategoryTable, name: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE name = ?1", table.table());
        conn.query_row(&sql, [name], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_upsert_creates_then_reuses() {
        let conn = schema_conn();
        let resolver = CategoryResolver::new(CategoryTable::Industry);

        let first = resolver.resolve(&conn, "Finance").unwrap();
        let second = resolver.resolve(&conn, "Finance").unwrap();
        let other = resolver.resolve(&conn, "Retail").unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(count(&conn, CategoryTable::Industry, "Finance"), 1);
    }

    #[test]
    fn test_three_step_creates_then_reuses() {
        let conn = schema_conn();
        let resolver = CategoryResolver::new(CategoryTable::Company)
            .with_strategy(ResolveStrategy::SelectInsertReselect);

        let first = resolver.resolve(&conn, "Acme").unwrap();
        assert_eq!(resolver.resolve(&conn, "Acme").unwrap(), first);
        assert_eq!(resolver.find_id(&conn, "Acme").unwrap(), Some(first));
        assert_eq!(count(&conn, CategoryTable::Company, "Acme"), 1);
    }

    #[test]
    fn test_strategies_agree_on_existing_rows() {
        let conn = schema_conn();
        let upsert = CategoryResolver::new(CategoryTable::Company);
        let stepwise = upsert.with_strategy(ResolveStrategy::SelectInsertReselect);

        let id = upsert.resolve(&conn, "Globex").unwrap();
        assert_eq!(stepwise.resolve(&conn, "Globex").unwrap(), id);
    }

    #[test]
    fn test_reselect_finds_row_created_by_other_writer() {
        let conn = schema_conn();
        let resolver = CategoryResolver::new(CategoryTable::Company);
        conn.execute("INSERT INTO companies (name) VALUES ('Initech')", []).unwrap();
        let expected = conn.last_insert_rowid();

        assert_eq!(resolver.reselect_after_conflict(&conn, "Initech").unwrap(), expected);
    }

    #[test]
    fn test_unresolvable_race_is_reported() {
        let conn = schema_conn();
        // The trigger makes the insert collide with a row that the failing
        // statement then rolls back, so the re-select comes up empty.
        conn.execute_batch(
            "CREATE TEMP TRIGGER racer BEFORE INSERT ON companies
             WHEN NEW.name = 'Phantom'
             BEGIN
                 INSERT INTO companies (name)
                 SELECT 'Phantom' WHERE NOT EXISTS (SELECT 1 FROM companies WHERE name = 'Phantom');
             END;",
        )
        .unwrap();

        let resolver = CategoryResolver::new(CategoryTable::Company)
            .with_strategy(ResolveStrategy::SelectInsertReselect);
        let err = resolver.resolve(&conn, "Phantom").unwrap_err();

        match err {
            Error::CategoryResolution { table, name } => {
                assert_eq!(table, CategoryTable::Company);
                assert_eq!(name, "Phantom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = schema_conn();
        conn.execute("INSERT INTO industries (name) VALUES ('Energy')", []).unwrap();
        let err = conn
            .execute("INSERT INTO industries (name) VALUES ('Energy')", [])
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));
    }

    #[test]
    fn test_list_counts_references() {
        let conn = schema_conn();
        let resolver = CategoryResolver::new(CategoryTable::Industry);
        let finance = resolver.resolve(&conn, "Finance").unwrap();
        resolver.resolve(&conn, "Agriculture").unwrap();
        conn.execute(
            "INSERT INTO customers (customer_no, industry_id) VALUES (1, ?1), (2, ?1)",
            [finance],
        )
        .unwrap();

        let listed = resolver.list(&conn).unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.category.name.as_str()).collect();
        assert_eq!(names, vec!["Agriculture", "Finance"]);
        assert_eq!(listed[0].records, 0);
        assert_eq!(listed[1].records, 2);
    }

    #[test]
    fn test_table_parsing() {
        assert_eq!("Companies".parse::<CategoryTable>().unwrap(), CategoryTable::Company);
        assert_eq!("industry".parse::<CategoryTable>().unwrap(), CategoryTable::Industry);
        assert!("region".parse::<CategoryTable>().is_err());
    }
}
