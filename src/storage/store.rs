//! Generic record store
//!
//! One [`RecordStore`] per person category. The record type decides the table,
//! the key column and whether a category lookup table is joined in; all SQL is
//! derived from that once, when the store is built.

use std::marker::PhantomData;
use std::sync::Arc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use crate::category::{CategoryResolver, CategoryTable, ResolveStrategy};
use crate::record::{Person, PersonRecord, RecordKey, RecordKind};
use crate::{Error, Result};
use super::connector::ConnectionProvider;

/// Column index of the joined category name in every select
const CATEGORY_COLUMN: usize = 8;

/// SQL for one record kind
#[derive(Debug, Clone)]
struct Statements {
    by_key: String,
    all: String,
    first: String,
    last: String,
    next: String,
    previous: String,
    insert: String,
    delete: String,
    exists: String,
    count: String,
}

impl Statements {
    fn for_kind(kind: RecordKind) -> Self {
        let table = kind.table();
        let key = kind.key_column();
        let fields = "r.first_name, r.last_name, r.street, r.postal_code, r.place, r.phone, r.email";

        let (select, insert) = match kind.category_table() {
            Some(category) => {
                let id = category.id_column();
                (
                    format!(
                        "SELECT r.{key}, {fields}, c.name FROM {table} r \
                         JOIN {ctable} c ON c.{id} = r.{id}",
                        ctable = category.table(),
                    ),
                    format!(
                        "INSERT INTO {table} \
                         ({key}, first_name, last_name, street, postal_code, place, phone, email, {id}) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                    ),
                )
            }
            None => (
                format!("SELECT r.{key}, {fields}, NULL FROM {table} r"),
                format!(
                    "INSERT INTO {table} \
                     ({key}, first_name, last_name, street, postal_code, place, phone, email) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
            ),
        };

        Self {
            by_key: format!("{select} WHERE r.{key} = ?1"),
            all: format!("{select} ORDER BY r.{key} ASC"),
            first: format!("{select} ORDER BY r.{key} ASC LIMIT 1"),
            last: format!("{select} ORDER BY r.{key} DESC LIMIT 1"),
            next: format!("{select} WHERE r.{key} > ?1 ORDER BY r.{key} ASC LIMIT 1"),
            previous: format!("{select} WHERE r.{key} < ?1 ORDER BY r.{key} DESC LIMIT 1"),
            insert,
            delete: format!("DELETE FROM {table} WHERE {key} = ?1"),
            exists: format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {key} = ?1)"),
            count: format!("SELECT COUNT(*) FROM {table}"),
        }
    }
}

/// Key-ordered access to one person table.
///
/// Holds no connection and caches nothing: each call connects, runs its
/// statements and disconnects. Only a missing row is a non-error outcome.
pub struct RecordStore<R: PersonRecord> {
    provider: Arc<dyn ConnectionProvider>,
    statements: Statements,
    resolver: Option<CategoryResolver>,
    _record: PhantomData<fn() -> R>,
}

impl<R: PersonRecord> RecordStore<R> {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            statements: Statements::for_kind(R::KIND),
            resolver: R::KIND.category_table().map(CategoryResolver::new),
            _record: PhantomData,
        }
    }

    /// Choose how category names are resolved on insert
    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.resolver = self.resolver.map(|r| r.with_strategy(strategy));
        self
    }

    pub fn kind(&self) -> RecordKind {
        R::KIND
    }

    pub fn category_table(&self) -> Option<CategoryTable> {
        self.resolver.map(|r| r.table())
    }

    // ========== Lookup ==========

    /// Exact match on the key column
    pub fn find_by_key(&self, key: RecordKey) -> Result<Option<R>> {
        self.query_optional(&self.statements.by_key, [key])
    }

    /// Every record, ascending by key
    pub fn find_all(&self) -> Result<Vec<R>> {
        let conn = self.provider.connect()?;
        let mut stmt = conn.prepare(&self.statements.all)?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn exists(&self, key: RecordKey) -> Result<bool> {
        let conn = self.provider.connect()?;
        let found: bool = conn.query_row(&self.statements.exists, [key], |row| row.get(0))?;
        Ok(found)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.provider.connect()?;
        let count: i64 = conn.query_row(&self.statements.count, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Navigation ==========

    /// Record with the smallest key
    pub fn find_first(&self) -> Result<Option<R>> {
        self.query_optional(&self.statements.first, [])
    }

    /// Record with the largest key
    pub fn find_last(&self) -> Result<Option<R>> {
        self.query_optional(&self.statements.last, [])
    }

    /// Smallest key strictly greater than `key`
    pub fn find_next_strict(&self, key: RecordKey) -> Result<Option<R>> {
        self.query_optional(&self.statements.next, [key])
    }

    /// Largest key strictly less than `key`
    pub fn find_previous_strict(&self, key: RecordKey) -> Result<Option<R>> {
        self.query_optional(&self.statements.previous, [key])
    }

    /// Next record, wrapping to the first. `None` only when the table is empty.
    pub fn find_next_circular(&self, key: RecordKey) -> Result<Option<R>> {
        match self.find_next_strict(key)? {
            Some(record) => Ok(Some(record)),
            None => self.find_first(),
        }
    }

    /// Previous record, wrapping to the last. `None` only when the table is empty.
    pub fn find_previous_circular(&self, key: RecordKey) -> Result<Option<R>> {
        match self.find_previous_strict(key)? {
            Some(record) => Ok(Some(record)),
            None => self.find_last(),
        }
    }

    // ========== Mutation ==========

    /// Insert a record under its caller-chosen key.
    ///
    /// The key is not checked here; callers look it up first. For kinds with a
    /// category the name is resolved (and created if new) in the same
    /// transaction as the record row, so either both commit or neither does.
    pub fn insert(&self, record: &R) -> Result<()> {
        let mut conn = self.provider.connect()?;
        let person = record.person();

        match self.resolver {
            None => {
                execute_insert(&conn, &self.statements.insert, person, None)?;
            }
            Some(resolver) => {
                let name = record
                    .category_name()
                    .ok_or(Error::MissingCategory(resolver.table()))?;

                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let category_id = resolver.resolve(&tx, name)?;
                execute_insert(&tx, &self.statements.insert, person, Some(category_id))?;
                tx.commit()?;
            }
        }

        tracing::info!("Inserted {} {}", R::KIND, person.key);
        Ok(())
    }

    /// Delete by key. Missing keys are not an error; category rows stay.
    pub fn delete(&self, key: RecordKey) -> Result<()> {
        let conn = self.provider.connect()?;
        let removed = conn.execute(&self.statements.delete, [key])?;
        if removed == 0 {
            tracing::debug!("No {} {} to delete", R::KIND, key);
        } else {
            tracing::info!("Deleted {} {}", R::KIND, key);
        }
        Ok(())
    }

    // ========== Helpers ==========

    fn query_optional<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Option<R>> {
        let conn = self.provider.connect()?;
        conn.query_row(sql, params, Self::row_to_record)
            .optional()
            .map_err(Into::into)
    }

    /// Helper to convert a row to a record
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<R> {
        let person = Person {
            key: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            street: row.get(3)?,
            postal_code: row.get(4)?,
            place: row.get(5)?,
            phone: row.get(6)?,
            email: row.get(7)?,
        };
        let category: Option<String> = row.get(CATEGORY_COLUMN)?;

        R::from_parts(person, category).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                CATEGORY_COLUMN,
                rusqlite::types::Type::Null,
                Box::new(e),
            )
        })
    }
}

fn execute_insert(
    conn: &Connection,
    sql: &str,
    p: &Person,
    category_id: Option<i64>,
) -> rusqlite::Result<usize> {
    match category_id {
        Some(id) => conn.execute(
            sql,
            params![p.key, p.first_name, p.last_name, p.street, p.postal_code, p.place, p.phone, p.email, id],
        ),
        None => conn.execute(
            sql,
            params![p.key, p.first_name, p.last_name, p.street, p.postal_code, p.place, p.phone, p.email],
        ),
    }
}

/// Row counts across all tables
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub employees: usize,
    pub external_employees: usize,
    pub customers: usize,
    pub companies: usize,
    pub industries: usize,
}

impl DbStats {
    /// Count rows over a single connection
    pub fn collect(provider: &dyn ConnectionProvider) -> Result<Self> {
        let conn = provider.connect()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(Self {
            employees: count(RecordKind::Employee.table())?,
            external_employees: count(RecordKind::ExternalEmployee.table())?,
            customers: count(RecordKind::Customer.table())?,
            companies: count(CategoryTable::Company.table())?,
            industries: count(CategoryTable::Industry.table())?,
        })
    }

    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Employees", self.employees),
            ("External employees", self.external_employees),
            ("Customers", self.customers),
            ("Companies", self.companies),
            ("Industries", self.industries),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (label, value) in self.rows() {
            writeln!(f, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Customer, Employee, ExternalEmployee};
    use crate::storage::SqliteConnector;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<SqliteConnector>) {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::open(dir.path().join("records.db")).unwrap();
        (dir, Arc::new(connector))
    }

    fn employee(key: RecordKey) -> Employee {
        Employee::new(Person::new(key).with_name("Max", format!("Muster{key}")))
    }

    fn external(key: RecordKey, company: &str) -> ExternalEmployee {
        ExternalEmployee::new(Person::new(key).with_name("Erika", "Extern"), company)
    }

    fn customer(key: RecordKey, industry: &str) -> Customer {
        Customer::new(Person::new(key).with_name("Karl", "Kunde"), industry)
    }

    fn category_rows(connector: &SqliteConnector, table: CategoryTable, name: &str) -> i64 {
        let conn = connector.connect().unwrap();
        let sql = format!("SELECT COUNT(*) FROM {} WHERE name = ?1", table.table());
        conn.query_row(&sql, [name], |row| row.get(0)).unwrap()
    }

    fn keys<R: PersonRecord>(records: &[R]) -> Vec<RecordKey> {
        records.iter().map(|r| r.key()).collect()
    }

    #[test]
    fn test_employee_crud() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);

        let person = Person::new(4)
            .with_name("Ada", "Lovelace")
            .with_address("Hauptstr. 1", "10115", "Berlin")
            .with_contact("030 123", "ada@example.org");
        store.insert(&Employee::new(person.clone())).unwrap();

        let found = store.find_by_key(4).unwrap().unwrap();
        assert_eq!(found.person, person);
        assert!(store.exists(4).unwrap());
        assert!(store.find_by_key(5).unwrap().is_none());
        assert!(!store.exists(5).unwrap());
    }

    #[test]
    fn test_empty_table() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector);

        assert!(store.find_all().unwrap().is_empty());
        assert!(store.find_first().unwrap().is_none());
        assert!(store.find_last().unwrap().is_none());
        assert!(store.find_next_circular(1).unwrap().is_none());
        assert!(store.find_previous_circular(1).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_find_all_is_ordered_by_key() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        for key in [9, 2, 5, 1] {
            store.insert(&employee(key)).unwrap();
        }

        assert_eq!(keys(&store.find_all().unwrap()), vec![1, 2, 5, 9]);
        assert_eq!(store.find_first().unwrap().unwrap().key(), 1);
        assert_eq!(store.find_last().unwrap().unwrap().key(), 9);
    }

    #[test]
    fn test_strict_neighbours() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        for key in [1, 3, 5] {
            store.insert(&employee(key)).unwrap();
        }

        assert_eq!(store.find_next_strict(1).unwrap().unwrap().key(), 3);
        assert_eq!(store.find_next_strict(2).unwrap().unwrap().key(), 3);
        assert!(store.find_next_strict(5).unwrap().is_none());
        assert_eq!(store.find_previous_strict(5).unwrap().unwrap().key(), 3);
        assert_eq!(store.find_previous_strict(4).unwrap().unwrap().key(), 3);
        assert!(store.find_previous_strict(1).unwrap().is_none());
    }

    #[test]
    fn test_circular_wraparound() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector);
        for key in [10, 20, 30] {
            store.insert(&customer(key, "Finance")).unwrap();
        }

        let first = store.find_first().unwrap().unwrap();
        let last = store.find_last().unwrap().unwrap();
        assert_eq!(store.find_next_circular(last.key()).unwrap().unwrap(), first);
        assert_eq!(store.find_previous_circular(first.key()).unwrap().unwrap(), last);

        // Keys that are not in the table still navigate
        assert_eq!(store.find_next_circular(15).unwrap().unwrap().key(), 20);
        assert_eq!(store.find_previous_circular(15).unwrap().unwrap().key(), 10);
        assert_eq!(store.find_next_circular(99).unwrap().unwrap().key(), 10);
    }

    #[test]
    fn test_single_record_wraps_to_itself() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        store.insert(&employee(7)).unwrap();

        assert_eq!(store.find_next_circular(7).unwrap().unwrap().key(), 7);
        assert_eq!(store.find_previous_circular(7).unwrap().unwrap().key(), 7);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        store.insert(&employee(1)).unwrap();
        store.insert(&employee(2)).unwrap();

        store.delete(1).unwrap();
        store.delete(1).unwrap();
        store.delete(42).unwrap();

        assert_eq!(keys(&store.find_all().unwrap()), vec![2]);
    }

    #[test]
    fn test_delete_last_row_empties_navigation() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        store.insert(&employee(7)).unwrap();

        store.delete(7).unwrap();

        assert!(store.find_first().unwrap().is_none());
        assert!(store.find_next_circular(7).unwrap().is_none());
        assert!(store.find_next_circular(100).unwrap().is_none());
    }

    #[test]
    fn test_category_round_trip() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector.clone());

        store.insert(&customer(1, "Finance")).unwrap();
        assert_eq!(store.find_by_key(1).unwrap().unwrap().industry, "Finance");

        // Same name again, now that the category exists
        store.insert(&customer(2, "Finance")).unwrap();
        assert_eq!(store.find_by_key(2).unwrap().unwrap().industry, "Finance");
        assert_eq!(category_rows(&connector, CategoryTable::Industry, "Finance"), 1);
    }

    #[test]
    fn test_category_dedup_with_three_step_resolution() {
        let (_dir, connector) = setup();
        let store: RecordStore<ExternalEmployee> =
            RecordStore::new(connector.clone()).with_strategy(ResolveStrategy::SelectInsertReselect);

        store.insert(&external(1, "Initech")).unwrap();
        store.insert(&external(2, "Initech")).unwrap();

        assert_eq!(category_rows(&connector, CategoryTable::Company, "Initech"), 1);
        let companies: Vec<_> = store.find_all().unwrap().into_iter().map(|e| e.company).collect();
        assert_eq!(companies, vec!["Initech", "Initech"]);
    }

    #[test]
    fn test_external_employee_scenario() {
        let (_dir, connector) = setup();
        let store: RecordStore<ExternalEmployee> = RecordStore::new(connector.clone());

        store.insert(&external(5, "Acme")).unwrap();
        assert_eq!(store.find_first().unwrap().unwrap().key(), 5);

        store.insert(&external(2, "Acme")).unwrap();
        assert_eq!(store.find_first().unwrap().unwrap().key(), 2);
        assert_eq!(store.find_next_circular(2).unwrap().unwrap().key(), 5);
        assert_eq!(store.find_next_circular(5).unwrap().unwrap().key(), 2);

        assert_eq!(category_rows(&connector, CategoryTable::Company, "Acme"), 1);
        let conn = connector.connect().unwrap();
        let distinct_refs: i64 = conn
            .query_row("SELECT COUNT(DISTINCT company_id) FROM external_employees", [], |row| row.get(0))
            .unwrap();
        assert_eq!(distinct_refs, 1);
    }

    #[test]
    fn test_delete_keeps_category_rows() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector.clone());
        store.insert(&customer(1, "Mining")).unwrap();

        store.delete(1).unwrap();

        assert!(store.find_by_key(1).unwrap().is_none());
        assert_eq!(category_rows(&connector, CategoryTable::Industry, "Mining"), 1);
    }

    #[test]
    fn test_duplicate_key_is_data_access_failure() {
        let (_dir, connector) = setup();
        let store: RecordStore<Employee> = RecordStore::new(connector);
        store.insert(&employee(3)).unwrap();

        let err = store.insert(&employee(3)).unwrap_err();
        assert!(matches!(err, Error::DataAccess(_)));
    }

    #[test]
    fn test_failed_insert_rolls_back_new_category() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector.clone());
        store.insert(&customer(1, "Finance")).unwrap();

        // Key 1 is taken, so the record insert fails after "Shipping" was created
        let err = store.insert(&customer(1, "Shipping")).unwrap_err();
        assert!(matches!(err, Error::DataAccess(_)));

        assert_eq!(category_rows(&connector, CategoryTable::Industry, "Shipping"), 0);
        assert_eq!(store.find_by_key(1).unwrap().unwrap().industry, "Finance");
    }

    #[test]
    fn test_concurrent_inserts_share_new_category() {
        let (_dir, connector) = setup();
        let store: RecordStore<ExternalEmployee> = RecordStore::new(connector.clone());

        std::thread::scope(|s| {
            for worker in 0..2 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..10 {
                        store.insert(&external(worker * 100 + i + 1, "Umbrella")).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.count().unwrap(), 20);
        assert_eq!(category_rows(&connector, CategoryTable::Company, "Umbrella"), 1);
        assert!(store.find_all().unwrap().iter().all(|e| e.company == "Umbrella"));
    }

    #[test]
    fn test_schema_mismatch_surfaces_as_error() {
        let (_dir, connector) = setup();
        let store: RecordStore<Customer> = RecordStore::new(connector.clone());
        store.insert(&customer(1, "Finance")).unwrap();

        let conn = connector.connect().unwrap();
        conn.execute("PRAGMA foreign_keys = OFF", []).unwrap();
        conn.execute("DROP TABLE industries", []).unwrap();

        assert!(matches!(store.find_by_key(1), Err(Error::DataAccess(_))));
    }

    #[test]
    fn test_stats() {
        let (_dir, connector) = setup();
        let employees: RecordStore<Employee> = RecordStore::new(connector.clone());
        let customers: RecordStore<Customer> = RecordStore::new(connector.clone());
        employees.insert(&employee(1)).unwrap();
        customers.insert(&customer(1, "Retail")).unwrap();
        customers.insert(&customer(2, "Energy")).unwrap();

        let stats = DbStats::collect(connector.as_ref()).unwrap();
        assert_eq!(stats.employees, 1);
        assert_eq!(stats.customers, 2);
        assert_eq!(stats.industries, 2);
        assert_eq!(stats.companies, 0);
        assert!(stats.to_string().contains("Customers: 2"));
    }
}
