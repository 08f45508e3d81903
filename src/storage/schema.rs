//! Database schema definitions

/// SQL to create the companies lookup table
pub const CREATE_COMPANIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    company_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the industries lookup table
pub const CREATE_INDUSTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS industries (
    industry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the employees table
pub const CREATE_EMPLOYEES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    employee_no INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    street TEXT,
    postal_code TEXT,
    place TEXT,
    phone TEXT,
    email TEXT
)
"#;

/// SQL to create the external_employees table
/// Rows reference their employer; deleting a row leaves the company in place
pub const CREATE_EXTERNAL_EMPLOYEES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS external_employees (
    employee_no INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    street TEXT,
    postal_code TEXT,
    place TEXT,
    phone TEXT,
    email TEXT,
    company_id INTEGER NOT NULL REFERENCES companies(company_id)
)
"#;

/// SQL to create the customers table
pub const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    customer_no INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    street TEXT,
    postal_code TEXT,
    place TEXT,
    phone TEXT,
    email TEXT,
    industry_id INTEGER NOT NULL REFERENCES industries(industry_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_external_employees_company ON external_employees(company_id)",
    "CREATE INDEX IF NOT EXISTS idx_customers_industry ON customers(industry_id)",
];

/// All schema creation statements, lookup tables first
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_COMPANIES_TABLE,
        CREATE_INDUSTRIES_TABLE,
        CREATE_EMPLOYEES_TABLE,
        CREATE_EXTERNAL_EMPLOYEES_TABLE,
        CREATE_CUSTOMERS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
