//! Record types - the three person categories
//!
//! Every record shares the same contact fields ([`Person`]) and is keyed by a
//! caller-assigned integer. Two variants carry a normalized category:
//! - `Employee`: no extra attribute
//! - `ExternalEmployee`: employing company, resolved against `companies`
//! - `Customer`: industry, resolved against `industries`

use crate::category::CategoryTable;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Caller-assigned record key. Callers keep it positive; the store does not check.
pub type RecordKey = i64;

/// The person categories managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Internal employee
    Employee,
    /// Employee of an outside company
    ExternalEmployee,
    /// Customer, classified by industry
    Customer,
}

impl RecordKind {
    /// Get the string representation of the record kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Employee => "employee",
            RecordKind::ExternalEmployee => "external_employee",
            RecordKind::Customer => "customer",
        }
    }

    /// Human readable plural, for headings
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Employee => "Employees",
            RecordKind::ExternalEmployee => "External Employees",
            RecordKind::Customer => "Customers",
        }
    }

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Employee => "employees",
            RecordKind::ExternalEmployee => "external_employees",
            RecordKind::Customer => "customers",
        }
    }

    /// Name of the key column in [`RecordKind::table`]
    pub fn key_column(&self) -> &'static str {
        match self {
            RecordKind::Employee | RecordKind::ExternalEmployee => "employee_no",
            RecordKind::Customer => "customer_no",
        }
    }

    /// The lookup table this kind references, if any
    pub fn category_table(&self) -> Option<CategoryTable> {
        match self {
            RecordKind::Employee => None,
            RecordKind::ExternalEmployee => Some(CategoryTable::Company),
            RecordKind::Customer => Some(CategoryTable::Industry),
        }
    }

    /// Get all record kinds
    pub fn all() -> &'static [RecordKind] {
        &[RecordKind::Employee, RecordKind::ExternalEmployee, RecordKind::Customer]
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "employee" | "employees" | "internal" => Ok(RecordKind::Employee),
            "external_employee" | "external-employee" | "external" | "externals" => {
                Ok(RecordKind::ExternalEmployee)
            }
            "customer" | "customers" | "client" => Ok(RecordKind::Customer),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contact fields shared by every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique within its table, chosen by the caller
    pub key: RecordKey,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub place: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Person {
    /// Create a person with only the key set
    pub fn new(key: RecordKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_address(
        mut self,
        street: impl Into<String>,
        postal_code: impl Into<String>,
        place: impl Into<String>,
    ) -> Self {
        self.street = Some(street.into());
        self.postal_code = Some(postal_code.into());
        self.place = Some(place.into());
        self
    }

    pub fn with_contact(mut self, phone: impl Into<String>, email: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self.email = Some(email.into());
        self
    }

    /// "First Last", skipping missing parts
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(flatten)]
    pub person: Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEmployee {
    #[serde(flatten)]
    pub person: Person,
    /// Display name of the employing company
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub person: Person,
    /// Display name of the customer's industry
    pub industry: String,
}

impl Employee {
    pub fn new(person: Person) -> Self {
        Self { person }
    }
}

impl ExternalEmployee {
    pub fn new(person: Person, company: impl Into<String>) -> Self {
        Self {
            person,
            company: company.into(),
        }
    }
}

impl Customer {
    pub fn new(person: Person, industry: impl Into<String>) -> Self {
        Self {
            person,
            industry: industry.into(),
        }
    }
}

/// A record type the generic store can persist.
///
/// `KIND` fixes the table and key column; the category accessors are only
/// meaningful when `KIND.category_table()` is `Some`.
pub trait PersonRecord: Sized + Send {
    const KIND: RecordKind;

    fn person(&self) -> &Person;

    fn key(&self) -> RecordKey {
        self.person().key
    }

    /// Category display name, for kinds that reference a lookup table
    fn category_name(&self) -> Option<&str>;

    /// Rebuild a record from its row. `category` is the joined lookup name.
    fn from_parts(person: Person, category: Option<String>) -> Result<Self>;

    fn into_record(self) -> Record;
}

impl PersonRecord for Employee {
    const KIND: RecordKind = RecordKind::Employee;

    fn person(&self) -> &Person {
        &self.person
    }

    fn category_name(&self) -> Option<&str> {
        None
    }

    fn from_parts(person: Person, _category: Option<String>) -> Result<Self> {
        Ok(Self::new(person))
    }

    fn into_record(self) -> Record {
        Record::Employee(self)
    }
}

impl PersonRecord for ExternalEmployee {
    const KIND: RecordKind = RecordKind::ExternalEmployee;

    fn person(&self) -> &Person {
        &self.person
    }

    fn category_name(&self) -> Option<&str> {
        Some(&self.company)
    }

    fn from_parts(person: Person, category: Option<String>) -> Result<Self> {
        let company = category.ok_or(Error::MissingCategory(CategoryTable::Company))?;
        Ok(Self::new(person, company))
    }

    fn into_record(self) -> Record {
        Record::ExternalEmployee(self)
    }
}

impl PersonRecord for Customer {
    const KIND: RecordKind = RecordKind::Customer;

    fn person(&self) -> &Person {
        &self.person
    }

    fn category_name(&self) -> Option<&str> {
        Some(&self.industry)
    }

    fn from_parts(person: Person, category: Option<String>) -> Result<Self> {
        let industry = category.ok_or(Error::MissingCategory(CategoryTable::Industry))?;
        Ok(Self::new(person, industry))
    }

    fn into_record(self) -> Record {
        Record::Customer(self)
    }
}

/// Any record, tagged by its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Employee(Employee),
    ExternalEmployee(ExternalEmployee),
    Customer(Customer),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Employee(_) => RecordKind::Employee,
            Record::ExternalEmployee(_) => RecordKind::ExternalEmployee,
            Record::Customer(_) => RecordKind::Customer,
        }
    }

    pub fn person(&self) -> &Person {
        match self {
            Record::Employee(e) => &e.person,
            Record::ExternalEmployee(e) => &e.person,
            Record::Customer(c) => &c.person,
        }
    }

    pub fn key(&self) -> RecordKey {
        self.person().key
    }

    /// The category column for this record, if its kind has one
    pub fn category(&self) -> Option<(CategoryTable, &str)> {
        match self {
            Record::Employee(_) => None,
            Record::ExternalEmployee(e) => Some((CategoryTable::Company, e.company.as_str())),
            Record::Customer(c) => Some((CategoryTable::Industry, c.industry.as_str())),
        }
    }
}

impl From<Employee> for Record {
    fn from(value: Employee) -> Self {
        Record::Employee(value)
    }
}

impl From<ExternalEmployee> for Record {
    fn from(value: ExternalEmployee) -> Self {
        Record::ExternalEmployee(value)
    }
}

impl From<Customer> for Record {
    fn from(value: Customer) -> Self {
        Record::Customer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("employee".parse::<RecordKind>().unwrap(), RecordKind::Employee);
        assert_eq!("External".parse::<RecordKind>().unwrap(), RecordKind::ExternalEmployee);
        assert_eq!("customers".parse::<RecordKind>().unwrap(), RecordKind::Customer);
        assert!(matches!("supplier".parse::<RecordKind>(), Err(Error::UnknownKind(_))));
    }

    #[test]
    fn test_kind_category_tables() {
        assert_eq!(RecordKind::Employee.category_table(), None);
        assert_eq!(RecordKind::ExternalEmployee.category_table(), Some(CategoryTable::Company));
        assert_eq!(RecordKind::Customer.category_table(), Some(CategoryTable::Industry));
        assert_eq!(Employee::KIND, RecordKind::Employee);
    }

    #[test]
    fn test_record_category_column() {
        let customer: Record = Customer::new(Person::new(3), "Finance").into();
        assert_eq!(customer.kind(), RecordKind::Customer);
        assert_eq!(customer.category(), Some((CategoryTable::Industry, "Finance")));

        let employee: Record = Employee::new(Person::new(1)).into();
        assert_eq!(employee.category(), None);
        assert_eq!(employee.key(), 1);
    }

    #[test]
    fn test_from_parts_requires_category() {
        let err = ExternalEmployee::from_parts(Person::new(9), None).unwrap_err();
        assert!(matches!(err, Error::MissingCategory(CategoryTable::Company)));

        let ok = Customer::from_parts(Person::new(9), Some("Retail".into())).unwrap();
        assert_eq!(ok.industry, "Retail");
    }

    #[test]
    fn test_display_name() {
        let p = Person::new(1).with_name("Ada", "Lovelace");
        assert_eq!(p.display_name(), "Ada Lovelace");
        assert_eq!(Person::new(2).display_name(), "");
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record: Record = ExternalEmployee::new(Person::new(5), "Acme").into();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "external_employee");
        assert_eq!(json["key"], 5);
        assert_eq!(json["company"], "Acme");
    }
}
