use crate::category::CategoryUsage;
use crate::record::{Record, RecordKey};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct RecordRow {
    #[tabled(rename = "Key")]
    pub key: RecordKey,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Street")]
    pub street: String,
    #[tabled(rename = "Postal code")]
    pub postal_code: String,
    #[tabled(rename = "Place")]
    pub place: String,
    #[tabled(rename = "Phone")]
    pub phone: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Company / Industry")]
    pub category: String,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        let person = record.person();
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let category = match record {
            Record::Employee(_) => String::from("-"),
            Record::ExternalEmployee(e) => e.company.clone(),
            Record::Customer(c) => c.industry.clone(),
        };

        Self {
            key: person.key,
            name: person.display_name(),
            street: text(&person.street),
            postal_code: text(&person.postal_code),
            place: text(&person.place),
            phone: text(&person.phone),
            email: text(&person.email),
            category,
        }
    }
}

#[derive(Tabled)]
pub struct StatRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

#[derive(Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Records")]
    pub records: usize,
}

/// Table view of a record listing. Empty input gives an empty string.
pub fn records_table(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &[(&str, usize)]) -> String {
    let rows: Vec<StatRow> = stats
        .iter()
        .map(|(table, rows)| StatRow {
            table: table.to_string(),
            rows: *rows,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn categories_table(categories: &[CategoryUsage]) -> String {
    if categories.is_empty() {
        return String::new();
    }
    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.category.id,
            name: c.category.name.clone(),
            records: c.records,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
