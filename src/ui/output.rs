use crate::cursor::Navigation;
use crate::record::{PersonRecord, Record};
use crate::ui::theme;
use owo_colors::OwoColorize;

pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const PERSON: &str = "👤";
    pub const DATABASE: &str = "🗄️";
    pub const EMPTY: &str = "∅";
}

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

fn field(label: &str, value: Option<&str>) {
    println!(
        "  {:<12} {}",
        format!("{label}:").style(theme().label.clone()),
        value.unwrap_or("-")
    );
}

/// Print one record as a labelled block
pub fn record_card(record: &Record) {
    let person = record.person();
    println!(
        "{} {} #{}",
        Icons::PERSON,
        record.kind().label().style(theme().header.clone()),
        person.key.style(theme().key.clone())
    );
    field("First name", person.first_name.as_deref());
    field("Last name", person.last_name.as_deref());
    field("Street", person.street.as_deref());
    field("Postal code", person.postal_code.as_deref());
    field("Place", person.place.as_deref());
    field("Phone", person.phone.as_deref());
    field("Email", person.email.as_deref());

    match record {
        Record::Employee(_) => {}
        Record::ExternalEmployee(e) => {
            println!("  {:<12} {}", "Company:".style(theme().label.clone()), e.company.style(theme().category.clone()));
        }
        Record::Customer(c) => {
            println!("  {:<12} {}", "Industry:".style(theme().label.clone()), c.industry.style(theme().category.clone()));
        }
    }
}

/// Render the outcome of a cursor move
pub fn navigation<R: PersonRecord>(nav: Navigation<R>) {
    match nav {
        Navigation::Shown(record) => record_card(&record.into_record()),
        Navigation::Empty => println!("{} No records.", Icons::EMPTY),
        Navigation::NotFound(key) => warn(&format!("No record with key {key}.")),
    }
}
