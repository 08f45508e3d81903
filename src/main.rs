//! Verwaltung CLI - manage employees, external employees and customers

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use verwaltung::category::CategoryResolver;
use verwaltung::config::{self, VerwaltungConfig};
use verwaltung::storage::DbStats;
use verwaltung::{
    ui, CategoryTable, ConnectionProvider, Cursor, Customer, Employee, ExternalEmployee, Person,
    PersonRecord, Record, RecordKey, RecordKind, RecordStore, SqliteConnector,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "verwaltung")]
#[command(version)]
#[command(about = "Records management for employees, external employees and customers")]
#[command(long_about = r#"
Verwaltung keeps three person registers in one SQLite database:
  • employees
  • external employees, linked to their company
  • customers, linked to their industry

Example usage:
  verwaltung init
  verwaltung add customer --key 5 --first-name Karl --last-name Kunde --industry Finance
  verwaltung next customer --from 5
  verwaltung browse external
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List all records of a kind, ordered by key
    List {
        kind: RecordKind,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the record with the given key
    Show {
        kind: RecordKind,
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        key: RecordKey,
    },

    /// Show the record with the smallest key
    First { kind: RecordKind },

    /// Show the record with the largest key
    Last { kind: RecordKind },

    /// Show the record after a key, wrapping around
    Next {
        kind: RecordKind,
        /// Key currently shown
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        from: Option<RecordKey>,
    },

    /// Show the record before a key, wrapping around
    Prev {
        kind: RecordKind,
        /// Key currently shown
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        from: Option<RecordKey>,
    },

    /// Add a record under a new key
    Add {
        kind: RecordKind,
        #[command(flatten)]
        fields: RecordFields,
    },

    /// Delete a record and show the one that takes its place
    Delete {
        kind: RecordKind,
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        key: RecordKey,
    },

    /// Step through records interactively
    Browse { kind: RecordKind },

    /// List companies or industries with their usage
    Categories { table: CategoryTable },

    /// Show row counts
    Stats,
}

#[derive(Args)]
struct RecordFields {
    /// Record key, must not be in use yet
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..))]
    key: RecordKey,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    postal_code: Option<String>,
    #[arg(long)]
    place: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Employer (external employees)
    #[arg(long)]
    company: Option<String>,
    /// Industry (customers)
    #[arg(long)]
    industry: Option<String>,
}

impl RecordFields {
    fn person(&self) -> Person {
        Person {
            key: self.key,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            street: self.street.clone(),
            postal_code: self.postal_code.clone(),
            place: self.place.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

/// Per-kind actions, run against a typed store
enum Action {
    List(OutputFormat),
    Show(RecordKey),
    First,
    Last,
    Next(Option<RecordKey>),
    Prev(Option<RecordKey>),
    Delete(RecordKey),
    Browse,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let settings = config::load_config(Some(config_path.as_path()))?.unwrap_or_default();
    let database = cli
        .database
        .clone()
        .unwrap_or_else(|| settings.database_path_in(Path::new(".")));

    let open = || -> anyhow::Result<Arc<dyn ConnectionProvider>> {
        config::ensure_db_dir(&database)?;
        let connector = settings.connector(&database);
        connector.initialize_schema()?;
        Ok(Arc::new(connector))
    };

    let (kind, action) = match cli.command {
        Commands::Init { force } => return run_init(&config_path, &database, &settings, force),
        Commands::Add { kind, fields } => return run_add(open()?, kind, &fields),
        Commands::Categories { table } => return run_categories(open()?.as_ref(), table),
        Commands::Stats => return run_stats(open()?.as_ref(), &database),
        Commands::List { kind, format } => (kind, Action::List(format)),
        Commands::Show { kind, key } => (kind, Action::Show(key)),
        Commands::First { kind } => (kind, Action::First),
        Commands::Last { kind } => (kind, Action::Last),
        Commands::Next { kind, from } => (kind, Action::Next(from)),
        Commands::Prev { kind, from } => (kind, Action::Prev(from)),
        Commands::Delete { kind, key } => (kind, Action::Delete(key)),
        Commands::Browse { kind } => (kind, Action::Browse),
    };

    let provider = open()?;
    match kind {
        RecordKind::Employee => run_action(&RecordStore::<Employee>::new(provider), action),
        RecordKind::ExternalEmployee => {
            run_action(&RecordStore::<ExternalEmployee>::new(provider), action)
        }
        RecordKind::Customer => run_action(&RecordStore::<Customer>::new(provider), action),
    }
}

fn run_init(
    config_path: &Path,
    database: &Path,
    current: &VerwaltungConfig,
    force: bool,
) -> anyhow::Result<()> {
    let settings = VerwaltungConfig {
        database: Some(database.display().to_string()),
        busy_timeout_ms: Some(current.busy_timeout().as_millis() as u64),
    };
    config::write_config(config_path, &settings, force)?;
    config::ensure_db_dir(database)?;
    SqliteConnector::open(database)?;

    ui::success(&format!("Config written to {}", config_path.display()));
    ui::success(&format!("Database ready at {}", database.display()));
    Ok(())
}

fn run_action<R: PersonRecord>(store: &RecordStore<R>, action: Action) -> anyhow::Result<()> {
    match action {
        Action::List(format) => {
            let records: Vec<Record> = store
                .find_all()?
                .into_iter()
                .map(PersonRecord::into_record)
                .collect();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Text if records.is_empty() => {
                    println!("{} No {}.", ui::Icons::EMPTY, store.kind().label().to_lowercase())
                }
                OutputFormat::Text => {
                    ui::header(&format!("{} ({})", store.kind().label(), records.len()));
                    println!("{}", ui::records_table(&records));
                }
            }
        }
        Action::Show(key) => ui::navigation(Cursor::new(store).search(key)?),
        Action::First => ui::navigation(Cursor::new(store).load()?),
        Action::Last => ui::navigation(Cursor::new(store).previous()?),
        Action::Next(from) => {
            let mut cursor = cursor_from(store, from);
            ui::navigation(cursor.next()?);
        }
        Action::Prev(from) => {
            let mut cursor = cursor_from(store, from);
            ui::navigation(cursor.previous()?);
        }
        Action::Delete(key) => {
            if !store.exists(key)? {
                ui::warn(&format!("No {} with key {}.", store.kind(), key));
                return Ok(());
            }
            let mut cursor = Cursor::at(store, key);
            let nav = cursor.delete_current()?;
            ui::success(&format!("Deleted {} {}", store.kind(), key));
            ui::navigation(nav);
        }
        Action::Browse => browse(store)?,
    }
    Ok(())
}

fn cursor_from<R: PersonRecord>(store: &RecordStore<R>, from: Option<RecordKey>) -> Cursor<'_, R> {
    match from {
        Some(key) => Cursor::at(store, key),
        None => Cursor::new(store),
    }
}

fn run_add(
    provider: Arc<dyn ConnectionProvider>,
    kind: RecordKind,
    fields: &RecordFields,
) -> anyhow::Result<()> {
    let person = fields.person();
    let record = match kind {
        RecordKind::Employee => Record::Employee(Employee::new(person)),
        RecordKind::ExternalEmployee => {
            let Some(company) = fields.company.clone() else {
                anyhow::bail!("--company is required for external employees");
            };
            Record::ExternalEmployee(ExternalEmployee::new(person, company))
        }
        RecordKind::Customer => {
            let Some(industry) = fields.industry.clone() else {
                anyhow::bail!("--industry is required for customers");
            };
            Record::Customer(Customer::new(person, industry))
        }
    };

    match &record {
        Record::Employee(e) => insert_checked(&RecordStore::new(provider), e)?,
        Record::ExternalEmployee(e) => insert_checked(&RecordStore::new(provider), e)?,
        Record::Customer(c) => insert_checked(&RecordStore::new(provider), c)?,
    }
    Ok(())
}

/// Refuse keys that are taken, then insert
fn insert_checked<R: PersonRecord + Clone>(store: &RecordStore<R>, record: &R) -> anyhow::Result<()> {
    if store.exists(record.key())? {
        ui::warn(&format!("A {} with key {} already exists.", store.kind(), record.key()));
        return Ok(());
    }
    store.insert(record)?;
    ui::success(&format!("Added {} {}", store.kind(), record.key()));
    ui::record_card(&record.clone().into_record());
    Ok(())
}

fn run_categories(provider: &dyn ConnectionProvider, table: CategoryTable) -> anyhow::Result<()> {
    let conn = provider.connect()?;
    let categories = CategoryResolver::new(table).list(&conn)?;
    if categories.is_empty() {
        println!("{} No {} entries.", ui::Icons::EMPTY, table);
    } else {
        ui::header(&format!("{} ({})", table.table(), categories.len()));
        println!("{}", ui::categories_table(&categories));
    }
    Ok(())
}

fn run_stats(provider: &dyn ConnectionProvider, database: &Path) -> anyhow::Result<()> {
    let stats = DbStats::collect(provider)?;
    ui::header(&format!("Verwaltung Statistics ({})", database.display()));
    println!("{}", ui::stats_table(&stats.rows()));
    Ok(())
}

fn browse<R: PersonRecord>(store: &RecordStore<R>) -> anyhow::Result<()> {
    let mut cursor = Cursor::new(store);
    ui::section(store.kind().label());
    ui::navigation(cursor.load()?);

    let stdin = std::io::stdin();
    loop {
        eprint!("[n]ext [p]rev [f]irst [s KEY] [d]elete [r]efresh [q]uit > ");
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut parts = line.split_whitespace();
        let result = match parts.next() {
            None => continue,
            Some("q") => break,
            Some("n") => cursor.next(),
            Some("p") => cursor.previous(),
            Some("f") => cursor.load(),
            Some("r") => cursor.refresh(),
            Some("d") => cursor.delete_current(),
            Some("s") => match parts.next().and_then(|k| k.parse::<RecordKey>().ok()) {
                Some(key) if key > 0 => cursor.search(key),
                _ => {
                    ui::warn("Usage: s KEY (a positive number)");
                    continue;
                }
            },
            Some(other) => {
                ui::warn(&format!("Unknown command '{other}'"));
                continue;
            }
        };

        match result {
            Ok(nav) => ui::navigation(nav),
            Err(e) => ui::error(&e.to_string()),
        }
    }
    Ok(())
}
