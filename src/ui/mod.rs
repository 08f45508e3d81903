pub mod output;
pub mod table;
pub mod theme;

pub use output::{error, header, navigation, record_card, section, success, warn, Icons};
pub use table::{categories_table, records_table, stats_table};
pub use theme::{theme, Theme};
