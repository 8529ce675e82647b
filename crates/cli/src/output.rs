//! Terminal rendering for command results

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// One `Header: value` line per column
    Plain,
}

/// Row view of a result record
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Severity of a one-line status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Ok,
    Failed,
    Summary,
}

/// Serialized text for JSON and YAML, `None` for the row-based formats
fn structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => Some(format!("{}\n", serde_json::to_string_pretty(value).unwrap_or_default())),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value).unwrap_or_default()),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

fn rows<T: TableDisplay>(items: &[T], format: OutputFormat) -> String {
    if let OutputFormat::Plain = format {
        return items
            .iter()
            .map(|item| {
                T::headers()
                    .iter()
                    .zip(item.row())
                    .map(|(header, value)| format!("{}: {}", header, value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n---\n");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table.to_string()
}

pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match structured(item, format) {
        Some(text) => print!("{}", text),
        None => println!("{}", rows(std::slice::from_ref(item), format)),
    }
}

pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    match structured(items, format) {
        Some(text) => print!("{}", text),
        None if items.is_empty() => println!("No items found."),
        None => println!("{}", rows(items, format)),
    }
}

/// Failures go to stderr, everything else to stdout
pub fn notice(kind: Notice, message: &str) {
    match kind {
        Notice::Ok => println!("{} {}", "ok".green().bold(), message),
        Notice::Summary => println!("{}", message.bold()),
        Notice::Failed => eprintln!("{} {}", "error".red().bold(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        code: &'static str,
        km: f64,
    }

    impl TableDisplay for Row {
        fn headers() -> Vec<&'static str> {
            vec!["Code", "Km"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.code.to_string(), format!("{:.1}", self.km)]
        }
    }

    #[test]
    fn test_plain_rows_are_separated() {
        let items = [Row { code: "KIX", km: 1.0 }, Row { code: "NRT", km: 2.0 }];
        assert_eq!(rows(&items, OutputFormat::Plain), "Code: KIX\nKm: 1.0\n---\nCode: NRT\nKm: 2.0");
    }

    #[test]
    fn test_structured_formats() {
        let item = Row { code: "KIX", km: 490.8 };
        let json = structured(&item, OutputFormat::Json).unwrap();
        assert!(json.contains("\"code\": \"KIX\""));
        assert!(structured(&item, OutputFormat::Yaml).unwrap().contains("km: 490.8"));
        assert!(structured(&item, OutputFormat::Table).is_none());
    }

    #[test]
    fn test_table_has_headers() {
        let table = rows(&[Row { code: "KIX", km: 1.0 }], OutputFormat::Table);
        assert!(table.contains("Code"));
        assert!(table.contains("KIX"));
    }
}
