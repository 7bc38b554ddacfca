use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

use gridsift::config::Config;
use gridsift::logging::LOG_FILE;
use gridsift::core::{CombineMode, FilterRegistry, FrameSource, TabularSource};
use gridsift::services::{FilterView, SortKey};
use gridsift::tui::{render_to_lines, ResultsTable};

/// Filter and sort the rows of a CSV file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with a header row
    #[arg(long = "data", value_name = "CSV")]
    data: PathBuf,
    /// Filter document (JSON) to apply
    #[arg(long = "filters", value_name = "JSON")]
    filters: Option<PathBuf>,
    /// Combine column filters with AND or OR (overrides the document)
    #[arg(long = "mode", value_enum, ignore_case = true)]
    mode: Option<ModeArg>,
    /// Evaluate these column indices first, e.g. 2,0
    #[arg(long = "column-order", value_delimiter = ',', value_name = "INDICES")]
    column_order: Option<Vec<usize>>,
    /// Sort by a column name or index, optionally suffixed with :desc. Repeatable.
    #[arg(long = "sort", value_name = "COLUMN[:desc]")]
    sort: Vec<String>,
    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Enable file logging at the given level (overrides GRIDSIFT_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ModeArg { And, Or }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Table, Csv }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn)  => Some(tracing::Level::WARN),
        Some(LogLevel::Info)  => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => None,
    };
    let cfg = Config::from_path(args.config.as_ref()).wrap_err("failed to load configuration")?;
    gridsift::logging::init_with(Some(cfg.config.data_dir.join(LOG_FILE.as_str())), level)?;
    let source = FrameSource::read_csv(&args.data)
        .wrap_err_with(|| format!("failed to read {}", args.data.display()))?;
    let mut view = FilterView::new(source)
        .with_config(&cfg)
        .with_theme(cfg.display.theme());

    if let Some(registry) = load_registry(&args)? {
        view.replace_filters(registry);
    }

    let keys = args
        .sort
        .iter()
        .map(|spec| parse_sort_key(spec, view.column_names()))
        .collect::<Result<Vec<_>>>()?;
    if !keys.is_empty() {
        view.set_sort(keys);
    }

    match args.format {
        OutputFormat::Table => print_table(&view, &cfg)?,
        OutputFormat::Csv => write_csv(&view)?,
    }
    eprintln!("{}", view.status_line());
    Ok(())
}

/// Filter document from `--filters`, with `--mode` and `--column-order` on top.
fn load_registry(args: &Args) -> Result<Option<FilterRegistry>> {
    let mut registry = match &args.filters {
        Some(path) => {
            let parsed = FilterRegistry::load_from_file(path)
                .wrap_err_with(|| format!("failed to load filters from {}", path.display()))?;
            for warning in &parsed.warnings {
                eprintln!("warning: {warning}");
            }
            parsed.registry
        }
        None if args.mode.is_some() || args.column_order.is_some() => FilterRegistry::default(),
        None => return Ok(None),
    };
    if let Some(mode) = args.mode {
        registry.inter_mode = match mode {
            ModeArg::And => CombineMode::And,
            ModeArg::Or => CombineMode::Or,
        };
    }
    if let Some(order) = &args.column_order {
        registry.column_order = Some(order.clone());
    }
    debug!("filters: {}", registry.to_spec());
    Ok(Some(registry))
}

/// `name`, `index`, `name:desc` or `name:asc`.
fn parse_sort_key(spec: &str, columns: &[String]) -> Result<SortKey> {
    let (name, descending) = match spec.rsplit_once(':') {
        Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, true),
        Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, false),
        _ => (spec, false),
    };
    let column = columns
        .iter()
        .position(|c| c == name)
        .or_else(|| name.parse::<usize>().ok().filter(|&i| i < columns.len()))
        .ok_or_else(|| eyre!("unknown sort column '{name}'"))?;
    Ok(if descending { SortKey::descending(column) } else { SortKey::ascending(column) })
}

fn print_table<S: TabularSource>(view: &FilterView<S>, cfg: &Config) -> Result<()> {
    let width = crossterm::terminal::size()
        .map(|(w, _)| w)
        .unwrap_or(cfg.display.width);
    let shown = view.visible_rows().len().min(cfg.display.max_rows);
    if shown < view.visible_rows().len() {
        warn!("showing {shown} of {} rows", view.visible_rows().len());
    }
    // header + rows, the status line goes to stderr
    let height = u16::try_from(shown + 1).unwrap_or(u16::MAX);
    let table = ResultsTable::new(view).show_status(false);
    for line in render_to_lines(table, width, height) {
        println!("{line}");
    }
    Ok(())
}

fn write_csv<S: TabularSource>(view: &FilterView<S>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    writer.write_record(view.column_names())?;
    for &row in view.visible_rows() {
        let values = view.source().row_values(row);
        writer.write_record(values.iter().map(|v| v.as_text()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_key() {
        let columns = vec!["Name".to_string(), "Score".to_string()];
        assert_eq!(parse_sort_key("Score:desc", &columns).unwrap(), SortKey::descending(1));
        assert_eq!(parse_sort_key("0", &columns).unwrap(), SortKey::ascending(0));
        assert_eq!(parse_sort_key("Name:ASC", &columns).unwrap(), SortKey::ascending(0));
        assert!(parse_sort_key("Missing", &columns).is_err());
        assert!(parse_sort_key("5", &columns).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::try_parse_from([
            "gridsift", "--data", "x.csv", "--mode", "or", "--column-order", "2,0", "--sort", "Name:desc",
            "--format", "csv",
        ])
        .unwrap();
        assert_eq!(args.mode, Some(ModeArg::Or));
        assert_eq!(args.column_order, Some(vec![2, 0]));
        assert_eq!(args.format, OutputFormat::Csv);

        let registry = load_registry(&args).unwrap().unwrap();
        assert_eq!(registry.inter_mode, CombineMode::Or);
        assert!(registry.is_empty());
    }
}
