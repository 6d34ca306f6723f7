//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvTableAdapter;
use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::xlsx_adapter::XlsxTableAdapter;
use crate::domain::config_validation::{parse_delimiter, validate_config};
use crate::domain::engine::{EngineConfig, VolatilityEngine, VolatilityReport};
use crate::domain::error::VolError;
use crate::domain::estimator::ewma::{Lambda, DEFAULT_LAMBDA};
use crate::domain::estimator::EstimatorSet;
use crate::domain::series::{prepare_series, CleaningReport, SeriesOptions};
use crate::domain::window::{select_windows, WindowSpec, MIN_OBSERVATIONS};
use crate::ports::config_port::ConfigPort;
use crate::ports::export_port::ResultSink;
use crate::ports::table_port::TableSource;

#[derive(Parser, Debug)]
#[command(
    name = "voltable",
    about = "Annualized volatility estimates (historical, EWMA, GARCH) over look-back windows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Price file: delimited text, or a spreadsheet (.xlsx, .xls, .ods), with a header row
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Field delimiter: one character, or comma/semicolon/tab/pipe
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Column holding the prices, e.g. "Adj Close"
    #[arg(long)]
    pub price_column: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate volatility for every window and print the table
    Estimate {
        #[command(flatten)]
        input: InputArgs,
        /// EWMA decay factor in [0.80, 0.99]
        #[arg(long)]
        lambda: Option<f64>,
        /// Skip the GARCH(1,1) estimator
        #[arg(long)]
        no_garch: bool,
        /// Write the table to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how the input cleans up and which windows it can fill
    Inspect {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub lambda: Option<f64>,
    pub no_garch: bool,
    pub price_column: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Estimate {
            input,
            lambda,
            no_garch,
            output,
        } => run_estimate(&input, lambda, no_garch, output.as_ref()),
        Command::Inspect { input } => run_inspect(&input),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(adapter)
}

/// Builds the engine configuration from config values and command-line overrides.
pub fn build_engine_config(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<EngineConfig, VolError> {
    let defaults = SeriesOptions::default();
    let series = SeriesOptions {
        date_column: config
            .get_string("input", "date_column")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.date_column),
        price_column: overrides
            .price_column
            .clone()
            .or_else(|| config.get_string("input", "price_column"))
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.price_column),
    };

    let lambda = Lambda::new(match overrides.lambda {
        Some(value) => value,
        None => config.get_double("estimator", "lambda", DEFAULT_LAMBDA)?,
    })?;
    let request_garch = !overrides.no_garch && config.get_bool("estimator", "garch", true)?;

    let min_observations =
        config.get_int("estimator", "min_observations", MIN_OBSERVATIONS as i64)?;
    if min_observations < 2 {
        return Err(VolError::ConfigInvalid {
            section: "estimator".into(),
            key: "min_observations".into(),
            reason: "min_observations must be at least 2".into(),
        });
    }

    let windows = match config.get_string("estimator", "windows") {
        Some(list) => WindowSpec::parse(&list)?,
        None => WindowSpec::standard(),
    };

    Ok(EngineConfig {
        series,
        windows,
        estimators: EstimatorSet::new(lambda, request_garch),
        min_observations: min_observations as usize,
    })
}

/// The delimiter flag wins over `[input] delimiter`; comma otherwise.
pub fn resolve_delimiter(flag: Option<&str>, config: &dyn ConfigPort) -> Result<u8, VolError> {
    match flag
        .map(str::to_string)
        .or_else(|| config.get_string("input", "delimiter"))
    {
        Some(value) => parse_delimiter(&value).ok_or_else(|| VolError::ConfigInvalid {
            section: "input".into(),
            key: "delimiter".into(),
            reason: format!("'{}' is not a usable delimiter", value),
        }),
        None => Ok(b','),
    }
}

pub fn resolve_input(flag: Option<&PathBuf>, config: &dyn ConfigPort) -> Result<PathBuf, VolError> {
    flag.cloned()
        .or_else(|| config.get_string("input", "path").map(PathBuf::from))
        .ok_or_else(|| VolError::ConfigMissing {
            section: "input".into(),
            key: "path".into(),
        })
}

/// Picks the loader by file extension: spreadsheets through calamine,
/// anything else as delimited text.
pub fn table_source(
    input: &InputArgs,
    config: &dyn ConfigPort,
) -> Result<Box<dyn TableSource>, VolError> {
    let path = resolve_input(input.input.as_ref(), config)?;
    eprintln!("Reading prices from {}", path.display());
    if XlsxTableAdapter::handles(&path) {
        let adapter = XlsxTableAdapter::new(path);
        return Ok(match config.get_string("input", "sheet") {
            Some(sheet) => Box::new(adapter.with_sheet(sheet)),
            None => Box::new(adapter),
        });
    }
    let delimiter = resolve_delimiter(input.delimiter.as_deref(), config)?;
    Ok(Box::new(CsvTableAdapter::new(path).with_delimiter(delimiter)))
}

fn run_estimate(
    input: &InputArgs,
    lambda: Option<f64>,
    no_garch: bool,
    output: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: configuration
    let adapter = match load_optional_config(input.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let overrides = Overrides {
        lambda,
        no_garch,
        price_column: input.price_column.clone(),
    };
    let engine_config = match build_engine_config(&adapter, &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: load
    let source = match table_source(input, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: estimate
    let engine = VolatilityEngine::new(engine_config);
    let report = match engine.run_source(source.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    print_cleaning(&report.cleaning);
    print_results(&report, engine.config());

    // Stage 4: export
    let output = output
        .cloned()
        .or_else(|| adapter.get_string("output", "path").map(PathBuf::from));
    if let Some(path) = output {
        let delimiter = match resolve_delimiter(input.delimiter.as_deref(), &adapter) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let sink = CsvExportAdapter::new(path.clone()).with_delimiter(delimiter);
        if let Err(e) = sink.write(&report.table) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Wrote {}", path.display());
    }

    ExitCode::SUCCESS
}

fn print_cleaning(report: &CleaningReport) {
    eprintln!(
        "Rows read: {}, kept: {} (missing date: {}, missing price: {})",
        report.rows_read, report.rows_kept, report.missing_date, report.missing_price
    );
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        eprintln!("Date range: {} to {}", first, last);
    }
    if !report.comma_decimal_columns.is_empty() {
        eprintln!(
            "Comma decimal notation detected in: {}",
            report.comma_decimal_columns.join(", ")
        );
    }
    if report.non_finite_returns > 0 {
        eprintln!(
            "warning: dropped {} non-finite return(s) from non-positive prices",
            report.non_finite_returns
        );
    }
}

fn print_results(report: &VolatilityReport, config: &EngineConfig) {
    if report.table.is_empty() {
        let shortest = config.windows.windows().first().map_or(0, |w| w.days);
        eprintln!(
            "No window fits {} returns (shortest window needs {})",
            report.return_count, shortest
        );
        return;
    }
    eprintln!("{} returns available\n", report.return_count);
    print!("{}", report.table.render_text());
}

fn run_inspect(input: &InputArgs) -> ExitCode {
    let adapter = match load_optional_config(input.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let overrides = Overrides {
        price_column: input.price_column.clone(),
        ..Overrides::default()
    };
    let engine_config = match build_engine_config(&adapter, &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let table = match table_source(input, &adapter).and_then(|source| source.load()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("Columns: {}", table.column_names().collect::<Vec<_>>().join(", "));
    let prepared = match prepare_series(&table, &engine_config.series) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let report = &prepared.report;
    println!("Rows read:         {}", report.rows_read);
    println!("Missing date:      {}", report.missing_date);
    println!("Missing price:     {}", report.missing_price);
    println!("Rows kept:         {}", report.rows_kept);
    println!("Returns:           {}", prepared.returns.len());
    println!("Dropped returns:   {}", report.non_finite_returns);
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("Date range:        {} to {}", first, last);
    }
    if !report.comma_decimal_columns.is_empty() {
        println!("Comma decimals:    {}", report.comma_decimal_columns.join(", "));
    }

    println!("\nWindows:");
    let slices = select_windows(
        &engine_config.windows,
        &prepared.returns,
        engine_config.min_observations,
    );
    for def in engine_config.windows.windows() {
        let status = match slices.iter().find(|s| s.def.label == def.label) {
            Some(s) if s.sufficient => "ok",
            Some(_) => "below minimum observations",
            None => "not enough history",
        };
        println!("  {:>5}y {:>5} days  {}", def.label.to_string(), def.days, status);
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let engine_config = match build_engine_config(&adapter, &Overrides::default()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nPrice column: {}", engine_config.series.price_column);
    eprintln!("Estimators:");
    for kind in engine_config.estimators.kinds() {
        eprintln!("  {}", kind);
    }
    eprintln!(
        "Windows: {} (minimum {} observations)",
        engine_config
            .windows
            .windows()
            .iter()
            .map(|w| format!("{}y={}d", w.label, w.days))
            .collect::<Vec<_>>()
            .join(", "),
        engine_config.min_observations
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn engine_config_defaults() {
        let c = build_engine_config(&FileConfigAdapter::empty(), &Overrides::default()).unwrap();
        assert_eq!(c.series.price_column, "Close");
        assert_eq!(c.series.date_column, "Date");
        assert_eq!(c.estimators.lambda(), Lambda::default());
        assert_eq!(c.windows, WindowSpec::standard());
        assert_eq!(c.min_observations, 30);
    }

    #[test]
    fn overrides_take_precedence() {
        let adapter = config(
            "[input]\nprice_column = Close\n[estimator]\nlambda = 0.9\ngarch = true\n",
        );
        let overrides = Overrides {
            lambda: Some(0.97),
            no_garch: true,
            price_column: Some("Adj Close".into()),
        };
        let c = build_engine_config(&adapter, &overrides).unwrap();
        assert_eq!(c.estimators.lambda(), Lambda::new(0.97).unwrap());
        assert!(!c.estimators.garch_enabled());
        assert_eq!(c.series.price_column, "Adj Close");
    }

    #[test]
    fn config_values_used_without_overrides() {
        let adapter = config(
            "[input]\ndate_column = Fecha\n[estimator]\nlambda = 0.9\nmin_observations = 10\nwindows = 0.5:20, 1:40\n",
        );
        let c = build_engine_config(&adapter, &Overrides::default()).unwrap();
        assert_eq!(c.series.date_column, "Fecha");
        assert_eq!(c.estimators.lambda(), Lambda::new(0.9).unwrap());
        assert_eq!(c.min_observations, 10);
        assert_eq!(c.windows.len(), 2);
    }

    #[test]
    fn lambda_override_out_of_range_is_rejected() {
        let overrides = Overrides {
            lambda: Some(0.5),
            ..Overrides::default()
        };
        let result = build_engine_config(&FileConfigAdapter::empty(), &overrides);
        assert!(matches!(result, Err(VolError::InvalidLambda { .. })));
    }

    #[test]
    fn delimiter_resolution() {
        let adapter = config("[input]\ndelimiter = semicolon\n");
        assert_eq!(resolve_delimiter(None, &adapter).unwrap(), b';');
        assert_eq!(resolve_delimiter(Some("\\t"), &adapter).unwrap(), b'\t');
        assert_eq!(
            resolve_delimiter(None, &FileConfigAdapter::empty()).unwrap(),
            b','
        );
        assert!(resolve_delimiter(Some("::"), &adapter).is_err());
    }

    #[test]
    fn input_path_required_somewhere() {
        let empty = FileConfigAdapter::empty();
        assert!(matches!(
            resolve_input(None, &empty),
            Err(VolError::ConfigMissing { .. })
        ));
        let adapter = config("[input]\npath = prices.csv\n");
        assert_eq!(
            resolve_input(None, &adapter).unwrap(),
            PathBuf::from("prices.csv")
        );
        let flag = PathBuf::from("other.csv");
        assert_eq!(resolve_input(Some(&flag), &adapter).unwrap(), flag);
    }

    #[test]
    fn cli_parses_estimate_flags() {
        let cli = Cli::try_parse_from([
            "voltable",
            "estimate",
            "--input",
            "p.csv",
            "--lambda",
            "0.97",
            "--no-garch",
            "--price-column",
            "Adj Close",
        ])
        .unwrap();
        match cli.command {
            Command::Estimate {
                input,
                lambda,
                no_garch,
                output,
            } => {
                assert_eq!(input.input, Some(PathBuf::from("p.csv")));
                assert_eq!(input.price_column.as_deref(), Some("Adj Close"));
                assert_eq!(lambda, Some(0.97));
                assert!(no_garch);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
