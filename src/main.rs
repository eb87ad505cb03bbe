use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use population_dashboard::config::{load_settings, Settings};
use population_dashboard::format::thousands;
use population_dashboard::{
    render_dashboard, DatasetLoader, DerivedSummary, PopulationTable, RenderOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "population-dashboard",
    version,
    about = "US population summaries by year, region and state"
)]
struct Cli {
    #[arg(long, global = true, help = "Settings file (default: ./dashboard.toml if present)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Population CSV (overrides data_path)")]
    data: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the years in the dataset, most recent first
    Years,
    /// Print the derived summary of one year
    Summary {
        #[arg(long, help = "Year to summarize (default: most recent)")]
        year: Option<i32>,
        #[arg(long, help = "Length of the top-N ranking")]
        top: Option<usize>,
    },
    /// Write the HTML dashboard
    Render {
        #[arg(long, help = "Year selected on open (default: most recent)")]
        year: Option<i32>,
        #[arg(long, help = "Length of the top-N ranking")]
        top: Option<usize>,
        #[arg(long, short)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "population_dashboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }

    let catalog = settings.catalog()?;
    let table = DatasetLoader::from_path(&settings.data_path).load()?;

    let uncovered = catalog.uncovered_codes(&table)?;
    if !uncovered.is_empty() {
        warn!(
            codes = ?uncovered,
            "state codes outside every region are left out of regional totals"
        );
    }

    match cli.command {
        Commands::Years => print_years(&table, cli.json)?,
        Commands::Summary { year, top } => {
            let year = year.unwrap_or_else(|| table.latest_year());
            let top_n = top_n(&settings, top)?;
            let summary = DerivedSummary::compute(&table, year, &catalog, top_n)?;
            print_summary(&summary, cli.json)?;
        }
        Commands::Render { year, top, out } => {
            let options = RenderOptions {
                title: settings.title.clone(),
                selected_year: year,
                top_n: top_n(&settings, top)?,
                generated_at: Some(chrono::Local::now().naive_local()),
            };
            let html = render_dashboard(&table, &catalog, &options)?;
            std::fs::write(&out, html)
                .with_context(|| format!("failed to write '{}'", out.display()))?;
            info!(path = %out.display(), "dashboard written");
            if !cli.json {
                println!("wrote {}", out.display());
            } else {
                println!("{}", serde_json::json!({ "written": out }));
            }
        }
    }
    Ok(())
}

fn top_n(settings: &Settings, flag: Option<usize>) -> anyhow::Result<usize> {
    let n = flag.unwrap_or(settings.top_n);
    anyhow::ensure!(n > 0, "--top must be at least 1");
    Ok(n)
}

fn print_years(table: &PopulationTable, json: bool) -> anyhow::Result<()> {
    let years = table.year_choices();
    if json {
        println!("{}", serde_json::to_string(&years)?);
    } else {
        for year in years {
            println!("{year}");
        }
    }
    Ok(())
}

fn print_summary(summary: &DerivedSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Year {}", summary.year);
    println!("Total population: {}", thousands(summary.total_population));

    println!("\nBy region:");
    for region in &summary.region_totals {
        println!("  {:<12} {:>15}", region.region, thousands(region.population));
    }
    let uncovered = summary.uncovered_population();
    if uncovered != 0 {
        println!("  {:<12} {:>15}", "(no region)", thousands(uncovered));
    }

    println!("\nTop {} states:", summary.top_states.len());
    for (rank, state) in summary.top_states.iter().enumerate() {
        println!("  {:>2}. {:<22} {:>15}", rank + 1, state.state, thousands(state.population));
    }

    println!("\nNational trend:");
    for point in &summary.national_trend {
        println!("  {}  {:>15}", point.year, thousands(point.population));
    }
    Ok(())
}
