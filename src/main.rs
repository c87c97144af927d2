//! runlog: a personal running log for the terminal.
//!
//! Runs are stored in a local SQLite database. The dashboard shows a
//! GitHub-style calendar heatmap and monthly/yearly trends; the same views can
//! be exported as SVG and published to a git repository.

mod app;
mod cli;
mod config;
mod data;
mod export;
mod git;
mod heatmap;
mod logging;
mod publish;
mod ui;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use cli::{Cli, Commands};
use config::AppConfig;
use data::{format_duration, import, Storage};
use export::{export_all, ExportStyle};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.data_dir.clone(), cli.theme.as_deref())?;

    // The dashboard owns the terminal, so its log goes to a file
    if matches!(cli.command, Commands::Show { .. }) {
        logging::init_file(&config.log_file(), cli.verbose)?;
    } else {
        logging::init_stderr(cli.verbose);
    }

    let today = Local::now().date_naive();
    let mut storage = Storage::open(&config.data_dir)?;
    tracing::debug!(db = ?storage.db_path(), "using database");

    match cli.command {
        Commands::Show { year } => return app::run(config, storage, year),
        Commands::Add(args) => {
            let mut run = args.into_new_run(today)?;
            run.place = run.place.map(|p| config.resolve_place(&p));
            let id = storage.save(&run)?;
            println!(
                "Saved run #{id}: {} {:.2} km",
                run.date,
                run.distance
            );
        }
        Commands::Undo { id } => {
            let id = match id {
                Some(id) => id,
                None => storage.last_id()?.context("No runs to delete")?,
            };
            let record = storage.get(id)?;
            if storage.delete(id)? {
                match record {
                    Some(r) => println!("Deleted run #{id}: {} {:.2} km", r.date, r.distance),
                    None => println!("Deleted run #{id}"),
                }
            } else {
                anyhow::bail!("No run with id {id}");
            }
        }
        Commands::List { year, json } => {
            let year = year.unwrap_or(today.year());
            let runs: Vec<_> = storage.load_year(year)?.into_values().flatten().collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            } else if runs.is_empty() {
                println!("No runs in {year}");
            } else {
                println!("{:>5}  {:<10}  {:>8}  {:>8}  {:>7}  {:>4}  notes", "id", "date", "km", "time", "pace", "hr");
                for r in &runs {
                    println!(
                        "{:>5}  {:<10}  {:>8.2}  {:>8}  {:>7}  {:>4}  {}",
                        r.id,
                        r.date,
                        r.distance,
                        r.duration_seconds.map(format_duration).unwrap_or_default(),
                        r.pace.as_deref().unwrap_or(""),
                        r.heart_rate.map(|h| format!("{h:.0}")).unwrap_or_default(),
                        r.notes.as_deref().unwrap_or(""),
                    );
                }
            }
        }
        Commands::Summary { json } => {
            let summary = storage.summary()?;
            let monthly = storage.monthly_totals()?;
            let yearly = storage.yearly_totals()?;
            if json {
                let report = serde_json::json!({
                    "summary": summary,
                    "monthly": monthly,
                    "yearly": yearly,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} days, {:.1} km total, {:.2} km/day (min {:.1}, max {:.1})",
                    summary.days_run,
                    summary.total_distance,
                    summary.avg_distance,
                    summary.min_distance,
                    summary.max_distance
                );
                println!();
                println!("{:<8}  {:>5}  {:>9}  {:>10}", "year", "days", "km", "total km");
                for y in &yearly {
                    println!(
                        "{:<8}  {:>5}  {:>9.1}  {:>10.1}",
                        y.year, y.days_run, y.total_distance, y.cumulative_distance
                    );
                }
                println!();
                println!("{:<8}  {:>5}  {:>9}  {:>10}", "month", "days", "km", "total km");
                for m in &monthly {
                    println!(
                        "{:<8}  {:>5}  {:>9.1}  {:>10.1}",
                        m.month, m.days_run, m.total_distance, m.cumulative_distance
                    );
                }
            }
        }
        Commands::Export { year, out } => {
            let year = year.unwrap_or(today.year());
            let dir = out.unwrap_or_else(|| config.images_dir());
            let style = ExportStyle::new(config.dark_mode, config.heatmap_levels);
            for path in export_all(&storage, year, &dir, &style)? {
                println!("Wrote {}", path.display());
            }
        }
        Commands::Import { path } => {
            let runs = import::read_csv_file(&path)?;
            let count = storage.save_all(&runs)?;
            println!("Imported {count} runs from {}", path.display());
        }
        Commands::Publish { message, pull } => {
            let message = message.unwrap_or_else(|| publish::default_message(today));
            let reports = publish::publish(&config, &storage, today.year(), &message, pull)?;
            println!("{}", publish::describe(&reports));
        }
    }

    Ok(())
}
