//! Command-line interface argument parsing for runlog.
//!
//! - `runlog show` opens the dashboard
//! - `runlog add 10.2 --duration 52:30 --heart-rate 151` logs a run
//! - `runlog export --year 2024` writes the heatmap and trend images

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::data::{parse_date, parse_distance, parse_duration, NewRun, TimeOfDay};

/// A personal running log with a calendar heatmap and trend charts.
#[derive(Parser, Debug)]
#[command(name = "runlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding RunningLog.db (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Colour theme: "dark" or "light"
    #[arg(long, global = true)]
    pub theme: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the dashboard
    Show {
        /// Year to display first (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Log a run
    Add(AddArgs),

    /// Delete a run (the most recently added one by default)
    Undo {
        #[arg(long)]
        id: Option<i64>,
    },

    /// List runs of a year
    List {
        #[arg(short, long)]
        year: Option<i32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print overall, monthly and yearly totals
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Write heatmap and trend charts as SVG
    Export {
        #[arg(short, long)]
        year: Option<i32>,

        /// Output directory (defaults to the configured images directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import runs from a legacy CSV file
    Import {
        /// CSV file: date,distance[,duration[,heart_rate[,pace[,cadence[,notes]]]]]
        path: PathBuf,
    },

    /// Export images, then commit and push the configured repositories
    Publish {
        /// Commit message (defaults to "Update running log <date>")
        #[arg(short, long)]
        message: Option<String>,

        /// Pull each repository first
        #[arg(long)]
        pull: bool,
    },
}

/// Fields of a run given on the command line
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Distance in km
    pub distance: String,

    /// Date of the run, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Duration as h:mm:ss, mm:ss or minutes
    #[arg(short = 't', long)]
    pub duration: Option<String>,

    /// Pace per km, e.g. 5'15" (derived from duration when omitted)
    #[arg(long)]
    pub pace: Option<String>,

    #[arg(long)]
    pub heart_rate: Option<f64>,

    #[arg(long)]
    pub heart_rate_max: Option<f64>,

    /// Steps per minute
    #[arg(long)]
    pub cadence: Option<u32>,

    #[arg(long)]
    pub vo2max: Option<String>,

    /// Degrees Celsius
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Relative humidity in percent
    #[arg(long)]
    pub humidity: Option<f64>,

    /// morning, forenoon, afternoon or evening
    #[arg(long)]
    pub time_of_day: Option<String>,

    /// Place name, or the number of a place from the config file
    #[arg(long)]
    pub place: Option<String>,

    #[arg(short, long)]
    pub notes: Option<String>,
}

impl AddArgs {
    /// Validate and convert into a run; `today` fills a missing date
    pub fn into_new_run(self, today: chrono::NaiveDate) -> Result<NewRun> {
        let date = match self.date {
            Some(d) => parse_date(&d)?,
            None => today,
        };
        let mut run = NewRun::new(date, parse_distance(&self.distance)?);
        run.duration_seconds = self.duration.as_deref().map(parse_duration).transpose()?;
        run.pace = self.pace;
        run.heart_rate = self.heart_rate;
        run.heart_rate_max = self.heart_rate_max;
        run.cadence = self.cadence;
        run.vo2max = self.vo2max;
        run.temperature = self.temperature;
        run.humidity = self.humidity;
        run.time_of_day = self
            .time_of_day
            .as_deref()
            .map(str::parse::<TimeOfDay>)
            .transpose()?;
        run.place = self.place;
        run.notes = self.notes;
        run.validate()?;
        Ok(run)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_defaults_to_today() {
        let cli = Cli::try_parse_from(["runlog", "add", "5.5"]).unwrap();
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let run = args.into_new_run(today()).unwrap();
        assert_eq!(run.date, today());
        assert_eq!(run.distance, 5.5);
        assert_eq!(run.duration_seconds, None);
    }

    #[test]
    fn test_add_full_arguments() {
        let cli = Cli::try_parse_from([
            "runlog", "add", "10", "--date", "2024-05-04", "-t", "52:30", "--heart-rate", "151",
            "--time-of-day", "Morning", "--place", "Park", "--theme", "light",
        ])
        .unwrap();
        assert_eq!(cli.theme.as_deref(), Some("light"));
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let run = args.into_new_run(today()).unwrap();
        assert_eq!(run.date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(run.duration_seconds, Some(3150));
        assert_eq!(run.time_of_day, Some(TimeOfDay::Morning));
        assert_eq!(run.effective_pace().as_deref(), Some("5'15\""));
    }

    #[test]
    fn test_add_rejects_bad_input() {
        for argv in [
            vec!["runlog", "add", "abc"],
            vec!["runlog", "add", "5", "--date", "2024-13-01"],
            vec!["runlog", "add", "5", "-t", "5:99"],
            vec!["runlog", "add", "5", "--humidity", "150"],
        ] {
            let cli = Cli::try_parse_from(argv.clone()).unwrap();
            let Commands::Add(args) = cli.command else {
                panic!("expected add");
            };
            assert!(args.into_new_run(today()).is_err(), "{argv:?} should fail");
        }
    }
}
