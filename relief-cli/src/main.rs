use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;
mod report;
mod run;
mod state;

use config::{load_config, Config};
use run::{AbsenceSource, ArrangeJob, Outcome};
use state::{load_ledger, save_ledger, Suspensions};

#[derive(Parser, Debug)]
#[command(name = "relief", version, about = "Substitute teacher arrangements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arrange substitutes for one school and one date
    Arrange {
        /// Timetable CSV for the day (defaults to the configured school's weekday file)
        #[arg(long)]
        timetable: Option<PathBuf>,

        /// Comma-separated absent teacher ids
        #[arg(long, value_delimiter = ',', conflicts_with = "attendance")]
        absent: Vec<String>,

        /// Attendance CSV (teacher_id,date,status)
        #[arg(long)]
        attendance: Option<PathBuf>,

        /// Date to arrange (YYYY-MM-DD, default: today in the configured timezone)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Custom rules JSON; replaces the built-in tiers
        #[arg(long)]
        rules: Option<PathBuf>,

        /// School id (default: general.default_school)
        #[arg(long)]
        school: Option<String>,

        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Arrange every configured school concurrently
    Batch {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Historical substitution counters
    Workload {
        #[command(subcommand)]
        command: WorkloadCommand,
    },

    /// Switch arrangements off for a school on a date
    Suspend {
        #[arg(long)]
        school: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Undo a suspension
    Resume {
        #[arg(long)]
        school: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum WorkloadCommand {
    /// Print counts, busiest first
    Show {
        #[arg(long)]
        school: String,
    },
    /// Clear all counts for a school
    Reset {
        #[arg(long)]
        school: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml into $RELIEF_HOME
    Init,
}

const DEFAULT_LOG_FILTER: &str = "relief=info";

/// `RUST_LOG` when it parses, otherwise the crate's info level.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Arrange {
            timetable,
            absent,
            attendance,
            date,
            rules,
            school,
            json,
        } => {
            let cfg = load_config()?;
            let date = resolve_date(&cfg, date)?;
            let school_id = school.unwrap_or_else(|| cfg.general.default_school.clone());
            let configured = cfg.school(&school_id);

            let timetable = match (timetable, configured) {
                (Some(path), _) => path,
                (None, Some(s)) => s.timetable_for(date.weekday()),
                (None, None) => bail!("no --timetable given and school {school_id:?} is not configured"),
            };
            let absences = if !absent.is_empty() {
                AbsenceSource::Ids(absent)
            } else if let Some(path) = attendance.or_else(|| configured.and_then(|s| s.attendance_csv.clone())) {
                AbsenceSource::Attendance(path)
            } else {
                bail!("pass --absent <ids> or --attendance <csv>");
            };

            let job = ArrangeJob {
                school_id: school_id.clone(),
                date,
                timetable,
                absences,
                rules: rules.or_else(|| configured.and_then(|s| s.rules.clone())),
                periods: cfg.general.periods,
            };
            let catalog = cfg.catalog()?;
            match job.run(&catalog)? {
                Outcome::Suspended => println!("Arrangements are suspended for {school_id} on {date}."),
                Outcome::Holiday => println!("{date} is not a teaching day for {school_id}."),
                Outcome::NoAbsentees => println!("No absent teachers for {school_id} on {date}."),
                Outcome::Arranged(results) if json => report::print_json(&results)?,
                Outcome::Arranged(results) => {
                    println!("# Arrangements for {school_id} on {date}\n");
                    report::print_results(&results);
                    report::print_digests(&results);
                }
            }
        }

        Command::Batch { date } => {
            let cfg = load_config()?;
            let date = resolve_date(&cfg, date)?;
            batch(cfg, date).await?;
        }

        Command::Workload { command } => match command {
            WorkloadCommand::Show { school } => {
                let ledger = load_ledger(&school)?;
                let mut counts: Vec<(&String, &u32)> = ledger.counts().iter().collect();
                counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                if counts.is_empty() {
                    println!("No substitutions recorded for {school}.");
                }
                for (id, n) in counts {
                    println!("{id:<12} {n}");
                }
            }
            WorkloadCommand::Reset { school } => {
                let mut ledger = load_ledger(&school)?;
                ledger.reset();
                save_ledger(&school, &ledger)?;
                println!("Workload counters reset for {school}.");
            }
        },

        Command::Suspend { school, date } => {
            let mut s = Suspensions::load()?;
            if s.suspend(&school, date) {
                s.save()?;
                println!("Arrangements suspended for {school} on {date}.");
            } else {
                println!("Already suspended for {school} on {date}.");
            }
        }

        Command::Resume { school, date } => {
            let mut s = Suspensions::load()?;
            if s.resume(&school, date) {
                s.save()?;
                println!("Arrangements resumed for {school} on {date}.");
            } else {
                println!("{school} was not suspended on {date}.");
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },
    }

    Ok(())
}

fn resolve_date(cfg: &Config, date: Option<NaiveDate>) -> Result<NaiveDate> {
    match date {
        Some(d) => Ok(d),
        None => Ok(Utc::now().with_timezone(&cfg.timezone()?).date_naive()),
    }
}

/// One job per configured school. Schools whose job cannot be built are
/// returned with the error instead of stopping the rest.
fn plan_jobs(cfg: &Config, date: NaiveDate) -> (Vec<ArrangeJob>, Vec<(String, anyhow::Error)>) {
    let mut jobs = Vec::new();
    let mut rejected = Vec::new();
    for school in &cfg.schools {
        match ArrangeJob::for_school(cfg, school, date) {
            Ok(job) => jobs.push(job),
            Err(err) => rejected.push((school.id.clone(), err)),
        }
    }
    (jobs, rejected)
}

/// Every school runs on its own blocking task; schools share nothing but the
/// read-only subject catalog.
async fn batch(cfg: Config, date: NaiveDate) -> Result<()> {
    if cfg.schools.is_empty() {
        bail!("no schools configured; run: relief config init");
    }
    let catalog = Arc::new(cfg.catalog()?);

    let (jobs, rejected) = plan_jobs(&cfg, date);
    let mut failures = 0usize;
    for (school_id, err) in &rejected {
        error!(school = %school_id, error = %format!("{err:#}"), "School arrangement failed");
        failures += 1;
    }

    let mut set = JoinSet::new();
    for job in jobs {
        let catalog = Arc::clone(&catalog);
        set.spawn_blocking(move || {
            let outcome = job.run(&catalog);
            (job.school_id, outcome)
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (school_id, outcome) = joined.context("arrangement task panicked")?;
        match outcome {
            Ok(outcome) => reports.push((school_id, outcome)),
            Err(err) => {
                error!(school = %school_id, error = %format!("{err:#}"), "School arrangement failed");
                failures += 1;
            }
        }
    }
    reports.sort_by(|a, b| a.0.cmp(&b.0));

    for (school_id, outcome) in &reports {
        println!("# {school_id} ({date})\n");
        match outcome {
            Outcome::Suspended => println!("Suspended.\n"),
            Outcome::Holiday => println!("Not a teaching day.\n"),
            Outcome::NoAbsentees => println!("No absent teachers.\n"),
            Outcome::Arranged(results) => {
                report::print_results(results);
                report::print_digests(results);
                println!();
            }
        }
    }

    if failures > 0 {
        bail!("{failures} school(s) failed; see log for details");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchoolSection;

    fn school(id: &str, attendance: Option<&str>) -> SchoolSection {
        SchoolSection {
            id: id.to_string(),
            name: id.to_uppercase(),
            timetable_dir: PathBuf::from(format!("/srv/{id}")),
            attendance_csv: attendance.map(PathBuf::from),
            rules: None,
            auto_mark: false,
        }
    }

    #[test]
    fn misconfigured_school_does_not_block_the_others() {
        let mut cfg = Config::default();
        cfg.schools = vec![
            school("a", Some("/srv/a/attendance.csv")),
            school("b", None),
            school("c", Some("/srv/c/attendance.csv")),
        ];
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();

        let (jobs, rejected) = plan_jobs(&cfg, date);
        let planned: Vec<&str> = jobs.iter().map(|j| j.school_id.as_str()).collect();
        assert_eq!(planned, vec!["a", "c"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "b");
        assert!(format!("{:#}", rejected[0].1).contains("attendance_csv"));
    }

    #[test]
    fn rust_log_overrides_the_default_level() {
        assert_eq!(log_filter(Some("relief=debug")).to_string(), "relief=debug");
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
    }
}
