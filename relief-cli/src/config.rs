use anyhow::{Context, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use relief_core::SubjectCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_relief_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralSection,
    #[serde(default)]
    pub schools: Vec<SchoolSection>,
    /// Extra spellings per canonical subject, e.g. `MATHEMATICS = ["GANIT"]`.
    #[serde(default)]
    pub subject_aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// IANA name; decides what "today" and its weekday are.
    pub timezone: String,
    /// School used when a command is given no `--school`.
    pub default_school: String,
    /// Overrides the period count read from timetable headers.
    pub periods: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolSection {
    pub id: String,
    pub name: String,
    /// Holds one `<Weekday>.csv` per teaching day, e.g. `Monday.csv`.
    pub timetable_dir: PathBuf,
    pub attendance_csv: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    /// In `batch`, teachers with no attendance row for the day count as absent.
    #[serde(default)]
    pub auto_mark: bool,
}

impl SchoolSection {
    pub fn timetable_for(&self, weekday: Weekday) -> PathBuf {
        self.timetable_dir.join(format!("{}.csv", weekday_name(weekday)))
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralSection {
                timezone: "Asia/Kolkata".to_string(),
                default_school: "default".to_string(),
                periods: None,
            },
            schools: vec![SchoolSection {
                id: "default".to_string(),
                name: "My School".to_string(),
                timetable_dir: PathBuf::from("timetables"),
                attendance_csv: Some(PathBuf::from("attendance.csv")),
                rules: None,
                auto_mark: false,
            }],
            subject_aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.general
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {e}", self.general.timezone))
    }

    pub fn school(&self, id: &str) -> Option<&SchoolSection> {
        self.schools.iter().find(|s| s.id == id)
    }

    /// Standard catalog extended with the configured aliases.
    pub fn catalog(&self) -> Result<SubjectCatalog> {
        let mut catalog = SubjectCatalog::standard();
        for (canonical, aliases) in &self.subject_aliases {
            catalog = catalog
                .with_aliases(canonical, aliases)
                .with_context(|| format!("subject aliases for {canonical}"))?;
        }
        Ok(catalog)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_relief_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
