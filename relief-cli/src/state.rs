use anyhow::{Context, Result};
use chrono::NaiveDate;
use relief_core::InMemoryLedger;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// `$RELIEF_HOME`, or `~/.relief`.
pub fn relief_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("RELIEF_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".relief"))
}

pub fn ensure_relief_home() -> Result<PathBuf> {
    let dir = relief_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

fn file_stem(school_id: &str) -> String {
    school_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

pub fn workload_path(school_id: &str) -> Result<PathBuf> {
    Ok(ensure_relief_home()?.join(format!("workload-{}.json", file_stem(school_id))))
}

pub fn suspensions_path() -> Result<PathBuf> {
    Ok(ensure_relief_home()?.join("suspensions.json"))
}

/// Historical substitution counts for one school; empty when never saved.
pub fn load_ledger(school_id: &str) -> Result<InMemoryLedger> {
    read_json_or_default(&workload_path(school_id)?)
}

pub fn save_ledger(school_id: &str, ledger: &InMemoryLedger) -> Result<()> {
    write_json(&workload_path(school_id)?, ledger)
}

/// Dates on which arrangements are switched off, per school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspensions {
    #[serde(default)]
    schools: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl Suspensions {
    pub fn load() -> Result<Self> {
        read_json_or_default(&suspensions_path()?)
    }

    pub fn save(&self) -> Result<()> {
        write_json(&suspensions_path()?, self)
    }

    pub fn is_suspended(&self, school_id: &str, date: NaiveDate) -> bool {
        self.schools.get(school_id).is_some_and(|dates| dates.contains(&date))
    }

    /// Returns false if the date was already suspended.
    pub fn suspend(&mut self, school_id: &str, date: NaiveDate) -> bool {
        self.schools.entry(school_id.to_string()).or_default().insert(date)
    }

    /// Returns false if the date was not suspended.
    pub fn resume(&mut self, school_id: &str, date: NaiveDate) -> bool {
        let Some(dates) = self.schools.get_mut(school_id) else {
            return false;
        };
        let removed = dates.remove(&date);
        if dates.is_empty() {
            self.schools.remove(school_id);
        }
        removed
    }
}

fn read_json_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
