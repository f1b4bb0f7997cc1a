use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Salary inputs are entered in 万円 and records are stored in 千円.
pub const SALARY_UNIT_SCALE: i64 = 10;
pub const DEFAULT_SALARY_FLOOR: i64 = 0;
pub const DEFAULT_SALARY_CEILING: i64 = 9999;

/// Location selections that mean "anything remote".
pub const REMOTE_OK_SENTINELS: [&str; 2] = ["remote-ok", "リモートOK"];
/// Substrings of a record location that mark it as remote.
pub const REMOTE_MARKERS: [&str; 2] = ["remote", "リモート"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    #[serde(alias = "salary")]
    SalaryDesc,
    /// Same ordering as `Newest`: records carry no separate last-updated date.
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::SalaryDesc => "salary-desc",
            SortKey::Updated => "updated",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "newest" => Ok(SortKey::Newest),
            "salary-desc" | "salary" => Ok(SortKey::SalaryDesc),
            "updated" => Ok(SortKey::Updated),
            other => Err(format!("unknown sort key `{}`", other)),
        }
    }
}

/// Active search, filter, sort and page criteria for one listing view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryState {
    pub search_term: String,
    pub categories: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub experience_levels: BTreeSet<String>,
    /// 万円
    pub salary_floor: i64,
    /// 万円
    pub salary_ceiling: i64,
    pub sort_key: SortKey,
    /// 1-based.
    pub current_page: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            categories: BTreeSet::new(),
            locations: BTreeSet::new(),
            experience_levels: BTreeSet::new(),
            salary_floor: DEFAULT_SALARY_FLOOR,
            salary_ceiling: DEFAULT_SALARY_CEILING,
            sort_key: SortKey::Newest,
            current_page: 1,
        }
    }
}

impl QueryState {
    /// Lower-cased, trimmed search term as matched against record search text.
    pub fn normalized_search_term(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    /// Floor in the record unit (千円).
    pub fn salary_floor_scaled(&self) -> i64 {
        self.salary_floor.saturating_mul(SALARY_UNIT_SCALE)
    }

    /// Ceiling in the record unit (千円).
    pub fn salary_ceiling_scaled(&self) -> i64 {
        self.salary_ceiling.saturating_mul(SALARY_UNIT_SCALE)
    }

    pub fn wants_remote(&self) -> bool {
        REMOTE_OK_SENTINELS
            .iter()
            .any(|sentinel| self.locations.contains(*sentinel))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
