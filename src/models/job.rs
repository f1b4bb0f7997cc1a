use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::time::parse_posted_date;

/// Job favorites are stored under `favorite_{id}` and company favorites under
/// `favorite_company_{id}`, so a job id with this prefix would read as a company.
pub const RESERVED_ID_PREFIX: &str = "company_";

/// How the loader treats cards whose salary or title fields are unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Reject the card and report it.
    #[default]
    Strict,
    /// Keep the card with salary fields coerced to 0 and report it.
    Coerce,
}

impl FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "coerce" => Ok(Self::Coerce),
            other => Err(format!("unknown record policy `{}`", other)),
        }
    }
}

/// A numeric field as it appears in a job card: either a JSON number or the
/// string value of a `data-*` attribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// Leading-integer parse: `"500"` and `"500万"` both give 500, `"abc"` gives nothing.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RawNumber::Int(v) => Some(*v),
            RawNumber::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            RawNumber::Float(_) => None,
            RawNumber::Text(text) => {
                let text = text.trim();
                let (sign, digits) = match text.strip_prefix('-') {
                    Some(rest) => (-1, rest),
                    None => (1, text.strip_prefix('+').unwrap_or(text)),
                };
                let end = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                digits[..end].parse::<i64>().ok().map(|v| v * sign)
            }
        }
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawNumber::Int(v) => write!(f, "{}", v),
            RawNumber::Float(v) => write!(f, "{}", v),
            RawNumber::Text(v) => write!(f, "{:?}", v),
        }
    }
}

/// One job card from the record source document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawJobCard {
    #[serde(alias = "jobId")]
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub experience: String,
    #[serde(alias = "salary_min")]
    pub salary_min: Option<RawNumber>,
    #[serde(alias = "salary_max")]
    pub salary_max: Option<RawNumber>,
    #[serde(alias = "postedDate", alias = "posted_date")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueKind {
    #[error("{field} is missing")]
    MissingSalary { field: &'static str },
    #[error("{field} is not a number: {value}")]
    MalformedSalary { field: &'static str, value: String },
    #[error("salary range is inverted ({min} > {max})")]
    InvertedSalary { min: i64, max: i64 },
    #[error("title is empty")]
    EmptyTitle,
    #[error("date is missing")]
    MissingDate,
    #[error("date is not valid: {value:?}")]
    InvalidDate { value: String },
    #[error("id is already used by an earlier card")]
    DuplicateId,
    #[error("id must not start with `{}`", RESERVED_ID_PREFIX)]
    ReservedId,
}

/// A problem found while loading one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    /// 1-based position of the card in the source document.
    pub position: usize,
    pub id: String,
    pub message: String,
    pub rejected: bool,
    #[serde(skip)]
    pub kind: IssueKind,
}

/// Field values for building a [`JobRecord`] directly.
#[derive(Debug, Clone, Default)]
pub struct JobFields {
    pub id: String,
    pub title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub experience: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub posted_date: Option<NaiveDate>,
}

/// A loaded job listing. Salaries are in thousand yen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub experience: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub posted_date: Option<NaiveDate>,
    #[serde(skip_serializing)]
    search_text: String,
}

impl JobRecord {
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}

impl From<JobFields> for JobRecord {
    fn from(fields: JobFields) -> Self {
        let search_text = [
            fields.title.as_str(),
            fields.company.as_str(),
            fields.category.as_str(),
            fields.location.as_str(),
            fields.experience.as_str(),
        ]
        .join(" ")
        .to_lowercase();

        Self {
            id: fields.id,
            title: fields.title,
            company: fields.company,
            category: fields.category,
            location: fields.location,
            experience: fields.experience,
            salary_min: fields.salary_min,
            salary_max: fields.salary_max,
            posted_date: fields.posted_date,
            search_text,
        }
    }
}

/// The immutable set of records for one page view, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<JobRecord>,
    by_id: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub records: RecordSet,
    pub issues: Vec<RecordIssue>,
}

impl LoadReport {
    pub fn rejected(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.rejected)
            .map(|issue| issue.position)
            .collect::<HashSet<_>>()
            .len()
    }
}

impl RecordSet {
    /// Builds a set from already-validated records. Later duplicates of an id are dropped.
    pub fn new(records: Vec<JobRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            set.push(record);
        }
        set
    }

    fn push(&mut self, record: JobRecord) -> bool {
        if self.by_id.contains_key(&record.id) {
            return false;
        }
        self.by_id.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    pub fn load_from_path(path: &Path, policy: LoadPolicy) -> Result<LoadReport> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw, policy)
    }

    pub fn from_json_str(raw: &str, policy: LoadPolicy) -> Result<LoadReport> {
        let cards: Vec<RawJobCard> = serde_json::from_str(raw)?;
        Ok(Self::from_cards(cards, policy))
    }

    pub fn from_cards(cards: Vec<RawJobCard>, policy: LoadPolicy) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, card) in cards.into_iter().enumerate() {
            let position = index + 1;
            let id = card
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("job_{}", position));

            let mut issues = Vec::new();
            let salary_min = read_salary(&card.salary_min, "salaryMin", &mut issues);
            let salary_max = read_salary(&card.salary_max, "salaryMax", &mut issues);

            if let (Some(min), Some(max)) = (salary_min, salary_max) {
                if min > max {
                    issues.push(IssueKind::InvertedSalary { min, max });
                }
            }
            if card.title.trim().is_empty() {
                issues.push(IssueKind::EmptyTitle);
            }

            let posted_date = match card.date.as_deref() {
                None => {
                    issues.push(IssueKind::MissingDate);
                    None
                }
                Some(value) => {
                    let parsed = parse_posted_date(value);
                    if parsed.is_none() {
                        issues.push(IssueKind::InvalidDate {
                            value: value.to_string(),
                        });
                    }
                    parsed
                }
            };

            let duplicate = report.records.by_id.contains_key(&id);
            if duplicate {
                issues.push(IssueKind::DuplicateId);
            }
            let reserved = id.starts_with(RESERVED_ID_PREFIX);
            if reserved {
                issues.push(IssueKind::ReservedId);
            }

            let rejected = duplicate
                || reserved
                || (policy == LoadPolicy::Strict && issues.iter().any(rejects_in_strict_mode));

            for kind in issues {
                tracing::warn!(position, id = %id, rejected, issue = %kind, "job card issue");
                report.issues.push(RecordIssue {
                    position,
                    id: id.clone(),
                    message: kind.to_string(),
                    rejected,
                    kind,
                });
            }

            if rejected {
                continue;
            }

            report.records.push(JobRecord::from(JobFields {
                id,
                title: card.title,
                company: card.company,
                category: card.category,
                location: card.location,
                experience: card.experience,
                salary_min: salary_min.unwrap_or(0),
                salary_max: salary_max.unwrap_or(0),
                posted_date,
            }));
        }

        tracing::info!(
            loaded = report.records.len(),
            rejected = report.rejected(),
            issues = report.issues.len(),
            "job records loaded"
        );
        report
    }
}

fn read_salary(
    value: &Option<RawNumber>,
    field: &'static str,
    issues: &mut Vec<IssueKind>,
) -> Option<i64> {
    match value {
        None => {
            issues.push(IssueKind::MissingSalary { field });
            None
        }
        Some(raw) => {
            let parsed = raw.as_int();
            if parsed.is_none() {
                issues.push(IssueKind::MalformedSalary {
                    field,
                    value: raw.to_string(),
                });
            }
            parsed
        }
    }
}

fn rejects_in_strict_mode(kind: &IssueKind) -> bool {
    !matches!(kind, IssueKind::MissingDate | IssueKind::InvalidDate { .. })
}
