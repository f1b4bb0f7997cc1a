use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::models::job::{JobRecord, RecordSet};
use crate::models::query::SALARY_UNIT_SCALE;

pub const SITE_NAME: &str = "Patent Hub";

/// What the page hands to the Web Share API or copies to the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct ShareService {
    base: Url,
}

impl ShareService {
    pub fn new(public_base_url: &str) -> Result<Self> {
        let mut raw = public_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).map_err(|e| {
            Error::Config(format!("Invalid public base url {}: {}", public_base_url, e))
        })?;
        Ok(Self { base })
    }

    fn page_url(&self, section: &str, id: &str) -> Result<String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("Public base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(section)
            .push(id);
        Ok(url.to_string())
    }

    pub fn job(&self, job: &JobRecord) -> Result<SharePayload> {
        Ok(SharePayload {
            title: format!("{} - {} | {}", job.title, job.company, SITE_NAME),
            text: format!(
                "年収{}-{}万円、{}勤務の求人情報",
                job.salary_min / SALARY_UNIT_SCALE,
                job.salary_max / SALARY_UNIT_SCALE,
                job.location
            ),
            url: self.page_url("jobs", &job.id)?,
        })
    }

    /// Company pages are keyed by the company name shown on its job cards.
    pub fn company(&self, records: &RecordSet, company: &str) -> Result<SharePayload> {
        let openings = records
            .records()
            .iter()
            .filter(|job| job.company == company)
            .count();
        if openings == 0 {
            return Err(Error::NotFound(format!("Company not found: {}", company)));
        }
        Ok(SharePayload {
            title: format!("{} - 企業情報 | {}", company, SITE_NAME),
            text: format!("{}の求人情報（{}件）をチェック！", company, openings),
            url: self.page_url("companies", company)?,
        })
    }
}
