use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::job::JobRecord;
use crate::utils::time::now;
use crate::utils::validation::validate;

pub const RECEIVED_MESSAGE: &str = "応募を受け付けました。企業からの連絡をお待ちください。";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuickApplyPayload {
    #[validate(custom(function = "crate::utils::validation::not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "crate::utils::validation::not_blank"))]
    pub motivation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub name: String,
    pub email: String,
    pub motivation: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReceipt {
    pub id: Uuid,
    pub job_id: String,
    pub job_title: String,
    pub submitted_at: DateTime<Utc>,
    pub message: String,
}

impl From<&Application> for ApplicationReceipt {
    fn from(value: &Application) -> Self {
        Self {
            id: value.id,
            job_id: value.job_id.clone(),
            job_title: value.job_title.clone(),
            submitted_at: value.submitted_at,
            message: RECEIVED_MESSAGE.to_string(),
        }
    }
}

/// Accepts quick applications and keeps them for the lifetime of the process.
#[derive(Clone, Default)]
pub struct ApplicationService {
    applications: Arc<RwLock<Vec<Application>>>,
}

impl ApplicationService {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, job, payload), fields(job_id = %job.id))]
    pub fn submit(&self, job: &JobRecord, payload: QuickApplyPayload) -> Result<ApplicationReceipt> {
        validate(&payload)?;

        let application = Application {
            id: Uuid::new_v4(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            motivation: payload.motivation.trim().to_string(),
            submitted_at: now(),
        };
        let receipt = ApplicationReceipt::from(&application);

        self.applications
            .write()
            .map_err(|_| Error::Internal("application store lock poisoned".to_string()))?
            .push(application);

        info!(application_id = %receipt.id, "quick application received");
        Ok(receipt)
    }

    pub fn for_job(&self, job_id: &str) -> Result<Vec<Application>> {
        let applications = self
            .applications
            .read()
            .map_err(|_| Error::Internal("application store lock poisoned".to_string()))?;
        Ok(applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }
}
