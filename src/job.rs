use chrono::{DateTime, Days, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::JobError;
use crate::events::JobMessage;
use crate::store::TableRef;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum JobType {
    Currency,
    Facebook,
}

impl FromStr for JobType {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, JobError> {
        match s {
            "get_currency" => Ok(JobType::Currency),
            "get_facebook" => Ok(JobType::Facebook),
            other => Err(JobError::UnknownJobType(other.to_string())),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobType::Currency => write!(f, "get_currency"),
            JobType::Facebook => write!(f, "get_facebook"),
        }
    }
}

/// Source-specific parameters of a job.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Source {
    Currency {
        from_currency: String,
        to_currency: String,
    },
    Facebook {
        account_id: String,
    },
}

/// A fully validated unit of work: one source, one destination table, one day.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Job {
    pub source: Source,
    pub destination: TableRef,
    pub date: NaiveDate,
}

impl Job {
    /// Validates a message against the attributes its job type needs.
    /// `today` anchors the "yesterday" default when no date attribute is given.
    pub fn from_message(message: &JobMessage, today: NaiveDate) -> Result<Job, JobError> {
        let job_type = message.payload().parse::<JobType>()?;
        let attributes = &message.attributes;

        let destination = TableRef::new(
            required(attributes, "project_id")?,
            required(attributes, "dataset_id")?,
            required(attributes, "table_id")?,
        );
        let date = resolve_target_date(attributes, today)?;

        let source = match job_type {
            JobType::Currency => Source::Currency {
                from_currency: required(attributes, "from_currency")?,
                to_currency: required(attributes, "to_currency")?,
            },
            JobType::Facebook => Source::Facebook {
                account_id: required(attributes, "fb_account_id")?,
            },
        };

        Ok(Job {
            source,
            destination,
            date,
        })
    }

    pub fn job_type(&self) -> JobType {
        match self.source {
            Source::Currency { .. } => JobType::Currency,
            Source::Facebook { .. } => JobType::Facebook,
        }
    }
}

fn required(attributes: &HashMap<String, String>, key: &str) -> Result<String, JobError> {
    attributes
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| JobError::InvalidMessage(format!("missing attribute {}", key)))
}

/// The explicit `date` attribute if present, otherwise the day before `today`.
pub fn resolve_target_date(
    attributes: &HashMap<String, String>,
    today: NaiveDate,
) -> Result<NaiveDate, JobError> {
    match attributes.get("date").map(|d| d.trim()).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw),
        None => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| JobError::InvalidMessage(format!("no day precedes {}", today))),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, JobError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|e| JobError::InvalidMessage(format!("invalid date {:?} - {}", raw, e)))
}
