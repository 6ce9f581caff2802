use aws_lambda_events::event::sns::SnsEvent;
use aws_lambda_events::event::sqs::SqsEvent;
use base64::prelude::*;
use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::JobError;
use crate::job::JobType;

/// A single job trigger: an encoded job type plus routing attributes.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct JobMessage {
    pub data: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub attributes: HashMap<String, String>,
}

impl JobMessage {
    pub fn new(data: impl Into<String>, attributes: HashMap<String, String>) -> Self {
        JobMessage {
            data: data.into(),
            attributes,
        }
    }

    /// Returns the job type string carried by `data`, which may arrive
    /// base64 encoded or already decoded.
    pub fn payload(&self) -> String {
        let raw = self.data.trim();
        if raw.parse::<JobType>().is_ok() {
            return raw.to_string();
        }

        match BASE64_STANDARD.decode(raw) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(decoded) => decoded.trim().to_string(),
                Err(_) => raw.to_string(),
            },
            Err(_) => raw.to_string(),
        }
    }
}

fn nullable_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<HashMap<String, String>> = Option::deserialize(deserializer)?;
    Ok(map.unwrap_or_default())
}

#[derive(Debug, serde::Deserialize)]
pub struct PushEnvelope {
    pub message: JobMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug)]
pub enum Combined {
    Message(JobMessage),
    Push(PushEnvelope),
    Sns(SnsEvent),
    Sqs(SqsEvent),
}

impl Combined {
    /// Flattens the envelope into the job messages it carries, in delivery order.
    ///
    /// An SQS record without a body cannot name a job and fails the whole event.
    pub fn into_messages(self) -> Result<Vec<JobMessage>, JobError> {
        match self {
            Combined::Message(message) => Ok(vec![message]),
            Combined::Push(envelope) => Ok(vec![envelope.message]),
            Combined::Sns(event) => Ok(event
                .records
                .into_iter()
                .map(|record| {
                    let attributes = record
                        .sns
                        .message_attributes
                        .into_iter()
                        .map(|(key, attr)| (key, attr.value))
                        .collect();
                    JobMessage::new(record.sns.message, attributes)
                })
                .collect()),
            Combined::Sqs(event) => event
                .records
                .into_iter()
                .map(|record| {
                    let body = record.body.ok_or_else(|| {
                        JobError::InvalidMessage(format!(
                            "sqs record {} has no body",
                            record.message_id.as_deref().unwrap_or("<unknown>")
                        ))
                    })?;
                    let attributes = record
                        .message_attributes
                        .into_iter()
                        .filter_map(|(key, attr)| attr.string_value.map(|v| (key, v)))
                        .collect();
                    Ok(JobMessage::new(body, attributes))
                })
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Combined {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value: Value = Deserialize::deserialize(deserializer)?;
        debug!("raw_value: {:?}", raw_value);

        if let Ok(message) = JobMessage::deserialize(&raw_value) {
            tracing::info!("job message detected");
            return Ok(Combined::Message(message));
        }

        if let Ok(envelope) = PushEnvelope::deserialize(&raw_value) {
            tracing::info!("push envelope detected");
            return Ok(Combined::Push(envelope));
        }

        if let Ok(event) = SnsEvent::deserialize(&raw_value) {
            tracing::info!("sns event detected");
            return Ok(Combined::Sns(event));
        }

        // sqs must come after sns: its records are all-optional and would
        // swallow an sns record with an empty body
        if let Ok(event) = SqsEvent::deserialize(&raw_value) {
            if event.records.is_empty() {
                return Err(de::Error::custom(format!(
                    "unsupported or bad event type: {raw_value}"
                )));
            }
            tracing::info!("sqs event detected");
            return Ok(Combined::Sqs(event));
        }

        Err(de::Error::custom(format!(
            "unsupported event type: {raw_value}"
        )))
    }
}
