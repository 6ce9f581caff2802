use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Date,
    String,
    #[serde(alias = "INT64")]
    Integer,
    #[serde(alias = "FLOAT64")]
    Float,
    #[serde(alias = "STRUCT")]
    Record,
    /// Any column type found on an existing table that these pipelines never create.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Required,
    #[default]
    Nullable,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableFieldSchema>,
}

impl TableFieldSchema {
    pub fn new(name: &str, field_type: FieldType, mode: FieldMode) -> Self {
        TableFieldSchema {
            name: name.to_string(),
            field_type,
            mode,
            fields: Vec::new(),
        }
    }

    pub fn record(name: &str, mode: FieldMode, fields: Vec<TableFieldSchema>) -> Self {
        TableFieldSchema {
            name: name.to_string(),
            field_type: FieldType::Record,
            mode,
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartitioningType {
    Hour,
    Day,
    Month,
    Year,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePartitioning {
    #[serde(rename = "type")]
    pub partitioning_type: PartitioningType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl TimePartitioning {
    pub fn day(field: &str) -> Self {
        TimePartitioning {
            partitioning_type: PartitioningType::Day,
            field: Some(field.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clustering {
    pub fields: Vec<String>,
}

pub const AD_INSIGHT_CLUSTERING: &[&str] = &["campaign_id", "campaign_name"];

pub fn exchange_rate_schema() -> TableSchema {
    use FieldMode::Required;
    TableSchema {
        fields: vec![
            TableFieldSchema::new("date", FieldType::Date, Required),
            TableFieldSchema::new("currencies", FieldType::String, Required),
            TableFieldSchema::new("rate", FieldType::Float, Required),
        ],
    }
}

fn action_fields() -> Vec<TableFieldSchema> {
    vec![
        TableFieldSchema::new("action_type", FieldType::String, FieldMode::Nullable),
        TableFieldSchema::new("value", FieldType::String, FieldMode::Nullable),
    ]
}

pub fn ad_insight_schema() -> TableSchema {
    use FieldMode::{Repeated, Required};
    TableSchema {
        fields: vec![
            TableFieldSchema::new("date", FieldType::Date, Required),
            TableFieldSchema::new("ad_id", FieldType::String, Required),
            TableFieldSchema::new("ad_name", FieldType::String, Required),
            TableFieldSchema::new("adset_id", FieldType::String, Required),
            TableFieldSchema::new("adset_name", FieldType::String, Required),
            TableFieldSchema::new("campaign_id", FieldType::String, Required),
            TableFieldSchema::new("campaign_name", FieldType::String, Required),
            TableFieldSchema::new("clicks", FieldType::Integer, Required),
            TableFieldSchema::new("impressions", FieldType::Integer, Required),
            TableFieldSchema::new("spend", FieldType::Float, Required),
            TableFieldSchema::record("conversions", Repeated, action_fields()),
            TableFieldSchema::record("actions", Repeated, action_fields()),
        ],
    }
}
