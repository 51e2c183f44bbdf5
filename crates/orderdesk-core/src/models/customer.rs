use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerStatus {
    pub id: i64,
    pub status: String,
    #[serde(with = "timestamp")]
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerNote {
    pub id: i64,
    pub note: String,
    pub created_by: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub primary_phone: String,
    pub additional_phones: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub statuses: Vec<CustomerStatus>,
    #[serde(default)]
    pub notes: Vec<CustomerNote>,
}

impl Customer {
    /// Most recently assigned status, if any
    pub fn current_status(&self) -> Option<&CustomerStatus> {
        self.statuses.iter().max_by_key(|s| s.assigned_at)
    }

    pub fn status_label(&self) -> &str {
        self.current_status()
            .map(|s| s.status.as_str())
            .unwrap_or("-")
    }

    /// Notes, newest first
    pub fn notes_newest_first(&self) -> Vec<&CustomerNote> {
        let mut notes: Vec<&CustomerNote> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerCreate {
    pub name: String,
    pub primary_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_phones: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_phones: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCreate {
    pub status: String,
}
