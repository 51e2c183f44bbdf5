use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// A backend account. `GET /users/me/profile` returns the signed-in one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name to show in the title bar, falling back to the username
    pub fn display_name(&self) -> &str {
        let name = self.full_name.trim();
        if name.is_empty() {
            &self.username
        } else {
            name
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Disabled"
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreate {
    pub username: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{"id": 3, "username": "maria", "full_name": "Maria Lopez", "is_active": true,
            "created_at": "2024-01-10T08:00:00", "updated_at": "2024-02-01T12:30:00.250000"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.id, 3);
        assert_eq!(user.display_name(), "Maria Lopez");
        assert_eq!(user.status_label(), "Active");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let json = r#"{"id": 1, "username": "admin", "full_name": "  ", "is_active": false,
            "created_at": "2024-01-10T08:00:00Z", "updated_at": "2024-01-10T08:00:00Z"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.display_name(), "admin");
        assert_eq!(user.status_label(), "Disabled");
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).expect("serialize update");
        assert_eq!(json, serde_json::json!({"is_active": false}));
    }
}
