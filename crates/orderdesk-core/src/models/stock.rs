use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    ManualAdjustment,
    Delivery,
    Promotion,
    Tester,
    Waste,
}

impl MovementType {
    pub const ALL: [MovementType; 6] = [
        MovementType::Purchase,
        MovementType::ManualAdjustment,
        MovementType::Delivery,
        MovementType::Promotion,
        MovementType::Tester,
        MovementType::Waste,
    ];

    /// Wire name, as accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::ManualAdjustment => "manual_adjustment",
            MovementType::Delivery => "delivery",
            MovementType::Promotion => "promotion",
            MovementType::Tester => "tester",
            MovementType::Waste => "waste",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::Purchase => write!(f, "Purchase"),
            MovementType::ManualAdjustment => write!(f, "Adjustment"),
            MovementType::Delivery => write!(f, "Delivery"),
            MovementType::Promotion => write!(f, "Promotion"),
            MovementType::Tester => write!(f, "Tester"),
            MovementType::Waste => write!(f, "Waste"),
        }
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        let wanted = if wanted == "adjustment" { "manual_adjustment".to_string() } else { wanted };
        Self::ALL
            .iter()
            .find(|t| t.as_str() == wanted)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!("Unknown movement type '{}' (expected one of: {})", s.trim(), names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub total_cost: Option<f64>,
    pub average_unit_cost: Option<f64>,
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub description: Option<String>,
    pub created_by: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockMovementCreate {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_from_str() {
        assert_eq!("purchase".parse::<MovementType>(), Ok(MovementType::Purchase));
        assert_eq!("Manual Adjustment".parse::<MovementType>(), Ok(MovementType::ManualAdjustment));
        assert_eq!("adjustment".parse::<MovementType>(), Ok(MovementType::ManualAdjustment));
        assert_eq!("WASTE".parse::<MovementType>(), Ok(MovementType::Waste));
        assert!("theft".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_parse_movement() {
        let json = r#"{"id": 2, "product_id": 4, "movement_type": "manual_adjustment", "quantity": -2,
            "total_cost": null, "average_unit_cost": null, "order_id": null, "customer_id": null,
            "description": "recount", "created_by": 1, "created_at": "2024-02-01T09:00:00"}"#;
        let movement: StockMovement = serde_json::from_str(json).expect("parse movement");
        assert_eq!(movement.movement_type, MovementType::ManualAdjustment);
        assert_eq!(movement.quantity, -2);
    }
}
