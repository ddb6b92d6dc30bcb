use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ManagedNumbers {
    pub rm_number: String,
    pub all_customers: i64,
    pub all_aum: f64,
    pub all_fbi: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuarterNumbers {
    pub rm_number: String,
    pub year: i32,
    pub quarter: i32,
    pub all_customers: i64,
    pub all_aum: f64,
    pub all_fbi: f64,
}

/// The two most recent reporting quarters, newest first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncreasedNumbers {
    pub current_quarter: Option<QuarterNumbers>,
    pub last_quarter: Option<QuarterNumbers>,
}

impl IncreasedNumbers {
    pub fn from_rows(rows: Vec<QuarterNumbers>) -> Self {
        let mut rows = rows.into_iter();
        Self {
            current_quarter: rows.next(),
            last_quarter: rows.next(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RmPortfolio {
    pub casa: f64,
    pub sb: f64,
    pub deposito: f64,
    pub rd: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LastTransaction {
    pub bp_number_wm_core: String,
    pub transaction_id: i64,
    pub jumlah_amount: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PotentialTransaction {
    pub id_nasabah: String,
    pub nama_produk: String,
    pub profit: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OfferProductRisk {
    pub bp_number_wm_core: String,
    pub risk_profile: Option<String>,
    pub offer_product_risk_1: Option<String>,
    pub offer_product_risk_2: Option<String>,
    pub offer_product_risk_3: Option<String>,
    pub offer_product_risk_4: Option<String>,
    pub offer_product_risk_5: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReprofileRiskTarget {
    pub bp_number_wm_core: String,
    pub risk_profile: Option<String>,
    pub offer_reprofile_risk_target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub rm_number: String,
    pub description: String,
    pub invitee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(year: i32, quarter: i32) -> QuarterNumbers {
        QuarterNumbers {
            rm_number: "RM001".to_string(),
            year,
            quarter,
            all_customers: 10,
            all_aum: 1.0,
            all_fbi: 0.5,
        }
    }

    #[test]
    fn increased_numbers_take_newest_first() {
        let numbers = IncreasedNumbers::from_rows(vec![quarter(2024, 2), quarter(2024, 1)]);
        assert_eq!(numbers.current_quarter.as_ref().map(|q| q.quarter), Some(2));
        assert_eq!(numbers.last_quarter.as_ref().map(|q| q.quarter), Some(1));

        let value = serde_json::to_value(&numbers).unwrap();
        assert!(value.get("currentQuarter").is_some());
        assert!(value.get("lastQuarter").is_some());
    }

    #[test]
    fn increased_numbers_tolerate_short_history() {
        let numbers = IncreasedNumbers::from_rows(vec![quarter(2024, 1)]);
        assert!(numbers.current_quarter.is_some());
        assert!(numbers.last_quarter.is_none());
    }
}
