use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DashboardTarget {
    pub id: i32,
    pub rm_number: String,
    pub metric_type: String,
    pub target_value: Decimal,
    pub target_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dashboard headline metrics an RM can set a target for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Customers,
    Aum,
    Fbi,
}

impl MetricType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customers" => Some(MetricType::Customers),
            "aum" => Some(MetricType::Aum),
            "fbi" => Some(MetricType::Fbi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Customers => "customers",
            MetricType::Aum => "aum",
            MetricType::Fbi => "fbi",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_metrics_only() {
        assert_eq!(MetricType::parse("customers"), Some(MetricType::Customers));
        assert_eq!(MetricType::parse("aum"), Some(MetricType::Aum));
        assert_eq!(MetricType::parse("fbi"), Some(MetricType::Fbi));
        assert_eq!(MetricType::parse("AUM"), None);
        assert_eq!(MetricType::parse("revenue"), None);
        assert_eq!(MetricType::parse(""), None);
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for metric in [MetricType::Customers, MetricType::Aum, MetricType::Fbi] {
            assert_eq!(MetricType::parse(metric.as_str()), Some(metric));
        }
    }
}
