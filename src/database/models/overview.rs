use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// The five risk buckets customers are profiled into. Unprofiled customers carry '0'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskProfile {
    Conservative,
    Balanced,
    Moderate,
    Growth,
    Aggressive,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 5] = [
        RiskProfile::Conservative,
        RiskProfile::Balanced,
        RiskProfile::Moderate,
        RiskProfile::Growth,
        RiskProfile::Aggressive,
    ];

    /// Value stored in customer_info.risk_profile
    pub fn label(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "1 - Conservative",
            RiskProfile::Balanced => "2 - Balanced",
            RiskProfile::Moderate => "3 - Moderate",
            RiskProfile::Growth => "4 - Growth",
            RiskProfile::Aggressive => "5 - Aggressive",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::Balanced => "Balanced",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::Growth => "Growth",
            RiskProfile::Aggressive => "Aggressive",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// A value split across all profiled customers and each risk bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskBreakdown<T> {
    pub all: T,
    pub conservative: T,
    pub balanced: T,
    pub moderate: T,
    pub growth: T,
    pub aggressive: T,
}

impl<T> RiskBreakdown<T> {
    pub fn profile_mut(&mut self, profile: RiskProfile) -> &mut T {
        match profile {
            RiskProfile::Conservative => &mut self.conservative,
            RiskProfile::Balanced => &mut self.balanced,
            RiskProfile::Moderate => &mut self.moderate,
            RiskProfile::Growth => &mut self.growth,
            RiskProfile::Aggressive => &mut self.aggressive,
        }
    }
}

impl<T> From<(T, T, T, T, T, T)> for RiskBreakdown<T> {
    fn from((all, conservative, balanced, moderate, growth, aggressive): (T, T, T, T, T, T)) -> Self {
        Self {
            all,
            conservative,
            balanced,
            moderate,
            growth,
            aggressive,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuarterValues {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
}

impl QuarterValues {
    fn add(&mut self, quarter: i32, value: f64) {
        match quarter {
            1 => self.q1 += value,
            2 => self.q2 += value,
            3 => self.q3 += value,
            4 => self.q4 += value,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyYear {
    pub year: i32,
    pub quarters: RiskBreakdown<QuarterValues>,
}

/// One (year, quarter) total split by risk bucket
#[derive(Debug, Clone, FromRow)]
pub struct QuarterlyRiskRow {
    pub year: i32,
    pub quarter: i32,
    pub all: f64,
    pub conservative: f64,
    pub balanced: f64,
    pub moderate: f64,
    pub growth: f64,
    pub aggressive: f64,
}

/// Pivot per-quarter rows into one entry per year, oldest year first
pub fn pivot_quarterly(rows: Vec<QuarterlyRiskRow>) -> Vec<QuarterlyYear> {
    let mut years: BTreeMap<i32, RiskBreakdown<QuarterValues>> = BTreeMap::new();

    for row in rows {
        let entry = years.entry(row.year).or_default();
        entry.all.add(row.quarter, row.all);
        entry.conservative.add(row.quarter, row.conservative);
        entry.balanced.add(row.quarter, row.balanced);
        entry.moderate.add(row.quarter, row.moderate);
        entry.growth.add(row.quarter, row.growth);
        entry.aggressive.add(row.quarter, row.aggressive);
    }

    years
        .into_iter()
        .map(|(year, quarters)| QuarterlyYear { year, quarters })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product: String,
    pub amount: f64,
    pub category: String,
}

/// Ranked product row; `category` is "All" or a stored risk-profile label
#[derive(Debug, Clone, FromRow)]
pub struct RankedProductRow {
    pub category: String,
    pub nama_produk: String,
    pub total_amount: f64,
}

/// Split ranked rows into the overall list and one list per risk bucket.
/// Rows keep their incoming order; unknown categories are dropped.
pub fn group_top_products(rows: Vec<RankedProductRow>) -> RiskBreakdown<Vec<TopProduct>> {
    let mut grouped: RiskBreakdown<Vec<TopProduct>> = RiskBreakdown::default();

    for row in rows {
        if row.category == "All" {
            grouped.all.push(TopProduct {
                product: row.nama_produk,
                amount: row.total_amount,
                category: "All".to_string(),
            });
        } else if let Some(profile) = RiskProfile::from_label(&row.category) {
            grouped.profile_mut(profile).push(TopProduct {
                product: row.nama_produk,
                amount: row.total_amount,
                category: profile.name().to_string(),
            });
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, quarter: i32, all: f64, conservative: f64) -> QuarterlyRiskRow {
        QuarterlyRiskRow {
            year,
            quarter,
            all,
            conservative,
            balanced: 0.0,
            moderate: 0.0,
            growth: 0.0,
            aggressive: 0.0,
        }
    }

    #[test]
    fn pivots_quarters_into_years_oldest_first() {
        let rows = vec![
            row(2024, 2, 200.0, 20.0),
            row(2024, 1, 100.0, 10.0),
            row(2023, 4, 40.0, 4.0),
            row(2023, 3, 30.0, 3.0),
        ];

        let years = pivot_quarterly(rows);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2023);
        assert_eq!(years[1].year, 2024);

        assert_eq!(years[0].quarters.all, QuarterValues { q1: 0.0, q2: 0.0, q3: 30.0, q4: 40.0 });
        assert_eq!(years[1].quarters.all, QuarterValues { q1: 100.0, q2: 200.0, q3: 0.0, q4: 0.0 });
        assert_eq!(years[1].quarters.conservative.q2, 20.0);
        assert_eq!(years[1].quarters.aggressive, QuarterValues::default());
    }

    #[test]
    fn pivot_of_nothing_is_empty() {
        assert!(pivot_quarterly(Vec::new()).is_empty());
    }

    #[test]
    fn pivot_serializes_with_named_buckets() {
        let value = serde_json::to_value(pivot_quarterly(vec![row(2024, 1, 5.0, 1.0)])).unwrap();
        assert_eq!(value[0]["year"], 2024);
        assert_eq!(value[0]["quarters"]["all"]["q1"], 5.0);
        assert_eq!(value[0]["quarters"]["conservative"]["q1"], 1.0);
        assert_eq!(value[0]["quarters"]["growth"]["q4"], 0.0);
    }

    #[test]
    fn groups_top_products_by_bucket() {
        let rows = vec![
            RankedProductRow { category: "1 - Conservative".into(), nama_produk: "Deposito".into(), total_amount: 50.0 },
            RankedProductRow { category: "All".into(), nama_produk: "Reksa Dana A".into(), total_amount: 90.0 },
            RankedProductRow { category: "All".into(), nama_produk: "Deposito".into(), total_amount: 50.0 },
            RankedProductRow { category: "5 - Aggressive".into(), nama_produk: "Saham B".into(), total_amount: 70.0 },
            RankedProductRow { category: "0".into(), nama_produk: "Ignored".into(), total_amount: 1.0 },
        ];

        let grouped = group_top_products(rows);
        assert_eq!(grouped.all.len(), 2);
        assert_eq!(grouped.all[0].product, "Reksa Dana A");
        assert_eq!(grouped.all[0].category, "All");
        assert_eq!(grouped.conservative.len(), 1);
        assert_eq!(grouped.conservative[0].category, "Conservative");
        assert_eq!(grouped.aggressive[0].amount, 70.0);
        assert!(grouped.balanced.is_empty());
    }

    #[test]
    fn risk_labels_round_trip() {
        for profile in RiskProfile::ALL {
            assert_eq!(RiskProfile::from_label(profile.label()), Some(profile));
        }
        assert_eq!(RiskProfile::from_label("0"), None);
    }
}
