use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Customer row as shown in the customer list and overview drill-down tables
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerListRow {
    #[serde(rename = "Customer ID")]
    pub customer_id: String,
    #[serde(rename = "Risk Profile")]
    pub risk_profile: Option<String>,
    #[serde(rename = "AUM Label")]
    pub aum_label: Option<String>,
    #[serde(rename = "Propensity")]
    pub propensity: Option<String>,
    #[serde(rename = "Priority / Private")]
    pub priority_private: Option<String>,
    #[serde(rename = "Customer Type")]
    pub customer_type: Option<String>,
    #[serde(rename = "Pekerjaan")]
    pub pekerjaan: Option<String>,
    #[serde(rename = "Status Nikah")]
    pub status_nikah: Option<String>,
    #[serde(rename = "Usia")]
    pub usia: Option<i32>,
    #[serde(rename = "Annual Income")]
    pub annual_income: Option<f64>,
    #[serde(rename = "Total FUM")]
    pub total_fum: Option<f64>,
    #[serde(rename = "Total AUM")]
    pub total_aum: Option<f64>,
    #[serde(rename = "Total FBI")]
    pub total_fbi: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerId {
    pub bp_number_wm_core: String,
}

/// Single-customer profile card
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerDetail {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Risk_Profile")]
    pub risk_profile: Option<String>,
    #[serde(rename = "AUM_Label")]
    pub aum_label: Option<String>,
    #[serde(rename = "Propensity")]
    pub propensity: Option<String>,
    #[serde(rename = "Priority_Private")]
    pub priority_private: Option<String>,
    #[serde(rename = "Customer_Type")]
    pub customer_type: Option<String>,
    #[serde(rename = "Pekerjaan")]
    pub pekerjaan: Option<String>,
    #[serde(rename = "Status_Nikah")]
    pub status_nikah: Option<String>,
    #[serde(rename = "Usia")]
    pub usia: Option<i32>,
    #[serde(rename = "Annual_Income")]
    pub annual_income: Option<f64>,
    #[serde(rename = "Vintage")]
    pub vintage: Option<i32>,
    #[serde(rename = "Total_FUM")]
    pub total_fum: Option<f64>,
    #[serde(rename = "Total_AUM")]
    pub total_aum: Option<f64>,
    #[serde(rename = "Total_FBI")]
    pub total_fbi: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecommendationProduct {
    pub id_nasabah: String,
    pub nama_produk: String,
    pub profit: Option<f64>,
    pub offer_risk_profile: Option<String>,
    pub offer_product_risk_1: Option<String>,
    pub offer_product_risk_2: Option<String>,
    pub offer_product_risk_3: Option<String>,
    pub offer_product_risk_4: Option<String>,
    pub offer_product_risk_5: Option<String>,
    pub offer_reprofile_risk_target: Option<String>,
}

/// Latest-quarter asset mix for one customer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerPortfolio {
    pub casa: f64,
    pub sb: f64,
    pub deposito: f64,
    pub rd: f64,
    pub bac: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OptimizedAllocation {
    pub bp_number_wm_core: String,
    pub asset_type: String,
    pub usd_allocation: f64,
    pub assigned_rm: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReturnPercentage {
    pub current_return: Option<f64>,
    pub expected_return: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OwnedProduct {
    pub nama_produk: String,
    pub keterangan: Option<String>,
    pub jumlah_amount: f64,
    pub price_bought: Option<f64>,
    pub jumlah_transaksi: Option<i32>,
    pub profit: Option<f64>,
    pub return_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuarterlyAum {
    pub bp_number_wm_core: String,
    pub year: i32,
    pub quarter: i32,
    pub rd: f64,
    pub sb: f64,
    pub bac: f64,
    pub total_aum: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuarterlyFum {
    pub bp_number_wm_core: String,
    pub year: i32,
    pub quarter: i32,
    pub casa: f64,
    pub deposito: f64,
    pub total_fum: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i32,
    pub bp_number_wm_core: String,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Raw customer_info row, returned after edits
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerInfo {
    pub bp_number_wm_core: String,
    pub assigned_rm: Option<String>,
    pub risk_profile: String,
    pub aum_label: Option<String>,
    pub propensity: Option<String>,
    pub priority_private: Option<String>,
    pub customer_type: Option<String>,
    pub pekerjaan: Option<String>,
    pub status_nikah: Option<String>,
    pub usia: Option<i32>,
    pub annual_income: Option<Decimal>,
    pub tanggal_join_wealth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateResult {
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
