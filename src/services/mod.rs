pub mod account_service;
pub mod customer_service;
pub mod market_service;
pub mod news_service;
pub mod overview_service;
pub mod permission_service;
pub mod target_service;
pub mod task_service;

pub use account_service::AccountService;
pub use customer_service::CustomerService;
pub use market_service::MarketService;
pub use news_service::NewsService;
pub use overview_service::OverviewService;
pub use permission_service::PermissionService;
pub use target_service::TargetService;
pub use task_service::TaskService;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial-update payloads. Use with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        reason: Option<Option<String>>,
    }

    #[test]
    fn double_option_separates_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.reason, None);

        let cleared: Patch = serde_json::from_str(r#"{"reason": null}"#).unwrap();
        assert_eq!(cleared.reason, Some(None));

        let set: Patch = serde_json::from_str(r#"{"reason": "earnings beat"}"#).unwrap();
        assert_eq!(set.reason, Some(Some("earnings beat".to_string())));
    }
}
