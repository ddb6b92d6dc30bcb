use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub rm_account_id: i32,
    pub email: String,
    pub rm_number: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Account role as carried in tokens. Anything other than "admin" is a regular RM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_fall_back_to_user() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
        assert_eq!(Role::parse("supervisor"), Role::User);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let account = Account {
            rm_account_id: 7,
            email: "RM007@batiinvestasi.ai".to_string(),
            rm_number: "RM007".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            role: "user".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&account).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["rm_number"], "RM007");
    }
}
