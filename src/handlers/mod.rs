// handlers/mod.rs - three security tiers
//
// Public (no auth) → Protected (JWT) → Elevated (JWT + admin role)
pub mod elevated;
pub mod protected;
pub mod public;

use serde::Deserialize;

/// `?rm_number=` accepted by every read endpoint scoped to an RM's book
#[derive(Debug, Default, Deserialize)]
pub struct RmQuery {
    pub rm_number: Option<String>,
}

/// `?id=` for deletes addressed by query string
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<i32>,
}
