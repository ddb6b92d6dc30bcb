// handlers/public/mod.rs - endpoints that need no token
pub mod login;
pub mod system;

pub use login::login;
pub use system::{fallback, health, root};
