pub mod account;
pub mod customer;
pub mod market;
pub mod news;
pub mod overview;
pub mod permission;
pub mod target;
pub mod task;

pub use account::{Account, Role};
pub use permission::{Page, PageAction, PagePermission, PermissionFlags};
