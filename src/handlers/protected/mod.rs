// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every endpoint an RM uses from the dashboard. Handlers receive the caller as
// `Extension<AuthUser>`, inserted by `jwt_auth_middleware`.
//
// Security Level: JWT Authentication Required
// Route Prefix: /api/* (auth, overview, customer-list, customer-details,
//               task-manager, market-indices, market-news, permissions,
//               dashboard-targets)
// Middleware: JWT validation, plus a page permission guard on customer writes

pub mod account; // whoami, password changes
pub mod customer_details; // One customer's profile, portfolio and activities
pub mod customer_list; // The RM's customer table
pub mod dashboard_targets; // Headline metric targets
pub mod market_indices; // Watchlists and index notes
pub mod market_news; // Product picks and news notes
pub mod overview; // Dashboard overview aggregates
pub mod permissions; // Effective permission check for the current user
pub mod task_manager; // Task calendar and RM book summaries

/*
Data scoping:

- Reads over an RM's book (overview, customer list/details, task manager
  summaries) take an optional `?rm_number=`. Administrators may name any RM;
  everyone else may only name themselves (403 otherwise). Omitted means the
  caller.
- Personal records (tasks, watchlists, notes, picks, targets) always belong to
  the token's rm_number. An id owned by someone else is reported as 404.
- Customer activities and profile edits are limited to the caller's own
  customers unless the caller is an administrator.
*/
