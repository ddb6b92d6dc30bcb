// handlers/elevated/mod.rs - Elevated handlers (admin role required)
//
// Account administration and the page permission matrix.
//
// Security Level: JWT Authentication + role = admin
// Route Prefix: /api/auth/{register,users,update-user,delete-user},
//               /api/permissions/{pages,users,defaults}
// Middleware: require_admin_middleware inside jwt_auth_middleware

pub mod permissions; // Page catalogue and per-user grants
pub mod users; // Register, list, update and delete RM accounts
