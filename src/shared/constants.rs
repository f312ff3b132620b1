// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Super admin role - maintains accident types and rules
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Inspector role - moves accidents through the review workflow
pub const ROLE_INSPECTOR: &str = "inspector";
