//! Permission strings carried in the `permissions` claim of a bearer token.

/// Common permission string constants for compile-time safety
pub mod consts {
    // Production logs
    pub const PRODUCTION_LOGS_READ: &str = "production-logs:read";
    pub const PRODUCTION_LOGS_WRITE: &str = "production-logs:write";

    // Inventory
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";
}

/// Role that bypasses every permission check
pub const ADMIN_ROLE: &str = "admin";

/// Every permission the API checks, for token issuance tooling and tests
pub const ALL_PERMISSIONS: [&str; 4] = [
    consts::PRODUCTION_LOGS_READ,
    consts::PRODUCTION_LOGS_WRITE,
    consts::INVENTORY_READ,
    consts::INVENTORY_ADJUST,
];
