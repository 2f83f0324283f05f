pub const SHOPPING_LIST_FILENAME: &str = "shopping_list";

/// `Authorization: Token <jwt>`
pub const TOKEN_PREFIX: &str = "Token ";

pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Recipe images travel inline as base64, so bodies are allowed to be large.
pub const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;
