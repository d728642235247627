//! Token endpoint constants

/// Token endpoint path, relative to the environment's base URL
pub const TOKEN_PATH: &str = "/oauth/v1/generate";

/// The only grant type the gateway issues tokens for
pub const GRANT_TYPE: &str = "client_credentials";

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_TTL_SECS: u64 = 3600;
