//! M-Pesa gateway authentication
//!
//! Exchanges the consumer key/secret pair for a short-lived bearer token and
//! caches it per client instance. Every domain operation asks the
//! `Authenticator` for a token before issuing its request; the token is
//! refreshed lazily when the cached one has expired or on demand.
//!
//! Token flow:
//! 1. `Authenticator::get_token(false)` locks the `TokenCache`
//! 2. A fresh cached `Credential` is returned without touching the network
//! 3. Otherwise `token::request_token()` performs the Basic-auth exchange
//! 4. The new `Credential` replaces the cached one; on failure the cache is
//!    left as it was and the classified `transport::Error` is returned

pub mod authenticator;
pub mod constants;
pub mod credentials;
pub mod token;

pub use authenticator::Authenticator;
pub use constants::*;
pub use credentials::{Credential, TokenCache};
pub use token::{TokenResponse, basic_auth_header, request_token};
pub use transport::{Error, ErrorCode, Result};
