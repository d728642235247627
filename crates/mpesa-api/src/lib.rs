//! M-Pesa Daraja domain operations
//!
//! Typed request and response models for every supported gateway API, the
//! facades that send them, and parsers for the callbacks the gateway POSTs
//! back. Responses are decoded tolerantly: result codes may arrive as
//! numbers or strings, metadata values may be absent, and result parameters
//! may be a list or a single object. `Normalized::is_successful` compares
//! the normalized code against each model's success sentinel.
//!
//! Request flow:
//! 1. A facade validates the request and returns `Error::Validation` before
//!    any network call
//! 2. `Gateway` obtains a bearer token from the shared `Authenticator`
//! 3. The serialized request is POSTed through the `HttpClient`
//! 4. The body is decoded into the response model; a shape mismatch is
//!    `REQUEST_FAILED` carrying the raw body
//! 5. The outcome is counted in `mpesa_requests_total`

pub mod b2b;
pub mod b2b_payment;
pub mod b2c;
pub mod balance;
pub mod bill;
pub mod c2b;
pub mod client;
pub mod dynamic_qr;
pub mod error;
pub mod express;
pub mod gateway;
pub mod metadata;
pub mod normalize;
pub mod ratiba;
pub mod result;
pub mod reversal;
pub mod tax_remittance;
pub mod transaction_status;
pub mod validation;

pub use client::MpesaClient;
pub use error::{Error, Result};
pub use express::{StkCallback, StkCredentials, StkPushRequest, StkQueryRequest, TransactionType};
pub use gateway::Gateway;
pub use metadata::MetadataItem;
pub use normalize::{Normalized, ResultCode};
pub use result::{Acknowledgement, CallbackAck, ResultCallback, ResultParameter};
pub use validation::normalize_phone_number;
