// =============================================================================
// Remote API Module
// =============================================================================
//
// Plain HTTP GET access to the signal / calendar API:
// - `client`   — reqwest client, one method per endpoint
// - `envelope` — `{status, ...payload}` unwrapping into canonical types
// - `error`    — transport / status / envelope / decode taxonomy

pub mod client;
pub mod envelope;
pub mod error;

pub use client::ApiClient;
pub use error::FetchError;
