// crates/astra-rpc/src/lib.rs
//
// astra-rpc: HTTP transport for the hosted Astra ledger backend.
//
// Implements the astra-core collaborator traits (ledger store, procedures,
// directory, proposals, activity log) against a PostgREST-style REST API.

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::RestClient;
pub use config::{RestConfig, TokenSession};
pub use error::RestError;
