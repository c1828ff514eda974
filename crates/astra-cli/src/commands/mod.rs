// crates/astra-cli/src/commands/mod.rs
//
// Command module declarations for the astra CLI.

pub mod balance;
pub mod claim;
pub mod history;
pub mod proposals;
pub mod reward;
pub mod search;
pub mod send;
