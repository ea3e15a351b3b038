// credseal — client-side hybrid encryption and key delegation for the
// academic-records registry. The on-chain contract is an external
// collaborator reached through the `ledger::Ledger` trait.

pub mod access;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod records;
pub mod wallet;
