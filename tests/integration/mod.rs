//! Integration tests for crate storage, folder mirroring, and the CLI

mod cli_contracts;
mod mirror_sync;
mod store_roundtrip;
