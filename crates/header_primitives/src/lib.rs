//! Block header primitives shared by header-service clients.
//!
//! This crate exposes:
//! - Block identifiers: `BlockHash` (reversed-hex text form), `HashParseError`
//! - Header records: `Header`, `HeaderState`
//! - Chain membership labels: `ChainState`
pub mod hash;
pub mod header;

pub use hash::{BlockHash, HashParseError};
pub use header::{ChainState, Header, HeaderState};
