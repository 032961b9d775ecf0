//! Shared building blocks for the edurag workspace: configuration, error
//! types, domain types, the `Embedder` seam and the chunking policy.

#![deny(unused_imports)]
#![deny(unused_variables)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;
