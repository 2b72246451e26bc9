//! Data layer: core types, persistence, legacy migration and station filtering.
//!
//! Architecture:
//! ```text
//!  legacy per-station files      .parquet / .json
//!        │                              │
//!        ▼                              ▼
//!   ┌──────────┐                  ┌──────────┐
//!   │  legacy  │  reformat        │  loader  │  parse file → DataCollection
//!   └──────────┘                  └──────────┘
//!        │                              │
//!        └──────────────┬───────────────┘
//!                       ▼
//!              ┌────────────────┐
//!              │ DataCollection │  Specifications + station series
//!              └────────────────┘
//!                       │
//!                       ▼
//!                 ┌──────────┐
//!                 │  filter  │  keep selected stations
//!                 └──────────┘
//! ```

pub mod filter;
pub mod legacy;
pub mod loader;
pub mod model;
