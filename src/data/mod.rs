//! Data layer: table model, loading, filtering, aggregation and export.
//!
//! Architecture:
//! ```text
//!  uploaded bytes (.csv / .xlsx)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse bytes → Table (raw, immutable)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ pipeline │  range filter, then categorical filters in order
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ proportion │  % per target label, raw and filtered
//!   └────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export  │  Table → CSV / xlsx bytes
//!   └──────────┘
//! ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod proportion;
