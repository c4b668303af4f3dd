//! # slagmap Common Library
//!
//! Shared code for the slagmap tools including:
//! - Oxide compositions and their reduction to CaO–SiO₂–Al₂O₃
//! - The ordered phase-region rule table
//! - The slag catalog and its key-value storage port
//! - Ternary plot data for external renderers
//! - Configuration loading and database initialization

pub mod catalog;
pub mod composition;
pub mod config;
pub mod db;
pub mod error;
pub mod phase;
pub mod plot;
pub mod reducer;
pub mod store;

pub use catalog::{CatalogSnapshot, SlagCatalog, SlagId, SlagRecord, CATALOG_KEY};
pub use composition::{Oxide, RawComposition};
pub use error::{Error, Result};
pub use phase::{CsCategory, PhaseLabel};
pub use plot::{plot_points, TernaryFigure, TernaryPoint};
pub use reducer::{reduce, DerivedMetrics, NormalizedComposition, Reduction};
pub use store::{MemoryStore, SlagStore, SqliteStore};
