//! Taxonomy naming for media plans.
//!
//! - **Shortcode cache** (`cache`): per-instance, TTL-bound, generation-invalidated
//! - **Taxonomy rendering** (`taxonomy`): `<VARIABLE>` templates filled from
//!   free text or shortcode references

pub mod cache;
pub mod config;
pub mod error;
pub mod taxonomy;

pub use cache::ShortcodeCache;
pub use config::NamingConfig;
pub use error::{NamingError, Result};
pub use taxonomy::{TaxonomyValue, ValueFormat, placeholders, render_taxonomy, taxonomy_values};
