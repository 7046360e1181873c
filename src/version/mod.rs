//! Version resolution layer
//!
//! This module turns a constraint expression into a single concrete version:
//! it parses the constraint, fetches the catalog of published versions, and
//! selects the best match.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Constraint  │────▶│  Selector   │◀────│  Registry   │
//! │  (parse)    │     │ (best match)│     │  (fetch)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   SemVer    │     │ Registries  │
//!                     │ (ordering)  │     │ (releases)  │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`constraint`]: Constraint expression parsing and clause matching
//! - [`registry`]: Registry trait for fetching the version catalog
//! - [`registries`]: Concrete registry implementations
//! - [`selector`]: Highest-satisfying-version selection
//! - [`semver`]: `SemanticVersion` and its total ordering
//! - [`error`]: Error types for parsing, fetching, and selection
//! - [`types`]: Common types like `VersionCatalog`

pub mod constraint;
pub mod error;
pub mod registries;
pub mod registry;
pub mod selector;
pub mod semver;
pub mod types;
