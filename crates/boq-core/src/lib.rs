//! boq-core: category tree, line-item ledger, and aggregation engine for
//! Bills of Quantities.
//!
//! A BOQ decomposes a construction project into a forest of work categories.
//! Each category may own priced line items (a catalog reference, a quantity,
//! and a unit price captured at attachment time). This crate holds the whole
//! in-memory model and the algorithms over it:
//!
//! - [`tree`] — validated construction of the category forest from flat
//!   records (orphan and cycle detection, sibling ordering, depth checks).
//! - [`ledger`] — grouping of line items under their owning categories.
//! - [`numbering`] — positional labels (`I`, `A.`, `1.`) per tree level.
//! - [`aggregate`] — post-order subtotal fold and grand total.
//! - [`render`] — the presentational row projection (headers interleaved
//!   with item rows, empty categories elided).
//! - [`engine`] — the mutation protocol over a versioned snapshot, with
//!   optimistic conflict detection at the persistence seam.
//!
//! # Conventions
//!
//! - **Errors**: every fallible operation returns [`error::Result`]; the
//!   variants of [`error::BoqError`] are all caller-recoverable.
//! - **Money**: monetary values are [`money::Money`] (exact decimal,
//!   rounded only at presentation).
//! - **Logging**: `tracing` macros (`debug!`, `warn!`); the core never
//!   installs a subscriber.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod model;
pub mod money;
pub mod numbering;
pub mod render;
pub mod tree;
