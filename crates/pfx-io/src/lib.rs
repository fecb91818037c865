//! # pfx-io: Canonical dataset I/O and model translation
//!
//! Reads and writes the canonical JSON dataset format, validates canonical
//! networks, and translates them into the alternate table model and back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pfx_core::CalculationSymmetry;
//! use pfx_io::helpers::assert_valid_input;
//! use pfx_io::importers::load_network;
//! use pfx_io::translate::Translator;
//!
//! fn main() -> anyhow::Result<()> {
//!     let network = load_network("input.json")?;
//!     let diagnostics = assert_valid_input(&network, CalculationSymmetry::Symmetric)?;
//!     println!("{}", diagnostics.summary());
//!
//!     let translation = Translator::new(CalculationSymmetry::Symmetric).translate(&network)?;
//!     println!("{} alternate rows", translation.network.row_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`importers`] - canonical JSON datasets (input and output)
//! - [`exporters`] - canonical JSON writers and the pandapower JSON dump
//! - [`helpers`] - model-consistency validation
//! - [`translate`] - translator, index map and result reconciler

pub mod exporters;
pub mod helpers;
pub mod importers;
pub mod translate;

pub use helpers::{assert_valid_input, validate_network, ValidationConfig};
pub use importers::{load_network, load_result_set, parse_network, parse_result_set};
pub use translate::{reconcile, ComponentIndexMap, Translation, Translator};
