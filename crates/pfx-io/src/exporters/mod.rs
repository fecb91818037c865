//! Dataset writers.
//!
//! Canonical datasets are written in the same envelope the importers read;
//! the alternate network can be dumped as pandapower JSON for inspection or
//! for handing to an external engine.

pub mod formats;
pub mod metadata;
pub mod pgm_json;

pub use formats::pandapower::{export_alt_network_to_pandapower, pandapower_net_value};
pub use metadata::ExportMetadata;
pub use pgm_json::{
    network_to_json, result_set_to_json, write_network, write_result_set,
};
