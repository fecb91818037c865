//! Readers for the canonical JSON dataset format.

pub mod pgm_json;

pub use pgm_json::{
    load_network, load_result_set, parse_network, parse_result_set, DatasetEnvelope,
    DATASET_VERSION,
};
