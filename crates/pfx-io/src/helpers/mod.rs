pub mod network_validator;

pub use network_validator::{assert_valid_input, validate_network, ValidationConfig};
