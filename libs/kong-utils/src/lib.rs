#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Small helpers shared by the Kong admin crates.

mod secret_string;
pub mod values;

pub use secret_string::{REDACTED, SecretString};
pub use values::Configuration;
