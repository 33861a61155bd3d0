//! Evaluation engine for visually assembled digital logic circuits: inputs, clocks,
//! gates and output LEDs wired together, propagated to a fixed point and enumerated
//! into truth tables.
#[macro_use]
pub mod graph;
pub mod config;
pub mod data_structures;
pub mod error;
extern crate concat_idents;
pub use config::Config;
pub use error::*;
pub use graph::*;
