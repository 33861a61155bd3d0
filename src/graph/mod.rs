mod circuit;
mod clock;
mod component;
mod gate;
mod handles;
#[macro_use]
mod propagation;
mod snapshot;
mod truth_table;
pub use circuit::*;
pub use component::*;
pub use gate::*;
pub use handles::*;
pub use snapshot::*;
pub use truth_table::*;
