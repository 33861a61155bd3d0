mod bit_iter;
mod bit_vector;
pub use bit_iter::*;
pub use bit_vector::*;
