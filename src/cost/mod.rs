// Cost engine: per-bin direction cost, matrix smoothing and candidate ranking

pub mod candidates;
pub mod cost_function;
pub mod polar_matrix;

pub use candidates::*;
pub use cost_function::*;
pub use polar_matrix::*;
