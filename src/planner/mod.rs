// Planning cycle and the state it carries between cycles

pub mod local_planner;
pub mod obstacle_memory;
pub mod tree_direction;

pub use local_planner::*;
pub use obstacle_memory::*;
pub use tree_direction::*;
