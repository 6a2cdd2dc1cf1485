pub mod completeness;
pub mod gate;

pub use completeness::looks_incomplete;
pub use gate::*;
