pub mod graders;
pub mod rubric;
pub mod rules;
pub mod summary;

pub use graders::*;
pub use rubric::*;
pub use rules::*;
pub use summary::*;
