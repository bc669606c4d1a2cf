pub mod ids;
pub mod experiment;
pub mod run;
pub mod evaluation;
pub mod model;
pub mod score;

pub use ids::*;
pub use experiment::*;
pub use run::*;
pub use evaluation::*;
pub use model::*;
pub use score::*;
