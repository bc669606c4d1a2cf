pub mod evaluation;
pub mod experiment;
pub mod model;
pub mod result;
pub mod run;

pub use evaluation::*;
pub use experiment::*;
pub use model::*;
pub use result::*;
pub use run::*;

use llm_eval_core::CoreError;

/// Map a unique-violation on insert to `AlreadyExists`, anything else to `Database`.
pub(crate) fn map_insert_error(err: sqlx::Error, what: impl FnOnce() -> String) -> CoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => CoreError::AlreadyExists(what()),
        _ => CoreError::from(err),
    }
}
