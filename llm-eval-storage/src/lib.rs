//! Persistence for experiments, runs and their results
//!
//! Two [`EvalStore`](llm_eval_core::EvalStore) implementations:
//!
//! - [`InMemoryStore`]: concurrent maps, for tests and database-less runs
//! - [`PgStore`]: PostgreSQL through `sqlx`, schema under `migrations/`

pub mod memory;
pub mod postgres;
pub mod repositories;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, create_pool_with_config, PgStore, PostgresConfig};
pub use repositories::*;
