//! Runtime integration layer.
//!
//! Task spawning, cancellation and join barriers live here so the services and backends do not
//! each reinvent them.

pub(crate) mod worker_runtime;

pub use worker_runtime::WorkerGroup;
