//! Rotates pods of configured workloads once they outlive a maximum age.
//!
//! Each configured target gets its own loop ([`target_loop::TargetLoop`])
//! which resolves the workload's selector, picks running pods older than the
//! target's max life and evicts them, capped per iteration.

pub mod config;
pub mod coordinator;
pub mod evaluator;
pub mod executor;
pub mod k8s;
pub mod selector;
pub mod target_loop;
