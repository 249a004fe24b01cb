//! Shared data models for the Vyral job workers.
//!
//! This crate provides Serde-serializable types for:
//! - Job requests and the completed/failed outcome envelope
//! - Operation identifiers and their HTTP paths
//! - Provider-side async job handles and status snapshots

pub mod job;
pub mod job_status;
pub mod operation;
pub mod provider_job;

// Re-export common types
pub use job::{JobId, JobOutcome, JobRequest, Params};
pub use job_status::JobStatus;
pub use operation::{Operation, UnknownOperation};
pub use provider_job::{AsyncJobSnapshot, AsyncJobStatus, JobHandle};
