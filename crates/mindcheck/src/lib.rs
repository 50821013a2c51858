//! Mental-health evaluation backend: semaphore scoring of weighted
//! questionnaires with an LLM-backed analysis and a deterministic fallback,
//! plus a support assistant sharing the same completion provider.

pub mod assistant;
pub mod completion;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod telemetry;
