//! Per-tenant integration profiles and their health bookkeeping.

mod model;
mod status;

pub use model::{CallOutcome, IntegrationProfile, TenantId};
pub use status::IntegrationStatus;
