#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod attempt;
mod descriptor;
mod error;
mod gateway;
mod health;
mod integration;
mod method;
mod request;

pub mod profile;
pub mod retry;
pub mod store;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use attempt::{AttemptOutcome, RequestAttempt};
pub use descriptor::{DEFAULT_TIMEOUT, IntegrationDescriptor};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use gateway::{IntegrationGateway, TRACING_TARGET};
pub use health::{ConnectionHealth, ConnectionStatus};
pub use integration::{Integration, verify_connection};
pub use method::HttpMethod;
pub use profile::{CallOutcome, IntegrationProfile, IntegrationStatus, TenantId};
pub use request::GatewayRequest;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use store::{MemoryProfileStore, ProfileStore};
pub use transport::{
    HttpTransport, TransportError, TransportErrorKind, TransportRequest, TransportResponse,
};
