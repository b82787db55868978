//! Reqwest-based HTTP transport for the erlene integration gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use erlene_integration::{IntegrationGateway, MemoryProfileStore};
//! use erlene_reqwest::{ReqwestConfig, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new(ReqwestConfig::default())?;
//! let gateway = IntegrationGateway::new(transport, MemoryProfileStore::new());
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod transport;

pub use crate::config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use crate::error::{Error, Result};
pub use crate::transport::{ReqwestTransport, TRACING_TARGET};
