#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod cnj;
pub mod gmail;
pub mod google_drive;
mod registry;
pub mod stripe;

pub use cnj::{CnjConfig, CnjIntegration};
pub use gmail::{EmailMessage, GmailConfig, GmailIntegration};
pub use google_drive::{GoogleDriveConfig, GoogleDriveIntegration};
pub use registry::{ConnectorSettings, Connectors, IntegrationName};
pub use stripe::{StripeConfig, StripeEvent, StripeIntegration};
