//! Subcommands and the state they run against.

mod execute;
mod status;
mod test_connection;
mod validate;

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use erlene_connectors::Connectors;
use erlene_integration::{IntegrationGateway, MemoryProfileStore};
use erlene_reqwest::ReqwestTransport;
use serde::Serialize;

pub use self::execute::ExecuteArgs;
pub use self::status::StatusArgs;
pub use self::test_connection::TestConnectionArgs;
pub use self::validate::ValidateArgs;
use crate::config::{Cli, ProfilesFile};

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Decode and validate an integration configuration file
    Validate(ValidateArgs),
    /// Validate a configuration file and test the connection with it
    TestConnection(TestConnectionArgs),
    /// Execute a call through the gateway on behalf of a tenant
    Execute(ExecuteArgs),
    /// Show the health of every integration for a tenant
    Status(StatusArgs),
}

impl Command {
    /// Runs the command, writing its JSON output to `out`.
    pub async fn run(self, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Self::Validate(args) => args.run(app, out),
            Self::TestConnection(args) => args.run(app, out).await,
            Self::Execute(args) => args.run(app, out).await,
            Self::Status(args) => args.run(app, out).await,
        }
    }
}

/// Connectors and profiles shared by every subcommand.
#[derive(Debug, Clone)]
pub struct App {
    connectors: Connectors,
    store: MemoryProfileStore,
    profiles: Option<ProfilesFile>,
}

impl App {
    /// Builds the connectors over a reqwest transport and the configured profiles.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let profiles = cli.profiles_file();
        let store = match &profiles {
            Some(file) => file.load()?,
            None => MemoryProfileStore::new(),
        };

        let transport =
            ReqwestTransport::new(cli.http.clone()).context("failed to create HTTP transport")?;
        let gateway = IntegrationGateway::new(transport, store.clone());
        let connectors = Connectors::with_settings(gateway, &cli.connectors)?;

        Ok(Self::new(connectors, store, profiles))
    }

    /// Assembles an app from prepared parts.
    ///
    /// `store` must be the store the connectors' gateway records into.
    pub fn new(connectors: Connectors, store: MemoryProfileStore, profiles: Option<ProfilesFile>) -> Self {
        Self {
            connectors,
            store,
            profiles,
        }
    }

    pub fn connectors(&self) -> &Connectors {
        &self.connectors
    }

    pub fn store(&self) -> &MemoryProfileStore {
        &self.store
    }

    pub fn profiles(&self) -> Option<&ProfilesFile> {
        self.profiles.as_ref()
    }
}

/// Reads a JSON document from a file.
fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Writes a value as pretty JSON followed by a newline.
fn print_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use erlene_integration::mock::{MockTransport, RecordingSleeper};
    use erlene_integration::IntegrationProfile;

    use super::*;

    /// App over a scripted transport, optionally backed by a profiles file.
    pub fn app(
        transport: MockTransport,
        profiles: Vec<IntegrationProfile>,
        file: Option<ProfilesFile>,
    ) -> App {
        let store = MemoryProfileStore::from_profiles(profiles);
        let gateway = IntegrationGateway::new(transport, store.clone())
            .with_sleeper(RecordingSleeper::new());
        App::new(Connectors::new(gateway).unwrap(), store, file)
    }

    /// Decodes captured command output.
    pub fn output(buffer: Vec<u8>) -> serde_json::Value {
        serde_json::from_slice(&buffer).unwrap()
    }
}
