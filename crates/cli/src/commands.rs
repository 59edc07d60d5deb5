//! The create-asset command.

use std::sync::Arc;

use ledger_core::{Asset, ConnectionOptions, FileSystemWallet, NetworkDescriptor, Result};
use ledger_session::{Failure, Invocation, Outcome, SessionManager, Workflow};

use crate::config::CliConfig;

/// Outcome of one command run.
pub type CommandResult = std::result::Result<Outcome<Asset>, Failure>;

/// A fully resolved invocation, ready to run.
#[derive(Debug)]
pub struct Command {
    descriptor: NetworkDescriptor,
    options: ConnectionOptions,
    invocation: Invocation,
}

impl Command {
    /// Loads the profile and prepares the request described by `config`.
    ///
    /// Fails with a configuration error for an unreadable or invalid profile
    /// and with an argument error when the arguments do not fit the
    /// transaction.
    pub async fn from_config(config: &CliConfig) -> Result<Self> {
        let descriptor = NetworkDescriptor::load(&config.profile).await?;
        let invocation = config.invocation()?;
        let wallet = Arc::new(FileSystemWallet::new(&config.wallet));
        tracing::debug!(
            profile = %config.profile.display(),
            wallet = %config.wallet.display(),
            network = %descriptor.name,
            "configuration loaded"
        );
        Ok(Self {
            descriptor,
            options: config.options(wallet),
            invocation,
        })
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Runs the workflow on a session from `manager`.
    pub async fn run(self, manager: SessionManager) -> CommandResult {
        Workflow::new(manager, self.descriptor, self.options, self.invocation)
            .with_interface(Asset::contract_interface())
            .run::<Asset>()
            .await
    }
}
