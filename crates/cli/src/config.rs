//! Command-line configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ledger_core::options::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_SUBMIT_TIMEOUT};
use ledger_core::{
    Asset, ConnectionOptions, DiscoveryPolicy, Result, TransactionRequest, Wallet,
};
use ledger_session::Invocation;

/// Note printed under the options of `--help`.
pub const PROTOCOL_NOTE: &str = "Peers in the profile must run a gateway service that speaks this \
tool's framed-JSON gateway protocol. The network's gRPC gateway endpoint is not supported.";

/// Submits one transaction to a contract and reports the created asset.
#[derive(Debug, Clone, Parser)]
#[command(name = "create-asset", version, after_help = PROTOCOL_NOTE)]
pub struct CliConfig {
    /// Connection profile, JSON only (convert YAML profiles to JSON first)
    #[arg(long, env = "LEDGER_PROFILE", default_value = "connection-org1.json")]
    pub profile: PathBuf,

    /// Wallet directory holding `<identity>.id` files
    #[arg(long, env = "LEDGER_WALLET", default_value = "wallet")]
    pub wallet: PathBuf,

    /// Identity to connect as
    #[arg(long, env = "LEDGER_IDENTITY", default_value = "appUser")]
    pub identity: String,

    #[arg(long, env = "LEDGER_CHANNEL", default_value = "mychannel")]
    pub channel: String,

    #[arg(long, env = "LEDGER_CONTRACT", default_value = "iothospital")]
    pub contract: String,

    #[arg(long, default_value = Asset::CREATE)]
    pub transaction: String,

    /// Positional transaction arguments
    #[arg(default_values = ["1", "P001", "1", "Patient Report", "D001"])]
    pub args: Vec<String>,

    /// Use the profile's static channel peers instead of discovery
    #[arg(long)]
    pub no_discovery: bool,

    /// Rewrite discovered peer hosts to localhost (local test networks)
    #[arg(long, conflicts_with = "no_discovery")]
    pub as_localhost: bool,

    #[arg(long, env = "LEDGER_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "LEDGER_SUBMIT_TIMEOUT_SECS", default_value_t = DEFAULT_SUBMIT_TIMEOUT.as_secs())]
    pub submit_timeout_secs: u64,
}

impl CliConfig {
    pub fn discovery(&self) -> DiscoveryPolicy {
        if self.no_discovery {
            DiscoveryPolicy::disabled()
        } else if self.as_localhost {
            DiscoveryPolicy::local()
        } else {
            DiscoveryPolicy::enabled()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    /// The request to submit, with arguments typed when the transaction is
    /// one the asset contract declares.
    pub fn request(&self) -> Result<TransactionRequest> {
        Asset::contract_interface().parse(&self.transaction, &self.args)
    }

    pub fn invocation(&self) -> Result<Invocation> {
        Ok(Invocation::new(&self.channel, &self.contract, self.request()?))
    }

    pub fn options(&self, wallet: Arc<dyn Wallet>) -> ConnectionOptions {
        ConnectionOptions::builder(&self.identity, wallet)
            .discovery(self.discovery())
            .connect_timeout(self.connect_timeout())
            .submit_timeout(self.submit_timeout())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Arg, ErrorKind};

    fn help() -> String {
        use clap::CommandFactory;
        let help = CliConfig::command().render_help().to_string();
        help.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_help_states_profile_format_and_protocol() {
        let help = help();
        assert!(help.contains("JSON only"), "{}", help);
        assert!(help.contains("framed-JSON gateway protocol"), "{}", help);
    }

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("create-asset").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_reproduce_fixture_invocation() {
        let config = parse(&[]);
        let invocation = config.invocation().unwrap();

        assert_eq!(invocation.channel, "mychannel");
        assert_eq!(invocation.contract, "iothospital");
        assert_eq!(invocation.request.name(), "createAsset");
        assert_eq!(
            invocation.request.args(),
            &[
                Arg::from("1"),
                Arg::from("P001"),
                Arg::Int(1),
                Arg::from("Patient Report"),
                Arg::from("D001"),
            ]
        );
        assert_eq!(config.discovery(), DiscoveryPolicy::enabled());
        assert_eq!(config.submit_timeout(), DEFAULT_SUBMIT_TIMEOUT);
    }

    #[test]
    fn test_positional_args_override_defaults() {
        let config = parse(&["7", "P042", "3", "Lab Result", "D009"]);
        let request = config.request().unwrap();
        assert_eq!(request.to_string(), r#"createAsset("7", "P042", 3, "Lab Result", "D009")"#);
    }

    #[test]
    fn test_non_numeric_version_is_argument_error() {
        let config = parse(&["7", "P042", "three", "Lab Result", "D009"]);
        assert_eq!(config.request().unwrap_err().kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_unknown_transaction_passes_strings() {
        let config = parse(&["--transaction", "archiveAsset", "7"]);
        let request = config.request().unwrap();
        assert_eq!(request.args(), &[Arg::from("7")]);
    }

    #[test]
    fn test_discovery_flags() {
        assert_eq!(parse(&["--no-discovery"]).discovery(), DiscoveryPolicy::disabled());
        assert_eq!(parse(&["--as-localhost"]).discovery(), DiscoveryPolicy::local());
        assert!(CliConfig::try_parse_from(["create-asset", "--no-discovery", "--as-localhost"]).is_err());
    }
}
