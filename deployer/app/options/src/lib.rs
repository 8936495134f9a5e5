// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::ConfigArgs;
use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;

use self::{cut::CutArgs, deploy::DeployArgs, ownership::OwnershipArgs, plan::PlanArgs};

pub mod config;
pub mod cut;
pub mod deploy;
pub mod ownership;
pub mod parse;
pub mod plan;

mod log;

use log::{parse_log_level, LogLevel};

lazy_static! {
    static ref ENV_ALIASES: Vec<(&'static str, Vec<&'static str>)> =
        vec![("DEPLOYER_LOG_LEVEL", vec!["LOG_LEVEL", "RUST_LOG"])];
}

/// Parse the main arguments by:
/// 0. Detecting aliased env vars
/// 1. Parsing and returning the final [Options]
pub fn parse() -> Options {
    set_env_from_aliases();
    Options::parse()
}

/// Assign value to env vars from aliases, if the canonic key doesn't exist but the alias does.
fn set_env_from_aliases() {
    'keys: for (key, aliases) in ENV_ALIASES.iter() {
        for alias in aliases {
            if let (Err(_), Ok(value)) = (std::env::var(key), std::env::var(alias)) {
                std::env::set_var(key, value);
                continue 'keys;
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Deploy diamond contracts and cut their facets")]
pub struct Options {
    /// Set a custom directory for artifacts, manifests, outputs and configuration files.
    #[arg(short = 'd', long, default_value = "~/.deployer", env = "DEPLOYER_HOME_DIR")]
    pub home_dir: PathBuf,

    /// Set a custom directory for configuration files
    #[arg(long, env = "DEPLOYER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Set a custom directory for log files.
    #[arg(long, env = "DEPLOYER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Set a custom prefix for log files.
    #[arg(long, env = "DEPLOYER_LOG_FILE_PREFIX")]
    pub log_file_prefix: Option<String>,

    /// Optionally override the default configuration, typically with the settings of a network.
    #[arg(short, long, default_value = "dev", env = "DEPLOYER_MODE")]
    pub mode: String,

    /// Set the logging level of the console.
    #[arg(
        short = 'l',
        long,
        default_value = "info",
        env = "DEPLOYER_LOG_LEVEL",
        help = "Standard log levels, or a comma separated list of filters, e.g. 'debug,ethers_providers=warn'",
        value_parser = parse_log_level,
    )]
    log_level: LogLevel,

    /// Set the logging level of the log file. If missing, it defaults to the same level as the console.
    #[arg(
        long,
        env = "DEPLOYER_LOG_FILE_LEVEL",
        value_parser = parse_log_level,
    )]
    log_file_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Options {
    /// Tracing filter for the console.
    pub fn log_console_filter(&self) -> anyhow::Result<EnvFilter> {
        self.log_level.to_filter()
    }

    /// Tracing filter for the log file.
    pub fn log_file_filter(&self) -> anyhow::Result<EnvFilter> {
        if let Some(ref level) = self.log_file_level {
            level.to_filter()
        } else {
            self.log_console_filter()
        }
    }

    /// Path to the configuration directories.
    ///
    /// If not specified then returns the default under the home directory.
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir
            .as_ref()
            .cloned()
            .unwrap_or(self.home_dir.join("config"))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the configuration file and print it to the console.
    Config(ConfigArgs),
    /// Compute the facet cuts of a manifest without sending any transaction.
    Plan(PlanArgs),
    /// Deploy the contracts of a manifest, cut the facets into the diamonds and save the addresses.
    Deploy(DeployArgs),
    /// Cut the facets of already deployed diamonds, e.g. to finish an interrupted deployment.
    Cut(CutArgs),
    /// Query or transfer the ownership of a deployed contract.
    Ownership(OwnershipArgs),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::log::{Level, LogLevel};
    use crate::ownership::OwnershipCommands;
    use crate::parse::ContractRef;
    use crate::{Commands, Options};

    /// Parse the arguments with a program name, like the shell would pass it.
    fn parse_options(cmd: &str) -> Options {
        let args = cmd.split_ascii_whitespace().collect::<Vec<_>>();
        Options::try_parse_from(args).expect("failed to parse options")
    }

    #[test]
    fn parse_deploy() {
        let opts = parse_options("deployer --mode test deploy --manifest core");
        assert_eq!(opts.mode, "test");
        assert_eq!(opts.config_dir(), opts.home_dir.join("config"));

        match opts.command {
            Commands::Deploy(args) => {
                assert_eq!(args.manifest, PathBuf::from("core"));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_transfer_ownership() {
        let opts = parse_options(
            "deployer -l debug ownership transfer --contract Core --new-owner 0x0000000000000000000000000000000000000002",
        );
        assert_eq!(opts.log_level, LogLevel::Level(Level::Debug));

        match opts.command {
            Commands::Ownership(args) => match args.command {
                OwnershipCommands::Transfer(args) => {
                    assert_eq!(args.contract, ContractRef::Name("Core".to_owned()));
                    assert_eq!(
                        args.new_owner,
                        ethers_core::types::Address::from_low_u64_be(2)
                    );
                }
                other => panic!("unexpected subcommand: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_cut() {
        let opts = parse_options("deployer cut -m index --diamond Index");

        match opts.command {
            Commands::Cut(args) => {
                assert_eq!(args.manifest, PathBuf::from("index"));
                assert_eq!(args.diamond, Some("Index".to_owned()));
                assert!(args.addresses.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reject_malformed_owner() {
        let res = Options::try_parse_from([
            "deployer",
            "ownership",
            "transfer",
            "--contract",
            "Core",
            "--new-owner",
            "alice",
        ]);
        assert!(res.is_err());
    }
}
