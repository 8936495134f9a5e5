// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use interpol::EnvInterpol;
use url::Url;

pub mod interpol;
pub mod paths;

/// Hex encoded secp256k1 secret key.
///
/// It never shows up in logs or when the settings are printed.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The chain we deploy to and how to sign and wait for transactions on it.
#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkSettings {
    /// Name of the network, used to keep the address books of different networks apart.
    pub name: String,
    /// JSON-RPC endpoint of the node.
    pub rpc_url: Url,
    /// Expected chain ID; if missing it's queried from the node.
    pub chain_id: Option<u64>,
    /// Key to sign transactions with. Not needed for offline commands.
    pub private_key: Option<PrivateKey>,
    /// How often to poll for pending transactions, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub polling_interval: Duration,
    /// Maximum number of polls for a transaction receipt.
    pub receipt_retries: usize,
    /// Number of blocks to wait after the one including the transaction.
    pub confirmations: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Home directory configured on the CLI, to which all paths in settings can be set relative.
    home_dir: PathBuf,
    /// Compiled contract artifacts.
    artifacts_dir: PathBuf,
    /// Persisted address books.
    output_dir: PathBuf,
    /// Deployment manifests.
    manifests_dir: PathBuf,

    pub network: NetworkSettings,
}

impl Settings {
    home_relative!(artifacts_dir, output_dir, manifests_dir);

    /// Load the default configuration from a directory,
    /// then potential overrides specific to the run mode,
    /// then overrides from the local environment,
    /// finally parse it into the [Settings] type.
    pub fn new(config_dir: &Path, home_dir: &Path, run_mode: &str) -> Result<Self, ConfigError> {
        Self::config(config_dir, home_dir, run_mode).and_then(Self::parse)
    }

    /// Load the configuration into a generic data structure.
    fn config(config_dir: &Path, home_dir: &Path, run_mode: &str) -> Result<Config, ConfigError> {
        Config::builder()
            .add_source(EnvInterpol(File::from(config_dir.join("default"))))
            // Optional network specific overrides, checked into git.
            .add_source(EnvInterpol(
                File::from(config_dir.join(run_mode)).required(false),
            ))
            // Optional local overrides, not checked into git.
            .add_source(EnvInterpol(
                File::from(config_dir.join("local")).required(false),
            ))
            // Add in settings from the environment (with a prefix of DEPLOYER)
            // e.g. `DEPLOYER_NETWORK__RPC_URL=http://foo:8545 ./target/deployer` would set the endpoint.
            .add_source(EnvInterpol(
                Environment::with_prefix("deployer")
                    .prefix_separator("_")
                    .separator("__")
                    // Not parsing primitives here, so keys made of digits stay strings.
                    .ignore_empty(true),
            ))
            // Everything in the config can be relative to the home directory passed to the CLI.
            .set_override("home_dir", home_dir.to_string_lossy().as_ref())?
            .build()
    }

    /// Try to parse the config into [Settings].
    fn parse(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    /// The configured home directory.
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Where the address book of a manifest is persisted on the configured network.
    pub fn address_book_path(&self, manifest_name: &str) -> PathBuf {
        self.output_dir()
            .join(&self.network.name)
            .join(format!("{manifest_name}.json"))
    }

    /// Resolve a manifest given either as a path, or as a name in the manifests directory.
    pub fn manifest_path(&self, manifest: &Path) -> PathBuf {
        if manifest.extension().is_some() || manifest.components().count() > 1 {
            paths::expand_tilde(manifest)
        } else {
            self.manifests_dir()
                .join(manifest)
                .with_extension("toml")
        }
    }
}
