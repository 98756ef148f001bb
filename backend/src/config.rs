use crate::{
    chains::Platform,
    types::{AppConfig, ConfigError, TokenEntry},
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use config::{Config, Environment, File, FileFormat};
use fluidgas_intent::Chain;
use std::path::Path;
use tracing::{info, warn};

/// Largest token precision the amount normalizer can represent.
const MAX_TOKEN_DECIMALS: u8 = 38;

/// Symbol of the test token whose address can be overridden at startup.
pub const TEST_TOKEN_SYMBOL: &str = "TestUSDC";

/// Configuration builder for the service
pub struct ConfigBuilder {
    config: Config,
}

/// CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<String>,
    pub port: Option<u16>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub sepolia_rpc_url: Option<String>,
    pub solana_rpc_url: Option<String>,
    pub test_token_address: Option<String>,
    pub log_level: Option<String>,
    pub sample_config: bool,
}

impl CliArgs {
    /// Parse from the process arguments and environment.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        CliArgs {
            config_file: matches.get_one::<String>("config").cloned(),
            port: matches.get_one::<String>("port").and_then(|s| s.parse().ok()),
            openai_api_key: matches.get_one::<String>("openai-api-key").cloned(),
            openai_model: matches.get_one::<String>("openai-model").cloned(),
            sepolia_rpc_url: matches.get_one::<String>("sepolia-rpc").cloned(),
            solana_rpc_url: matches.get_one::<String>("solana-rpc").cloned(),
            test_token_address: matches.get_one::<String>("test-token-address").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            sample_config: matches.get_flag("sample-config"),
        }
    }
}

fn command() -> Command {
    Command::new("fluidgas-backend")
        .version(env!("CARGO_PKG_VERSION"))
        .about("FluidGas prompt-to-bridge-parameters service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .env("FLUIDGAS_CONFIG_FILE"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("HTTP listen port")
                .env("PORT"),
        )
        .arg(
            Arg::new("openai-api-key")
                .long("openai-api-key")
                .value_name("KEY")
                .help("OpenAI API key")
                .env("OPENAI_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("openai-model")
                .long("openai-model")
                .value_name("MODEL")
                .help("Chat model used for intent extraction")
                .env("OPENAI_MODEL"),
        )
        .arg(
            Arg::new("sepolia-rpc")
                .long("sepolia-rpc")
                .value_name("URL")
                .help("Sepolia RPC URL")
                .env("SEPOLIA_RPC_URL"),
        )
        .arg(
            Arg::new("solana-rpc")
                .long("solana-rpc")
                .value_name("URL")
                .help("Solana devnet RPC URL")
                .env("SOLANA_DEVNET_RPC_URL"),
        )
        .arg(
            Arg::new("test-token-address")
                .long("test-token-address")
                .value_name("ADDRESS")
                .help("Sepolia address of the TestUSDC token")
                .env("EXAMPLE_SEPOLIA_TEST_TOKEN_ADDRESS"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .env("LOG_LEVEL"),
        )
        .arg(
            Arg::new("sample-config")
                .long("sample-config")
                .help("Print a sample configuration file and exit")
                .action(ArgAction::SetTrue),
        )
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create new config builder
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from multiple sources
    pub fn load(cli_args: &CliArgs) -> Result<AppConfig, ConfigError> {
        let mut builder = ConfigBuilder::new();

        // Precedence, lowest first: defaults, config file, environment, CLI
        builder.load_defaults()?;

        if let Some(config_file) = &cli_args.config_file {
            builder.load_file(config_file)?;
        } else {
            builder.try_load_default_files()?;
        }

        builder.load_environment()?;
        builder.apply_cli_overrides(cli_args)?;

        let mut config: AppConfig = std::mem::take(&mut builder.config).try_deserialize()?;

        if let Some(address) = &cli_args.test_token_address {
            override_test_token(&mut config, address);
        }

        builder.validate_config(&config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load default configuration values
    fn load_defaults(&mut self) -> Result<(), ConfigError> {
        let defaults = r#"
[server]
host = "0.0.0.0"
port = 3001
request_timeout_secs = 60
log_level = "info"

[openai]
api_key = ""
model = "gpt-3.5-turbo-0125"
base_url = "https://api.openai.com/v1"
timeout_secs = 30
temperature = 0.2

[bridge]
network = "Testnet"

[bridge.sepolia]
rpc_url = "https://rpc.sepolia.org"
core_bridge = ""
token_bridge = "0x4a8bc80Ed5a4067f1CCf107057b8270E0cC11A78"

[bridge.solana]
rpc_url = "https://api.devnet.solana.com"
core_bridge = ""
token_bridge = "3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5"

[bridge.quote]

[registry]
fallback_decimals = 6
unregistered_addresses = "assume"

[[registry.tokens.sepolia]]
symbol = "TestUSDC"
address = "0x07865c6E87B9F70255377e024ace6630C1Eaa37F"
decimals = 6

[[registry.tokens.sepolia]]
symbol = "USDC"
address = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
decimals = 6
"#;

        self.config = Config::builder()
            .add_source(File::from_str(defaults, FileFormat::Toml))
            .build()?;

        Ok(())
    }

    /// Load configuration from file
    fn load_file(&mut self, path: &str) -> Result<(), ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::Invalid(format!("Config file not found: {}", path)));
        }

        info!("Loading configuration from: {}", path);

        self.config = Config::builder()
            .add_source(self.config.clone())
            .add_source(File::with_name(path))
            .build()?;

        Ok(())
    }

    /// Try to load default configuration files
    fn try_load_default_files(&mut self) -> Result<(), ConfigError> {
        let default_paths = ["./fluidgas.toml", "./config.toml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                info!("Found default config file: {}", path);
                return self.load_file(path);
            }
        }

        warn!("No default config file found, using defaults and environment variables");
        Ok(())
    }

    /// Load environment variables
    fn load_environment(&mut self) -> Result<(), ConfigError> {
        self.config = Config::builder()
            .add_source(self.config.clone())
            .add_source(
                Environment::with_prefix("FLUIDGAS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(())
    }

    /// Apply CLI argument overrides
    fn apply_cli_overrides(&mut self, cli_args: &CliArgs) -> Result<(), ConfigError> {
        let mut builder = Config::builder().add_source(self.config.clone());

        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        if let Some(ref key) = cli_args.openai_api_key {
            builder = builder.set_override("openai.api_key", key.as_str())?;
        }

        if let Some(ref model) = cli_args.openai_model {
            builder = builder.set_override("openai.model", model.as_str())?;
        }

        if let Some(ref url) = cli_args.sepolia_rpc_url {
            builder = builder.set_override("bridge.sepolia.rpc_url", url.as_str())?;
        }

        if let Some(ref url) = cli_args.solana_rpc_url {
            builder = builder.set_override("bridge.solana.rpc_url", url.as_str())?;
        }

        if let Some(ref level) = cli_args.log_level {
            builder = builder.set_override("server.log_level", level.as_str())?;
        }

        self.config = builder.build()?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid(message.to_string()));

        // Language model
        if config.openai.api_key.trim().is_empty() {
            return invalid("OpenAI API key is required (set OPENAI_API_KEY)");
        }

        if config.openai.model.trim().is_empty() {
            return invalid("OpenAI model name is required");
        }

        if config.openai.timeout_secs == 0 {
            return invalid("OpenAI timeout must be greater than 0");
        }

        // Server
        if config.server.port == 0 {
            return invalid("Server port must be greater than 0");
        }

        if config.server.request_timeout_secs == 0 {
            return invalid("Request timeout must be greater than 0");
        }

        // Bridge
        if config.bridge.sepolia.token_bridge.trim().is_empty() {
            return invalid("Sepolia token bridge address is required");
        }

        if config.bridge.solana.token_bridge.trim().is_empty() {
            return invalid("Solana token bridge address is required");
        }

        if let Some(fee) = config.bridge.quote.relayer_fee {
            if fee.is_sign_negative() {
                return invalid("Relayer fee must not be negative");
            }
        }

        // Registry
        if config.registry.fallback_decimals > MAX_TOKEN_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "Fallback decimals must be at most {}",
                MAX_TOKEN_DECIMALS
            )));
        }

        for (chain_name, entries) in &config.registry.tokens {
            let chain = Chain::from_name(chain_name);
            let platform = Platform::of(&chain).ok_or_else(|| {
                ConfigError::Invalid(format!("Registry chain {} is not supported", chain_name))
            })?;

            for entry in entries {
                validate_token_entry(&chain, platform, entry)?;
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

fn validate_token_entry(chain: &Chain, platform: Platform, entry: &TokenEntry) -> Result<(), ConfigError> {
    if entry.symbol.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "Token {} on {} has an empty symbol",
            entry.address, chain
        )));
    }

    if entry.decimals > MAX_TOKEN_DECIMALS {
        return Err(ConfigError::Invalid(format!(
            "Token {} on {} has {} decimals; at most {} are supported",
            entry.symbol, chain, entry.decimals, MAX_TOKEN_DECIMALS
        )));
    }

    platform.parse_address(&entry.address).map_err(|e| {
        ConfigError::Invalid(format!(
            "Token {} on {} has an invalid address {}: {}",
            entry.symbol, chain, entry.address, e
        ))
    })?;

    Ok(())
}

/// Point the TestUSDC entry at `address`, adding it when absent.
fn override_test_token(config: &mut AppConfig, address: &str) {
    let entries = config
        .registry
        .tokens
        .entry(Chain::Sepolia.name().to_lowercase())
        .or_default();

    match entries
        .iter_mut()
        .find(|entry| entry.symbol.eq_ignore_ascii_case(TEST_TOKEN_SYMBOL))
    {
        Some(entry) => entry.address = address.to_string(),
        None => entries.push(TokenEntry {
            symbol: TEST_TOKEN_SYMBOL.to_string(),
            address: address.to_string(),
            decimals: 6,
        }),
    }

    info!("Using {} address {}", TEST_TOKEN_SYMBOL, address);
}

/// Load configuration with sensible defaults
pub fn load_config(cli_args: &CliArgs) -> Result<AppConfig, ConfigError> {
    ConfigBuilder::load(cli_args)
}

/// Create a sample configuration file
pub fn create_sample_config() -> String {
    r#"# FluidGas Backend Configuration
# Copy this file to fluidgas.toml and update the values

[server]
# Listen address
host = "0.0.0.0"
# HTTP port
port = 3001
# Per-request deadline in seconds
request_timeout_secs = 60
# Log level (trace, debug, info, warn, error)
log_level = "info"

[openai]
# API key (or set OPENAI_API_KEY)
api_key = "YOUR_OPENAI_API_KEY_HERE"
# Chat model used to read prompts
model = "gpt-3.5-turbo-0125"
# API base URL
base_url = "https://api.openai.com/v1"
# HTTP timeout in seconds
timeout_secs = 30
# Sampling temperature
temperature = 0.2

[bridge]
# Wormhole network
network = "Testnet"

[bridge.sepolia]
# Sepolia RPC endpoint
rpc_url = "https://rpc.sepolia.org"
# Wormhole core bridge (optional)
core_bridge = ""
# Wormhole token bridge; the wallet approves this spender
token_bridge = "0x4a8bc80Ed5a4067f1CCf107057b8270E0cC11A78"

[bridge.solana]
# Solana devnet RPC endpoint
rpc_url = "https://api.devnet.solana.com"
core_bridge = ""
# Wormhole token bridge program
token_bridge = "3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5"

[bridge.quote]
# Flat relayer fee in token units; leave unset to skip fee estimates
# relayer_fee = 0.25

[registry]
# Decimals assumed for unregistered token addresses
fallback_decimals = 6
# "assume" uses fallback_decimals, "reject" refuses unregistered addresses
unregistered_addresses = "assume"

[[registry.tokens.sepolia]]
symbol = "TestUSDC"
address = "0x07865c6E87B9F70255377e024ace6630C1Eaa37F"
decimals = 6

[[registry.tokens.sepolia]]
symbol = "USDC"
address = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
decimals = 6
"#
    .to_string()
}
