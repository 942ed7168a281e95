//! Config manager, reading the content of the `.env` file.
//!
//! Reads all content from `.env` into [`Config`] for all sub-modules to use.

use crate::error::Error;
use dotenv::dotenv;
use std::path::Path;
use std::path::PathBuf;
use url::Url;

pub struct Config {
    /// Etherscan endpoints and API token.
    pub etherscan: EtherscanConfig,

    /// Ethereum JSON-RPC endpoint used to read the current block height.
    pub rpc_url: Url,

    /// Directory holding one `<address>.json` file per scraped contract.
    pub cache_dir: PathBuf,

    /// Upper bound of block window iterations before a transaction search gives up.
    pub search_max_iterations: usize,
}

pub struct EtherscanConfig {
    /// Etherscan API token.
    pub token: String,

    /// JSON API endpoint, e.g. <https://api.etherscan.io/api>
    pub api_url: Url,

    /// Website root serving the contract pages, e.g. <https://etherscan.io>
    pub site_url: Url,
}

const ENV_VAR_TOKEN_ETHERSCAN: &str = "PROFILER_TOKEN_ETHERSCAN";
const ENV_VAR_ETHERSCAN_API_URL: &str = "PROFILER_ETHERSCAN_API_URL";
const ENV_VAR_ETHERSCAN_URL: &str = "PROFILER_ETHERSCAN_URL";
const ENV_VAR_RPC_URL: &str = "PROFILER_RPC_URL";
const ENV_VAR_CACHE_DIR: &str = "PROFILER_CACHE_DIR";
const ENV_VAR_SEARCH_MAX_ITERATIONS: &str = "PROFILER_SEARCH_MAX_ITERATIONS";

const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";
const DEFAULT_ETHERSCAN_URL: &str = "https://etherscan.io";
const DEFAULT_CACHE_DIR: &str = "contract_metadata_cache";
pub const DEFAULT_SEARCH_MAX_ITERATIONS: usize = 32;

#[inline]
fn read_and_return_env_var(env_var: &'static str) -> Result<String, Error> {
    let res = std::env::var(env_var)
        .map_err(|err| Error::ConfigReadNonExistantEnvironmentVariable(env_var, err))?;

    match res.is_empty() {
        true => Err(Error::ConfigReadEmptyEnvironmentVariable(env_var)),
        false => Ok(res),
    }
}

/// Returns the variable's value or `default` if it is unset or empty.
#[inline]
fn read_env_var_or(env_var: &'static str, default: &str) -> String {
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_url(env_var: &'static str, value: String) -> Result<Url, Error> {
    Url::parse(&value).map_err(|_| Error::ConfigInvalidValue(env_var, value))
}

impl Config {
    /// Returns a new config manager, reading the content of `.env`.
    pub fn new() -> Result<Self, Error> {
        match Path::new(".env").exists() {
            true => dotenv().map(|_| ())?,
            false => {
                // Neither file has to exist, plain environment variables work just as well
                if Path::new("../.env").exists() {
                    dotenv::from_filename("../.env")?;
                }
            }
        };

        Config::from_env()
    }

    /// Builds the config from the process environment only, without touching `.env`.
    pub fn from_env() -> Result<Self, Error> {
        let token = read_and_return_env_var(ENV_VAR_TOKEN_ETHERSCAN)?;
        let rpc_url = parse_url(ENV_VAR_RPC_URL, read_and_return_env_var(ENV_VAR_RPC_URL)?)?;

        let api_url = parse_url(
            ENV_VAR_ETHERSCAN_API_URL,
            read_env_var_or(ENV_VAR_ETHERSCAN_API_URL, DEFAULT_ETHERSCAN_API_URL),
        )?;
        let site_url =
            parse_url(ENV_VAR_ETHERSCAN_URL, read_env_var_or(ENV_VAR_ETHERSCAN_URL, DEFAULT_ETHERSCAN_URL))?;

        let cache_dir = PathBuf::from(read_env_var_or(ENV_VAR_CACHE_DIR, DEFAULT_CACHE_DIR));

        let max_iterations = read_env_var_or(
            ENV_VAR_SEARCH_MAX_ITERATIONS,
            &DEFAULT_SEARCH_MAX_ITERATIONS.to_string(),
        );
        let search_max_iterations = match max_iterations.parse::<usize>() {
            Ok(val) if val > 0 => val,
            _ => return Err(Error::ConfigInvalidValue(ENV_VAR_SEARCH_MAX_ITERATIONS, max_iterations)),
        };

        Ok(Config {
            etherscan: EtherscanConfig {
                token,
                api_url,
                site_url,
            },
            rpc_url,
            cache_dir,
            search_max_iterations,
        })
    }
}
