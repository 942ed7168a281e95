//! Errors that might be returned when using this crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Etherscan Errors
    #[error("Invalid Etherscan token '{0}'")]
    EtherscanInvalidToken(String),

    #[error("Failed to retrieve source for '{0}'; Contract source code not verified")]
    EtherscanContractSourceCodeNotVerified(String),

    #[error("Invalid contract address '{0}'")]
    EtherscanInvalidAddress(String),

    #[error("Etherscan returned an error for '{0}'; {1}")]
    EtherscanResponse(String, String),

    #[error("Giving up on '{0}' after {1} rate limited attempts")]
    EtherscanRateLimited(String, usize),

    // HTTP Errors
    #[error("Failed to send HTTP request; {0}")]
    HttpRequest(#[source] reqwest::Error),

    #[error("Unexpected HTTP status {1} for '{0}'")]
    HttpStatus(String, u16),

    #[error("Failed to build request URL; {0}")]
    Url(#[from] url::ParseError),

    // RPC Errors
    #[error("JSON-RPC call '{0}' failed; {1}")]
    RpcResponse(&'static str, String),

    #[error("Invalid block number '{0}' returned by node")]
    RpcInvalidBlockNumber(String),

    // Config Errors
    #[error("Failed to read .env file; {0}")]
    ConfigRead(#[from] dotenv::Error),

    #[error("Environment variable '{0}' does not exist; {1}")]
    ConfigReadNonExistantEnvironmentVariable(&'static str, #[source] std::env::VarError),

    #[error("Environment variable '{0}' is empty")]
    ConfigReadEmptyEnvironmentVariable(&'static str),

    #[error("Environment variable '{0}' has an invalid value '{1}'")]
    ConfigInvalidValue(&'static str, String),

    // Parser / Deserializer
    #[error("Failed to deserialize JSON input; {0}")]
    DeserializeError(#[from] serde_json::Error),

    #[error("Failed to deserialize content, invalid ABI?")]
    ParseAbi(#[source] serde_json::Error),

    // Scraper
    #[error("Contract page is missing field '{0}'")]
    ScrapeMissingField(&'static str),

    #[error("Contract page has an invalid value for field '{0}'; {1}")]
    ScrapeInvalidField(&'static str, String),

    // Cache
    #[error("Failed to access cache entry '{0}'; {1}")]
    CacheIo(String, #[source] std::io::Error),

    #[error("Cache entry '{0}' does not exist")]
    CacheMiss(String),

    #[error("Invalid cache key '{0}'")]
    CacheInvalidKey(String),

    // Transaction search
    #[error("Found only {found} of {limit} transactions for '{address}' after {iterations} iterations")]
    TransactionSearchExhausted {
        address: String,
        limit: usize,
        found: usize,
        iterations: usize,
    },
}
