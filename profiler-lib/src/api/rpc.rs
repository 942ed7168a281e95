//! Minimal Ethereum JSON-RPC client, only used to read the current block height.

use crate::config::Config;
use crate::error::Error;
use crate::search::BlockHeightProvider;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::RequestHandler;

pub struct RpcClient {
    request_handler: RequestHandler,
    url: Url,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new() -> Result<Self, Error> {
        Ok(RpcClient::with_handler(Config::new()?.rpc_url, RequestHandler::new()))
    }

    pub fn with_handler(url: Url, request_handler: RequestHandler) -> Self {
        RpcClient { request_handler, url }
    }

    /// Returns the number of the most recent block via `eth_blockNumber`.
    pub fn block_number(&self) -> Result<u64, Error> {
        const METHOD: &str = "eth_blockNumber";

        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": METHOD, "params": [] });
        let response = self.request_handler.execute_post_deser::<RpcResponse>(&self.url, body)?;

        if let Some(error) = response.error {
            return Err(Error::RpcResponse(METHOD, format!("{} (code {})", error.message, error.code)));
        }

        match response.result {
            Some(quantity) => parse_quantity(&quantity),
            None => Err(Error::RpcResponse(METHOD, "missing result".to_string())),
        }
    }
}

impl BlockHeightProvider for RpcClient {
    fn block_number(&self) -> Result<u64, Error> {
        RpcClient::block_number(self)
    }
}

/// Parses a hex encoded JSON-RPC quantity such as `0x10d4f`.
fn parse_quantity(quantity: &str) -> Result<u64, Error> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| Error::RpcInvalidBlockNumber(quantity.to_string()))?;

    u64::from_str_radix(digits, 16).map_err(|_| Error::RpcInvalidBlockNumber(quantity.to_string()))
}
