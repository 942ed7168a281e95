//! Etherscan client.
//!
//! Covers the `txlist` and `getabi` actions of the JSON API as well as the HTML contract pages at
//! <https://etherscan.io/address/>, from which [`crate::scraper`] extracts data not exposed by the API.

use crate::config::Config;
use crate::config::EtherscanConfig;
use crate::error::Error;
use crate::model::Transaction;
use crate::search::TransactionSource;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::RequestHandler;

pub struct EtherscanClient {
    request_handler: RequestHandler,
    token: String,
    api_url: Url,
    site_url: Url,
}

#[derive(Deserialize)]
struct Page<T> {
    result: T,
}

impl EtherscanClient {
    /// Returns a new Etherscan client configured from `.env`.
    pub fn new() -> Result<Self, Error> {
        Ok(EtherscanClient::with_handler(Config::new()?.etherscan, RequestHandler::new()))
    }

    pub fn with_handler(config: EtherscanConfig, request_handler: RequestHandler) -> Self {
        EtherscanClient {
            request_handler,
            token: config.token,
            api_url: config.api_url,
            site_url: config.site_url,
        }
    }

    fn api_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut().extend_pairs(params).append_pair("apikey", &self.token);

        url
    }

    /// Returns all transactions of `address` within the inclusive block range, in the order Etherscan
    /// lists them.
    pub fn get_transactions(&self, address: &str, startblock: u64, endblock: u64) -> Result<Vec<Transaction>, Error> {
        let url = self.api_url(&[
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("startblock", &startblock.to_string()),
            ("endblock", &endblock.to_string()),
        ]);

        Ok(self.request_handler.execute_etherscan_deser::<Page<Vec<Transaction>>>(&url)?.result)
    }

    /// Returns the parsed ABI of a verified contract.
    pub fn get_abi(&self, address: &str) -> Result<Value, Error> {
        let url = self.api_url(&[("module", "contract"), ("action", "getabi"), ("address", address)]);
        let page = self.request_handler.execute_etherscan_deser::<Page<String>>(&url)?;

        // The ABI itself is a JSON document encoded as string inside the response
        serde_json::from_str(&page.result).map_err(Error::ParseAbi)
    }

    /// Returns the raw HTML of the contract's Etherscan page.
    pub fn get_contract_page(&self, address: &str) -> Result<String, Error> {
        // The address becomes a path segment, `/` or `..` would point to a different page
        if address.is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::EtherscanInvalidAddress(address.to_string()));
        }

        let url = self.site_url.join(&format!("address/{address}"))?;
        self.request_handler.execute_text(&url)
    }
}

impl TransactionSource for EtherscanClient {
    fn get_transactions(&self, address: &str, startblock: u64, endblock: u64) -> Result<Vec<Transaction>, Error> {
        EtherscanClient::get_transactions(self, address, startblock, endblock)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::api::etherscan::EtherscanClient;
    use crate::api::testing::query_param;
    use crate::api::testing::FakeTransport;
    use crate::api::HttpRequest;
    use crate::api::RequestHandler;
    use crate::config::EtherscanConfig;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    pub fn client<F>(responder: F) -> (EtherscanClient, Arc<Mutex<Vec<HttpRequest>>>)
    where
        F: Fn(&HttpRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let (transport, requests) = FakeTransport::new(responder);
        let config = EtherscanConfig {
            token: "TOKEN".to_string(),
            api_url: Url::parse("https://api.etherscan.io/api").unwrap(),
            site_url: Url::parse("https://etherscan.io").unwrap(),
        };
        let handler = RequestHandler::with_transport(Box::new(transport)).rate_limit_sleep(Duration::ZERO);

        (EtherscanClient::with_handler(config, handler), requests)
    }

    #[test]
    fn get_transactions() {
        let (esc, requests) = client(|_| {
            let body = json!({
                "status": "1",
                "message": "OK",
                "result": [
                    { "blockNumber": "100", "hash": "0x01" },
                    { "blockNumber": "101", "hash": "0x02" },
                ],
            });

            (200, body.to_string())
        });

        let transactions = esc.get_transactions("0xdead", 100, 110).unwrap();
        let hashes: Vec<_> = transactions.iter().map(|tx| tx.hash().unwrap()).collect();
        assert_eq!(hashes, vec!["0x01", "0x02"]);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].url.path(), "/api");
        assert_eq!(query_param(&requests[0], "module").as_deref(), Some("account"));
        assert_eq!(query_param(&requests[0], "action").as_deref(), Some("txlist"));
        assert_eq!(query_param(&requests[0], "address").as_deref(), Some("0xdead"));
        assert_eq!(query_param(&requests[0], "startblock").as_deref(), Some("100"));
        assert_eq!(query_param(&requests[0], "endblock").as_deref(), Some("110"));
        assert_eq!(query_param(&requests[0], "apikey").as_deref(), Some("TOKEN"));
    }

    #[test]
    fn get_transactions_empty() {
        let (esc, _) = client(|_| {
            (200, r#"{"status":"0","message":"No transactions found","result":[]}"#.to_string())
        });

        assert!(esc.get_transactions("0xdead", 0, 1).unwrap().is_empty());
    }

    #[test]
    fn get_abi() {
        let (esc, requests) = client(|_| {
            let abi = r#"[{"inputs":[],"name":"totalSupply","outputs":[{"name":"","type":"uint256"}],"type":"function"}]"#;
            (200, json!({ "status": "1", "message": "OK", "result": abi }).to_string())
        });

        let abi = esc.get_abi("0x4a25e19e0765ef63d7196728ac3c3f3119199555").unwrap();
        assert_eq!(abi[0]["name"], "totalSupply");
        assert_eq!(abi[0]["outputs"][0]["type"], "uint256");

        let requests = requests.lock().unwrap();
        assert_eq!(query_param(&requests[0], "module").as_deref(), Some("contract"));
        assert_eq!(query_param(&requests[0], "action").as_deref(), Some("getabi"));
    }

    #[test]
    fn get_abi_invalid() {
        let (esc, _) = client(|_| (200, json!({ "status": "1", "message": "OK", "result": "[{" }).to_string()));
        assert!(matches!(esc.get_abi("0x01"), Err(Error::ParseAbi(_))));

        let (esc, _) = client(|_| {
            let body = json!({ "status": "0", "message": "NOTOK", "result": "Contract source code not verified" });
            (200, body.to_string())
        });
        assert!(matches!(esc.get_abi("0x01"), Err(Error::EtherscanContractSourceCodeNotVerified(_))));
    }

    #[test]
    fn get_contract_page() {
        let (esc, requests) = client(|_| (200, "<html></html>".to_string()));

        assert_eq!(esc.get_contract_page("0xbeef").unwrap(), "<html></html>");
        assert_eq!(requests.lock().unwrap()[0].url.as_str(), "https://etherscan.io/address/0xbeef");
    }

    #[test]
    fn get_contract_page_rejects_path_segments() {
        let (esc, requests) = client(|_| (200, "<html></html>".to_string()));

        for address in ["0xabc/../def", "..", "0x01?tab=code", ""] {
            assert!(matches!(esc.get_contract_page(address), Err(Error::EtherscanInvalidAddress(_))));
        }
        assert!(requests.lock().unwrap().is_empty());
    }
}
