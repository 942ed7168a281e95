//! Etherscan and JSON-RPC API clients.
//!
//! Every request goes through a [`RequestHandler`] which sends it over a [`Transport`] and hands the raw
//! response to a [`ResponseHandler`] deciding whether the response is usable, has to be retried or is an
//! error.

use crate::error::Error;
use log::debug;
use log::warn;
use reqwest::blocking::Client;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub mod etherscan;
pub mod rpc;

/// Number of attempts for requests answered with a rate limit message before giving up.
const RATE_LIMIT_ATTEMPTS: usize = 5;

/// Etherscan allows 5 API calls per second, hence sleep 1 second before retrying.
const RATE_LIMIT_SLEEP_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Sends a single HTTP request and returns the response, regardless of its status code.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        ReqwestTransport {
            client: Client::default(),
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(Error::HttpRequest)?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().map_err(Error::HttpRequest)?;

        Ok(HttpResponse { url, status, body })
    }
}

pub struct RequestHandler {
    transport: Box<dyn Transport>,
    rate_limit_sleep: Duration,
}

/// Handler responsible for sites which don't need any special error handling
struct GenericResponseHandler;

/// Handler responsible for the Etherscan JSON API, which wraps its status inside the response body
struct EtherscanResponseHandler;

trait ResponseHandler {
    /// Given a response different error status codes are handled.
    fn process(response: HttpResponse) -> Result<ResponseHandlerResult, Error>;
}

enum ResponseHandlerResult {
    Ok(String),
    RetryRateLimited,
}

impl RequestHandler {
    pub fn new() -> Self {
        RequestHandler::with_transport(Box::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        RequestHandler {
            transport,
            rate_limit_sleep: RATE_LIMIT_SLEEP_DURATION,
        }
    }

    /// Overrides the pause between rate limited attempts.
    pub fn rate_limit_sleep(mut self, duration: Duration) -> Self {
        self.rate_limit_sleep = duration;
        self
    }

    #[inline]
    fn execute<T: ResponseHandler>(&self, request: &HttpRequest) -> Result<String, Error> {
        let url = redact(&request.url);

        for attempt in 1..=RATE_LIMIT_ATTEMPTS {
            debug!("{} {url}", request.method);

            let mut response = self.transport.send(request)?;
            response.url = url.clone();

            match T::process(response)? {
                ResponseHandlerResult::Ok(body) => return Ok(body),

                ResponseHandlerResult::RetryRateLimited => {
                    warn!("Rate limited on attempt {attempt}/{RATE_LIMIT_ATTEMPTS} ({url})");
                    std::thread::sleep(self.rate_limit_sleep);
                }
            }
        }

        Err(Error::EtherscanRateLimited(url, RATE_LIMIT_ATTEMPTS))
    }

    fn get(url: &Url) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: url.clone(),
            body: None,
        }
    }

    pub fn execute_text(&self, url: &Url) -> Result<String, Error> {
        self.execute::<GenericResponseHandler>(&RequestHandler::get(url))
    }

    pub fn execute_etherscan_deser<U: DeserializeOwned>(&self, url: &Url) -> Result<U, Error> {
        let content = self.execute::<EtherscanResponseHandler>(&RequestHandler::get(url))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn execute_post_deser<U: DeserializeOwned>(&self, url: &Url, body: Value) -> Result<U, Error> {
        let request = HttpRequest {
            method: Method::POST,
            url: url.clone(),
            body: Some(body),
        };

        let content = self.execute::<GenericResponseHandler>(&request)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Returns the URL as string with the API key masked, so it can be logged or embedded in errors.
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "apikey") {
        return url.to_string();
    }

    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "apikey" { "***".to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

impl ResponseHandler for GenericResponseHandler {
    fn process(response: HttpResponse) -> Result<ResponseHandlerResult, Error> {
        match response.status {
            200 => Ok(ResponseHandlerResult::Ok(response.body)),

            status => Err(Error::HttpStatus(response.url, status)),
        }
    }
}

impl ResponseHandler for EtherscanResponseHandler {
    fn process(response: HttpResponse) -> Result<ResponseHandlerResult, Error> {
        #[derive(Deserialize)]
        struct Page {
            status: String,
            #[serde(default)]
            message: String,
            result: Value,
        }

        if response.status != 200 {
            return Err(Error::HttpStatus(response.url, response.status));
        }

        // Etherscan always returns a 200 status code regardless of whether or not the request was
        // successful. The actual status is wrapped within the JSON body.
        let json = serde_json::from_str::<Page>(&response.body)?;
        if json.status == "1" {
            return Ok(ResponseHandlerResult::Ok(response.body));
        }

        // An account without transactions in the queried range is reported as an error with an empty result
        if json.message == "No transactions found" {
            return Ok(ResponseHandlerResult::Ok(response.body));
        }

        let reason = match json.result.as_str() {
            Some(result) => result.to_string(),
            None => json.message,
        };

        match reason.as_str() {
            "Invalid API Key" => Err(Error::EtherscanInvalidToken(response.url)),

            "Contract source code not verified" => {
                Err(Error::EtherscanContractSourceCodeNotVerified(response.url))
            }

            _ if reason.starts_with("Max rate limit reached") => Ok(ResponseHandlerResult::RetryRateLimited),

            _ => Err(Error::EtherscanResponse(response.url, reason)),
        }
    }
}
