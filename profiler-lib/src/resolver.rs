//! Resolves [`ContractInfo`] for a contract address, scraping its Etherscan page only if the cache does
//! not already hold an entry for it.

use crate::api::etherscan::EtherscanClient;
use crate::cache::ContractCache;
use crate::error::Error;
use crate::model::ContractInfo;
use crate::scraper;
use log::debug;
use log::info;

pub struct ContractResolver<'a> {
    client: &'a EtherscanClient,
    cache: Box<dyn ContractCache>,
}

impl<'a> ContractResolver<'a> {
    pub fn new(client: &'a EtherscanClient, cache: Box<dyn ContractCache>) -> Self {
        ContractResolver { client, cache }
    }

    pub fn get_contract_info(&self, address: &str) -> Result<ContractInfo, Error> {
        if self.cache.exists(address)? {
            debug!("Cache hit for {address}");
            return self.cache.get(address);
        }

        info!("Scraping contract page of {address}");
        let page = self.client.get_contract_page(address)?;
        let contract = scraper::from_contract_page(&page)?;

        self.cache.put(address, &contract)?;
        Ok(contract)
    }
}
