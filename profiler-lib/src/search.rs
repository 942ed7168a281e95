//! Exponential block window search for an account's most recent transactions.
//!
//! Etherscan only lists transactions by block range, so to collect the `limit` most recent transactions
//! of an account we start with a single block just below the chain head and quadruple the window (keeping
//! its upper bound fixed) until enough transactions are returned. Once the window reaches the genesis
//! block the account's whole history has been queried and whatever was found is returned.

use crate::config::DEFAULT_SEARCH_MAX_ITERATIONS;
use crate::error::Error;
use crate::model::Transaction;
use log::info;

/// Number of blocks kept between the chain head and the searched range, so that recently mined blocks
/// are already indexed by the explorer.
pub const SAFETY_OFFSET: u64 = 10;

/// Factor by which the block window grows after each under-count.
pub const GROWTH_FACTOR: u64 = 4;

/// Returns the transactions of an account within an inclusive block range.
pub trait TransactionSource {
    fn get_transactions(&self, address: &str, startblock: u64, endblock: u64) -> Result<Vec<Transaction>, Error>;
}

/// Returns the current chain height.
pub trait BlockHeightProvider {
    fn block_number(&self) -> Result<u64, Error>;
}

pub struct TransactionSearch<'a> {
    source: &'a dyn TransactionSource,
    heights: &'a dyn BlockHeightProvider,
    max_iterations: usize,
}

impl<'a> TransactionSearch<'a> {
    pub fn new(source: &'a dyn TransactionSource, heights: &'a dyn BlockHeightProvider) -> Self {
        TransactionSearch {
            source,
            heights,
            max_iterations: DEFAULT_SEARCH_MAX_ITERATIONS,
        }
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns the first `limit` transactions of the smallest block window ending [`SAFETY_OFFSET`] blocks
    /// below the chain head that contains at least `limit` transactions. Returns fewer if the account's
    /// whole history holds fewer.
    pub fn get_transactions_smart(&self, address: &str, limit: usize) -> Result<Vec<Transaction>, Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let endblock = self.heights.block_number()?.saturating_sub(SAFETY_OFFSET);
        let mut window: u64 = 1;
        let mut found = 0;

        for _ in 0..self.max_iterations {
            let startblock = endblock.saturating_add(1).saturating_sub(window);
            info!("Block window size: {window} ({startblock}..={endblock})");

            let mut transactions = self.source.get_transactions(address, startblock, endblock)?;
            info!("Transactions: {}", transactions.len());

            if transactions.len() >= limit {
                transactions.truncate(limit);
                return Ok(transactions);
            }

            if startblock == 0 {
                return Ok(transactions);
            }

            found = transactions.len();
            window = window.saturating_mul(GROWTH_FACTOR);
        }

        Err(Error::TransactionSearchExhausted {
            address: address.to_string(),
            limit,
            found,
            iterations: self.max_iterations,
        })
    }
}
