//! Structs returned by the Etherscan client and persisted by the contract cache.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Transaction as listed by the Etherscan `txlist` action, kept verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Transaction(pub Value);

#[cfg(test)]
impl Transaction {
    /// Returns the transaction hash, if the explorer included one.
    pub fn hash(&self) -> Option<&str> {
        self.0.get("hash").and_then(Value::as_str)
    }

    /// Returns the block the transaction was mined in, if present and numeric.
    pub fn block_number(&self) -> Option<u64> {
        self.0.get("blockNumber").and_then(Value::as_str).and_then(|val| val.parse().ok())
    }
}

/// Metadata of a verified contract scraped from its Etherscan page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub name: String,
    pub solc_version: String,
    pub optimized: bool,
    pub optimized_rounds: u32,

    /// Source code with HTML entities already decoded.
    pub sourcecode: String,

    #[serde(with = "hex_bytes")]
    pub bytecode: Vec<u8>,
}

/// (De)serializes bytes as a `0x` prefixed hex string.
mod hex_bytes {
    use serde::de::Error;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let content = String::deserialize(deserializer)?;
        let content = content.strip_prefix("0x").unwrap_or(&content);

        hex::decode(content).map_err(D::Error::custom)
    }
}
