use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Symbol of a tradable asset such as `ETH` or `USDT`.
/// Assets have no structure beyond their symbol; two assets are the same iff the symbols match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// The symbol as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        Self(symbol.to_string())
    }
}

impl From<String> for AssetId {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
