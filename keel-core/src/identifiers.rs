use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CURRENCY_CODE_LEN: usize = 3;
const CURRENCY_PAIR_LEN: usize = CURRENCY_CODE_LEN * 2;

/// A forex pair such as `EURUSD`, split into its base and quote currency codes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    /// Split a six character pair symbol into `(base, quote)` currency codes.
    pub fn decompose(symbol: &str) -> Result<(String, String), IdentifierParseError> {
        if symbol.chars().count() != CURRENCY_PAIR_LEN || !symbol.is_ascii() {
            return Err(IdentifierParseError {
                msg: format!(
                    "Currency pairs must be exactly {CURRENCY_PAIR_LEN} characters: '{symbol}'"
                ),
            });
        }
        let (base, quote) = symbol.split_at(CURRENCY_CODE_LEN);
        Ok((base.to_string(), quote.to_string()))
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = IdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = Self::decompose(s)?;
        Ok(Self { base, quote })
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierParseError {
    msg: String,
}

impl fmt::Display for IdentifierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for IdentifierParseError {}
