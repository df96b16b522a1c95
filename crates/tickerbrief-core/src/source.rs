use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical identifiers for every upstream market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    YahooNews,
    Alphavantage,
    GoogleNews,
    Duckduckgo,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::YahooNews => "yahoo_news",
            Self::Alphavantage => "alphavantage",
            Self::GoogleNews => "google_news",
            Self::Duckduckgo => "duckduckgo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for provider in [ProviderId::YahooNews, ProviderId::GoogleNews, ProviderId::Duckduckgo] {
            let serialized = serde_json::to_string(&provider).expect("serializes");
            assert_eq!(serialized, format!("\"{provider}\""));
        }
    }
}
