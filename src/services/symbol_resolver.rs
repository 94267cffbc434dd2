//! Maps a nominal pair symbol (e.g. `BTCUSDT`) to each provider's own identifier.
//!
//! Pure lookup, no I/O. A `None` result means that provider is skipped for the
//! symbol in the current cycle.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Binance,
    Coinbase,
    CoinCap,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Binance => "binance",
            ProviderKind::Coinbase => "coinbase",
            ProviderKind::CoinCap => "coincap",
        }
    }
}

/// Quote currencies recognised as a pair suffix, longest first.
const QUOTE_SUFFIXES: &[&str] = &["USDT", "USDC", "BUSD", "USD"];

#[derive(Debug, Clone, Copy)]
enum Source {
    /// Provider identifier derived from the pair by the provider's default rule.
    Derived,
    /// Fixed provider identifier.
    Id(&'static str),
    /// The provider does not list this asset.
    Unlisted,
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    base: &'static str,
    binance: Source,
    coinbase: Source,
    coincap: Source,
}

const fn listed(base: &'static str, coincap: &'static str) -> Mapping {
    Mapping {
        base,
        binance: Source::Derived,
        coinbase: Source::Derived,
        coincap: Source::Id(coincap),
    }
}

/// Assets with no price integration at all. Symbols on these bases are always
/// unavailable instead of being priced from a placeholder constant.
const fn no_data_source(base: &'static str) -> Mapping {
    Mapping {
        base,
        binance: Source::Unlisted,
        coinbase: Source::Unlisted,
        coincap: Source::Unlisted,
    }
}

/// Used for every base missing from `TABLE`: Binance takes the nominal pair,
/// Coinbase takes `<BASE>-USD`, CoinCap needs an asset slug so it is skipped.
const DEFAULT_MAPPING: Mapping = Mapping {
    base: "*",
    binance: Source::Derived,
    coinbase: Source::Derived,
    coincap: Source::Unlisted,
};

const TABLE: &[Mapping] = &[
    listed("BTC", "bitcoin"),
    listed("ETH", "ethereum"),
    listed("BNB", "binance-coin"),
    listed("SOL", "solana"),
    listed("XRP", "xrp"),
    listed("ADA", "cardano"),
    listed("DOGE", "dogecoin"),
    listed("DOT", "polkadot"),
    listed("LTC", "litecoin"),
    listed("LINK", "chainlink"),
    listed("AVAX", "avalanche"),
    listed("TRX", "tron"),
    listed("MATIC", "polygon"),
    listed("SHIB", "shiba-inu"),
    no_data_source("XAU"),
    no_data_source("XAG"),
];

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{2,20}$").expect("static symbol regex"))
}

/// Canonical form used for grouping: trimmed, uppercase, separators removed.
/// Returns `None` for anything that is not a plain alphanumeric pair.
pub fn normalize(symbol: &str) -> Option<String> {
    let sym: String = symbol
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect::<String>()
        .to_uppercase();

    symbol_re().is_match(&sym).then_some(sym)
}

/// Splits a normalized pair into `(base, quote)`. Pairs without a known quote
/// suffix are treated as a bare base asset quoted in USD.
pub fn split_pair(symbol: &str) -> (&str, &str) {
    for quote in QUOTE_SUFFIXES {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return (base, quote);
            }
        }
    }
    (symbol, "USD")
}

fn mapping_for(base: &str) -> &'static Mapping {
    TABLE
        .iter()
        .find(|m| m.base == base)
        .unwrap_or(&DEFAULT_MAPPING)
}

pub fn resolve(symbol: &str, provider: ProviderKind) -> Option<String> {
    let sym = normalize(symbol)?;
    let (base, quote) = split_pair(&sym);
    let mapping = mapping_for(base);

    let source = match provider {
        ProviderKind::Binance => mapping.binance,
        ProviderKind::Coinbase => mapping.coinbase,
        ProviderKind::CoinCap => mapping.coincap,
    };

    match source {
        Source::Unlisted => None,
        Source::Id(id) => Some(id.to_string()),
        Source::Derived => match provider {
            // Binance has no bare USD books for most assets; a bare base means USDT.
            ProviderKind::Binance if quote == "USD" && !sym.ends_with("USD") => {
                Some(format!("{base}USDT"))
            }
            ProviderKind::Binance => Some(sym.clone()),
            // Coinbase prices stablecoin pairs against USD.
            ProviderKind::Coinbase => Some(format!("{base}-USD")),
            ProviderKind::CoinCap => None,
        },
    }
}
