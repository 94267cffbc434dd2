use thiserror::Error;

/// Startup configuration problems. These are the only fatal errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing mandatory setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// One price provider failed for one symbol. The chain falls through to the next provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} has no identifier for {symbol}")]
    Unresolved { provider: &'static str, symbol: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} response did not match the expected shape: {message}")]
    Parse { provider: &'static str, message: String },

    #[error("{provider} returned unusable price {price}")]
    InvalidPrice { provider: &'static str, price: f64 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("could not decode alert row: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notifier http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notifier rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notifier timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// Anything that stops the worker before the monitor loop starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("could not build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("could not open alert store: {0}")]
    Store(#[from] StoreError),
}
