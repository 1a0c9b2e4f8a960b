pub type GaugeResult<T> = Result<T, GaugeError>;

#[derive(thiserror::Error, Debug)]
pub enum GaugeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// No sample in the source survived timestamp normalization.
    #[error("telemetry series has no usable samples")]
    EmptySeries,

    /// The requested time window selects zero samples.
    #[error("no telemetry samples inside the requested time window")]
    NoDataInRange,

    #[error("invalid time window: {0}")]
    InvalidWindow(String),

    #[error("missing asset: {0}")]
    MissingAsset(String),

    #[error("failed to open video sink: {0}")]
    SinkOpen(String),

    #[error("failed to write to video sink: {0}")]
    SinkWrite(String),

    #[error("generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GaugeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn invalid_window(msg: impl Into<String>) -> Self {
        Self::InvalidWindow(msg.into())
    }

    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }

    pub fn sink_open(msg: impl Into<String>) -> Self {
        Self::SinkOpen(msg.into())
    }

    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWrite(msg.into())
    }
}
