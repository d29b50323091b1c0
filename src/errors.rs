use thiserror::Error;

/// Status codes surfaced by the fan plugin.
///
/// `Invalid` covers malformed identifiers, unknown fan indices, and hardware
/// reads that prevent a trustworthy presence determination. `Unsupported`
/// marks operations this chassis does not implement. Bus-level failures are
/// folded into `Invalid` before they leave the plugin; `Bus` and `Io` only
/// travel between the BMC client and the readers.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("invalid oid or unknown fan index")]
    Invalid,

    #[error("operation not supported on this platform")]
    Unsupported,

    #[error("bmc error: {0}")]
    Bus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
