/// Errors from the ZapMeow channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The webhook listener could not bind its address (usually the port is taken).
    #[error("failed to bind webhook listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request to the gateway failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway rejected request ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
