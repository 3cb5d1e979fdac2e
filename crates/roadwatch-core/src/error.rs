use thiserror::Error;

/// Failure kinds for resolving an image reference to raw bytes.
///
/// `Transport` covers network/filesystem errors below the HTTP status
/// level; everything else maps one-to-one onto a bad reference shape.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("object not found in store: {0}")]
    NotFound(String),
    #[error("failed to fetch image: HTTP {0}")]
    FetchFailed(u16),
    #[error("unsupported image reference: {0}")]
    UnsupportedReference(String),
    #[error("empty image data")]
    Empty,
    #[error("image fetch transport error: {0}")]
    Transport(String),
}

/// Failure kinds for the oracle call.
///
/// The first four mirror the layers of the response envelope and are
/// checked in that order before any text is extracted.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no response from oracle")]
    NoResponse,
    #[error("no candidates in oracle response")]
    NoCandidates,
    #[error("no content parts in oracle response")]
    NoContent,
    #[error("empty response text from oracle")]
    EmptyText,
    #[error("oracle returned HTTP {0}")]
    Http(u16),
    #[error("oracle transport error: {0}")]
    Transport(String),
}
