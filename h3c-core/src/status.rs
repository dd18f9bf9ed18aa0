//! Protocol milestones and error conditions surfaced to the caller's sink.

use std::fmt;
use std::sync::Arc;

/// Every event the session reports while it runs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum StatusCode {
    NoError,
    EapFailure,
    EapSuccess,
    IdentityRequest,
    Md5Challenge,
    VendorChallenge,
    ResponseSent,
    AuthStart,
    UnknownRequest,
    InvalidParameters,
    EngineInitError,
    EngineStartError,
    ResponseError,
}

impl StatusCode {
    pub const ALL: [StatusCode; 13] = [
        StatusCode::NoError,
        StatusCode::EapFailure,
        StatusCode::EapSuccess,
        StatusCode::IdentityRequest,
        StatusCode::Md5Challenge,
        StatusCode::VendorChallenge,
        StatusCode::ResponseSent,
        StatusCode::AuthStart,
        StatusCode::UnknownRequest,
        StatusCode::InvalidParameters,
        StatusCode::EngineInitError,
        StatusCode::EngineStartError,
        StatusCode::ResponseError,
    ];

    pub fn message(self) -> &'static str {
        match self {
            StatusCode::NoError => "No error",
            StatusCode::EapFailure => "EAP Failure",
            StatusCode::EapSuccess => "EAP Success",
            StatusCode::IdentityRequest => "Got EAP Request - Identity",
            StatusCode::Md5Challenge => "Got EAP Request - MD5 Challenge",
            StatusCode::VendorChallenge => "Got EAP Request - H3C Challenge",
            StatusCode::ResponseSent => "EAP Response",
            StatusCode::AuthStart => "EAP Auth Start",
            StatusCode::UnknownRequest => "EAP Unknown",
            StatusCode::InvalidParameters => "Invalid parameters",
            StatusCode::EngineInitError => "Fail to initialize EAPoL",
            StatusCode::EngineStartError => "Failed to send EAPoL authentication",
            StatusCode::ResponseError => "Failed to response EAPoL authentication",
        }
    }

    /// Configuration and engine lifecycle faults, as opposed to protocol milestones.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            StatusCode::InvalidParameters
                | StatusCode::EngineInitError
                | StatusCode::EngineStartError
                | StatusCode::ResponseError
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Caller-supplied output for status codes. Must not fail or block.
pub type StatusSink = Arc<dyn Fn(StatusCode) + Send + Sync>;

/// Forwards each status code to the sink, once, in the order reported.
#[derive(Clone)]
pub struct StatusReporter {
    sink: StatusSink,
}

impl StatusReporter {
    pub fn new(sink: StatusSink) -> Self {
        StatusReporter { sink }
    }

    pub fn report(&self, code: StatusCode) {
        (self.sink)(code);
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter").finish_non_exhaustive()
    }
}
