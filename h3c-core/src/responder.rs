//! Identity and challenge responses in the H3C wire convention.

use crate::config::SessionConfig;
use crate::engine::{BufferError, EapHandler, ResponseBuffer, Verdict};
use crate::status::{StatusCode, StatusReporter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Client version blob prefixed to every identity response.
pub const VERSION_INFO: [u8; 32] = [
    0x06, 0x07, b'b', b'j', b'Q', b'7', b'S', b'E', b'8', b'B', b'Z', b'3', b'M', b'q', b'H', b'h',
    b's', b'3', b'c', b'l', b'M', b'r', b'e', b'g', b'c', b'D', b'Y', b'3', b'Y', b'=', 0x20, 0x20,
];

/// Length of an MD5 digest, written as the value-size byte of the response.
pub const DIGEST_LEN: u8 = 16;

/// Salt carried by a challenge request: one length byte, then the salt.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Salt<'a>(&'a [u8]);

impl<'a> Salt<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        let Some((&declared, rest)) = data.split_first() else {
            return Salt(&[]);
        };
        let declared = declared as usize;
        if declared > rest.len() {
            warn!(
                "Challenge declares {} salt bytes but only {} are present",
                declared,
                rest.len()
            );
            return Salt(rest);
        }
        Salt(&rest[..declared])
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }
}

/// MD5 over `id ++ password ++ salt`, the order the authenticator expects.
pub fn challenge_digest(id: u8, password: &[u8], salt: &[u8]) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume([id]);
    ctx.consume(password);
    ctx.consume(salt);
    ctx.finalize().0
}

/// Answers engine callbacks for one session.
#[derive(Debug)]
pub struct ChallengeResponder {
    config: Arc<SessionConfig>,
    reporter: StatusReporter,
}

impl ChallengeResponder {
    pub fn new(config: Arc<SessionConfig>, reporter: StatusReporter) -> Self {
        ChallengeResponder { config, reporter }
    }

    fn write_identity(&self, out: &mut ResponseBuffer) -> Result<usize, BufferError> {
        out.clear();
        out.put(&VERSION_INFO)?;
        out.put(self.config.username.as_bytes())?;
        Ok(out.len())
    }

    fn write_challenge_response(
        &self,
        id: u8,
        challenge: &[u8],
        out: &mut ResponseBuffer,
    ) -> Result<usize, BufferError> {
        let salt = Salt::parse(challenge);
        let digest = challenge_digest(id, self.config.password.as_bytes(), salt.as_bytes());
        debug!("Challenge id {} with {} salt bytes", id, salt.as_bytes().len());

        out.clear();
        out.put_u8(DIGEST_LEN)?;
        out.put(&digest)?;
        out.put(self.config.username.as_bytes())?;
        Ok(out.len())
    }
}

impl EapHandler for ChallengeResponder {
    fn on_identity_request(&mut self, out: &mut ResponseBuffer) -> Result<usize, BufferError> {
        self.reporter.report(StatusCode::IdentityRequest);
        self.write_identity(out)
    }

    fn on_md5_challenge(
        &mut self,
        id: u8,
        challenge: &[u8],
        out: &mut ResponseBuffer,
    ) -> Result<usize, BufferError> {
        self.reporter.report(StatusCode::Md5Challenge);
        self.write_challenge_response(id, challenge, out)
    }

    // Same transcript as EAP-MD5 until a deployment shows otherwise.
    fn on_vendor_challenge(
        &mut self,
        id: u8,
        challenge: &[u8],
        out: &mut ResponseBuffer,
    ) -> Result<usize, BufferError> {
        self.reporter.report(StatusCode::VendorChallenge);
        self.write_challenge_response(id, challenge, out)
    }

    fn on_response_sent(&mut self) {
        self.reporter.report(StatusCode::ResponseSent);
    }

    fn on_success(&mut self) -> Verdict {
        self.reporter.report(StatusCode::EapSuccess);
        Verdict::Continue
    }

    fn on_failure(&mut self) -> Verdict {
        self.reporter.report(StatusCode::EapFailure);
        Verdict::Terminate
    }

    fn on_unknown(&mut self) -> Verdict {
        self.reporter.report(StatusCode::UnknownRequest);
        Verdict::Continue
    }
}
