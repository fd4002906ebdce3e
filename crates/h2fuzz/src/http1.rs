//! HTTP/1.x request fuzzing and the h2c upgrade request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::FuzzError;
use crate::frame::{FrameBuilder, SettingsFrame};
use crate::mutator::{AsciiStringMutator, MutationParams, Mutator};

/// Request mutated when no template is supplied.
pub const DEFAULT_REQUEST: &str = "GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n";

/// Mutates an HTTP/1.x request template, keeping line breaks intact so the
/// request stays line-structured.
#[derive(Debug, Clone)]
pub struct Http1RequestFuzzer {
    mutator: AsciiStringMutator,
}

impl Http1RequestFuzzer {
    pub fn new(request: &str, params: &MutationParams) -> Result<Self, FuzzError> {
        Ok(Self {
            mutator: AsciiStringMutator::new(request, params)?.with_ignored_symbols(&['\r', '\n']),
        })
    }

    pub fn with_default_request(params: &MutationParams) -> Result<Self, FuzzError> {
        Self::new(DEFAULT_REQUEST, params)
    }

    pub fn original(&self) -> &[u8] {
        self.mutator.original()
    }

    pub fn next(&mut self) -> Result<Vec<u8>, FuzzError> {
        self.mutator.next()
    }

    pub fn reset(&mut self) {
        self.mutator.reset();
    }

    pub fn set_test(&mut self, test: u64) {
        self.mutator.set_test(test);
    }

    pub fn test(&self) -> u64 {
        self.mutator.test()
    }
}

/// HTTP/1.1 request asking the server to switch to cleartext HTTP/2.
#[derive(Debug, Clone)]
pub struct Http1Upgrade {
    host:     String,
    path:     String,
    settings: SettingsFrame,
}

impl Http1Upgrade {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host:     host.into(),
            path:     "/".to_string(),
            settings: SettingsFrame::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_settings(mut self, settings: SettingsFrame) -> Self {
        self.settings = settings;
        self
    }

    /// The `HTTP2-Settings` value: base64url of the SETTINGS payload,
    /// unpadded.
    pub fn settings_header(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.settings.payload())
    }

    pub fn encode(&self) -> Vec<u8> {
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: Upgrade, HTTP2-Settings\r\nUpgrade: \
             h2c\r\nHTTP2-Settings: {}\r\n\r\n",
            self.path,
            self.host,
            self.settings_header()
        )
        .into_bytes()
    }
}
