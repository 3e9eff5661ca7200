//! Startup arguments carried across a reboot handoff

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use handoff_api::STARTUP_ARGS_MARKER;
use thiserror::Error;

/// Errors decoding forwarded startup arguments
#[derive(Debug, Error)]
pub enum StartupArgsError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Decoded arguments are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The application's original launch arguments.
///
/// Handed to the orchestrator at construction so the reboot path can forward
/// them to the relaunched process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupContext {
    args: String,
}

impl StartupContext {
    pub fn new(args: impl Into<String>) -> Self {
        Self { args: args.into() }
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    /// Empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.args.trim().is_empty()
    }

    /// `BASE64:<b64>` form for `-executable_args`, `None` when blank
    pub fn encoded(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(encode_startup_args(&self.args))
        }
    }
}

/// Encode arguments as `BASE64:<b64 of UTF-8>`
pub fn encode_startup_args(args: &str) -> String {
    format!("{}{}", STARTUP_ARGS_MARKER, STANDARD.encode(args.as_bytes()))
}

/// Decode a `-executable_args` value; the `BASE64:` marker is optional
pub fn decode_startup_args(value: &str) -> Result<String, StartupArgsError> {
    let payload = value.strip_prefix(STARTUP_ARGS_MARKER).unwrap_or(value);
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(String::from_utf8(bytes)?)
}
