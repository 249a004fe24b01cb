//! Operation identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical operation exposed by the service, one HTTP path each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Transcribe,
    Vision,
    Strategy,
    ScriptGenerator,
    CaptionPack,
    RenderCaptions,
    MicroClips,
    PlatformCaptions,
}

/// Returned when a name does not match any operation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl Operation {
    /// Every operation, in routing order.
    pub const ALL: [Operation; 8] = [
        Operation::Transcribe,
        Operation::Vision,
        Operation::Strategy,
        Operation::ScriptGenerator,
        Operation::CaptionPack,
        Operation::RenderCaptions,
        Operation::MicroClips,
        Operation::PlatformCaptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Transcribe => "transcribe",
            Operation::Vision => "vision",
            Operation::Strategy => "strategy",
            Operation::ScriptGenerator => "script-generator",
            Operation::CaptionPack => "caption-pack",
            Operation::RenderCaptions => "render-captions",
            Operation::MicroClips => "micro-clips",
            Operation::PlatformCaptions => "platform-captions",
        }
    }

    /// HTTP path the operation is served on.
    pub fn path(&self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_start_matches('/');
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
