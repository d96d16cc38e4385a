//! Oracle contract: the external bias-detection service
//!
//! Request `{ text, version }` → response `{ version, spans }` or an error.
//! Transport (HTTP, WebSocket, extension messaging) lives on the far side of
//! this trait.

use serde::{Deserialize, Serialize};

use crate::highlight::error::OracleError;
use crate::highlight::span::RawSpan;

/// One analysis request, stamped with the buffer version it was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    pub version: u64,
}

/// Oracle response in offset form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub version: u64,
    #[serde(default)]
    pub spans: Vec<RawSpan>,
}

impl RawAnalysis {
    pub fn new(version: u64, spans: Vec<RawSpan>) -> Self {
        Self { version, spans }
    }

    pub fn clean(version: u64) -> Self {
        Self {
            version,
            spans: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        serde_json::from_str(json).map_err(|e| OracleError::Malformed(e.to_string()))
    }
}

/// An asynchronous bias detector.
///
/// Implementations must echo `request.version` in the response.
#[allow(async_fn_in_trait)]
pub trait Oracle {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis, OracleError>;
}

impl<O: Oracle> Oracle for &O {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis, OracleError> {
        (**self).analyze(request).await
    }
}
