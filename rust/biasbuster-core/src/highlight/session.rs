//! Session: an annotator paired with an oracle
//!
//! The async wrapper around [`Annotator`]. `tick` is meant to be called from
//! the host's timer callback and `analyze_now` from an explicit "Analyze"
//! action. The oracle call is the only await point.

use instant::Instant;

use crate::highlight::annotator::{Annotator, Outcome};
use crate::highlight::config::AnnotatorConfig;
use crate::highlight::oracle::{AnalysisRequest, Oracle};

pub struct Session<O> {
    annotator: Annotator,
    oracle: O,
}

impl<O: Oracle> Session<O> {
    pub fn new(oracle: O, config: AnnotatorConfig) -> Self {
        Self {
            annotator: Annotator::new(config),
            oracle,
        }
    }

    pub fn with_text(oracle: O, config: AnnotatorConfig, text: impl Into<String>) -> Self {
        Self {
            annotator: Annotator::with_text(config, text),
            oracle,
        }
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn edit(&mut self, text: impl Into<String>, now: Instant) -> bool {
        self.annotator.mutate(text, now)
    }

    /// Run one analysis cycle if the debounce window has elapsed.
    pub async fn tick(&mut self, now: Instant) -> Option<Outcome> {
        let request = self.annotator.poll(now)?;
        Some(self.run(request).await)
    }

    /// Analyze the current text immediately.
    pub async fn analyze_now(&mut self) -> Option<Outcome> {
        let request = self.annotator.flush()?;
        Some(self.run(request).await)
    }

    async fn run(&mut self, request: AnalysisRequest) -> Outcome {
        let result = self.oracle.analyze(&request).await;
        self.annotator.complete(request.version, result)
    }

    pub fn dispose(&mut self) {
        self.annotator.dispose();
    }

    pub fn into_parts(self) -> (Annotator, O) {
        (self.annotator, self.oracle)
    }
}
