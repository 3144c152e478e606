//! Trigger detection over priority-ordered pulse sources.

use contracts::PulseSource;

/// A new pulse arrived on the source at `source` (index in priority order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseDetected {
    pub source: usize,
}

/// Polls the highest-priority connected pulse source once per tick.
///
/// Sources are mutually exclusive: lower-priority sources are not polled
/// while a higher-priority one is connected.
pub struct TriggerDetector {
    sources: Vec<Box<dyn PulseSource>>,
}

impl TriggerDetector {
    /// `sources` in priority order, highest first.
    pub fn new(sources: Vec<Box<dyn PulseSource>>) -> Self {
        Self { sources }
    }

    /// Index of the source that would be polled this tick.
    pub fn active_source(&self) -> Option<usize> {
        self.sources.iter().position(|source| source.is_connected())
    }

    pub fn source_name(&self, index: usize) -> &str {
        self.sources
            .get(index)
            .map(|source| source.name())
            .unwrap_or("unknown")
    }

    /// Detect at most one pulse this tick, consuming the triggering message.
    pub fn detect(&mut self) -> Option<PulseDetected> {
        let index = self.active_source()?;
        let source = &mut self.sources[index];
        source
            .take_pulse()
            .then_some(PulseDetected { source: index })
    }

    pub fn into_sources(self) -> Vec<Box<dyn PulseSource>> {
        self.sources
    }
}

impl std::fmt::Debug for TriggerDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("TriggerDetector")
            .field("sources", &names)
            .finish()
    }
}
