use std::time::{Duration, Instant};

use crate::chart::{ChartConfig, parse_chart};
use crate::pending::completeness::looks_incomplete;

pub const DEFAULT_STABLE_FOR: Duration = Duration::from_millis(400);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_RAPID_WINDOW: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOptions {
    /// How long unchanged text must sit before an incomplete-looking block is judged final.
    pub stable_for: Duration,
    /// Hard ceiling on how long a block may look incomplete.
    pub max_wait: Duration,
    /// Changes closer together than this count as rapid streaming.
    pub rapid_window: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            stable_for: DEFAULT_STABLE_FOR,
            max_wait: DEFAULT_MAX_WAIT,
            rapid_window: DEFAULT_RAPID_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDecision {
    /// Treat the block as final; report errors.
    Complete,
    /// Looks incomplete; hold errors back.
    Waiting,
    /// Looks incomplete and is actively changing.
    RapidUpdate,
}

/// Caller-owned timing state for one block being streamed.
///
/// Time is passed in rather than read, so callers (and tests) control the clock. Call
/// [`StreamingGate::reset`] when the gate starts observing a different block.
#[derive(Debug, Clone, Default)]
pub struct StreamingGate {
    options: GateOptions,
    last_text: Option<String>,
    first_seen: Option<Instant>,
    last_change: Option<Instant>,
    previous_change: Option<Instant>,
}

impl StreamingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GateOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> GateOptions {
        self.options
    }

    pub fn reset(&mut self) {
        *self = Self::with_options(self.options);
    }

    pub fn observe(&mut self, text: &str, now: Instant) -> StreamDecision {
        let first_seen = *self.first_seen.get_or_insert(now);
        let changed = self.last_text.as_deref() != Some(text);
        if changed {
            self.previous_change = self.last_change;
            self.last_change = Some(now);
            self.last_text = Some(text.to_string());
        }

        if !looks_incomplete(text) {
            return StreamDecision::Complete;
        }
        let last_change = self.last_change.unwrap_or(now);
        if now.saturating_duration_since(last_change) >= self.options.stable_for
            || now.saturating_duration_since(first_seen) >= self.options.max_wait
        {
            return StreamDecision::Complete;
        }

        let rapid = changed
            && self
                .previous_change
                .is_some_and(|prev| now.saturating_duration_since(prev) <= self.options.rapid_window);
        if rapid {
            StreamDecision::RapidUpdate
        } else {
            StreamDecision::Waiting
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(ChartConfig),
    /// Not renderable yet, but probably still arriving.
    Pending,
    Failed { reason: String },
}

/// Parses and validates a chart block, holding failures back while the gate says the block is
/// still streaming.
pub fn evaluate_chart(
    text: &str,
    tag: &str,
    gate: &mut StreamingGate,
    now: Instant,
) -> ChartOutcome {
    let decision = gate.observe(text, now);
    let parsed = parse_chart(text, tag).and_then(|config| {
        config.validate()?;
        Ok(config)
    });
    match (parsed, decision) {
        (Ok(config), _) => ChartOutcome::Ready(config),
        (Err(err), StreamDecision::Complete) => ChartOutcome::Failed {
            reason: err.to_string(),
        },
        (Err(_), StreamDecision::Waiting | StreamDecision::RapidUpdate) => ChartOutcome::Pending,
    }
}
