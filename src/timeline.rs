//! Flat event list keyed by absolute tick, converted to relative deltas
//!
//! Both encoders schedule through this: the MIDI writer in PPQ ticks, the WAV
//! renderer in sample frames.

/// An event at an absolute position on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent<P> {
    pub tick: u64,
    pub payload: P,
}

/// Events pushed in any order, read back sorted by tick
#[derive(Debug, Clone)]
pub struct Timeline<P> {
    events: Vec<TimedEvent<P>>,
}

impl<P> Default for Timeline<P> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<P> Timeline<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, tick: u64, payload: P) {
        self.events.push(TimedEvent { tick, payload });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stable sort by tick: events sharing a tick keep insertion order
    pub fn into_sorted(mut self) -> Vec<TimedEvent<P>> {
        self.events.sort_by_key(|e| e.tick);
        self.events
    }

    /// Sorted events as `(delta, payload)` pairs, the first delta measured from tick 0
    pub fn into_deltas(self) -> Vec<(u64, P)> {
        let mut previous = 0u64;
        self.into_sorted()
            .into_iter()
            .map(|e| {
                let delta = e.tick.saturating_sub(previous);
                previous = e.tick;
                (delta, e.payload)
            })
            .collect()
    }
}
