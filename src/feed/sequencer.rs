/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page after a category or range change.
    Reset,
    /// Next offset window of the current filter ("load more").
    Continuation,
}

/// Identity of an issued fetch, carried to its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
}

/// Generation counter deciding which fetch results may be applied.
///
/// A reset bumps the generation, which silently invalidates every fetch still
/// in flight. A continuation reuses the current generation and is refused
/// while any fetch of that generation is outstanding. Nothing is physically
/// cancelled: stale requests run to completion and their results are dropped
/// by [`FetchSequencer::finish`].
#[derive(Debug, Default)]
pub struct FetchSequencer {
    generation: u64,
    in_flight: Option<FetchKind>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Kind of the fetch outstanding for the current generation, if any.
    pub fn in_flight(&self) -> Option<FetchKind> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a new generation without issuing a fetch.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = None;
        tracing::debug!(generation = self.generation, "Feed generation advanced");
        self.generation
    }

    /// Start a new generation and issue its first fetch.
    pub fn begin_reset(&mut self) -> FetchTicket {
        let generation = self.invalidate();
        self.in_flight = Some(FetchKind::Reset);
        FetchTicket {
            generation,
            kind: FetchKind::Reset,
        }
    }

    /// Issue a continuation under the current generation.
    ///
    /// Returns `None` while another fetch of this generation is in flight.
    pub fn begin_continuation(&mut self) -> Option<FetchTicket> {
        if self.is_busy() {
            return None;
        }
        self.in_flight = Some(FetchKind::Continuation);
        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::Continuation,
        })
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Record a completion. Returns `true` if the result may be applied.
    pub fn finish(&mut self, ticket: FetchTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                expected = self.generation,
                got = ticket.generation,
                kind = ?ticket.kind,
                "Ignoring stale fetch result (generation mismatch)"
            );
            return false;
        }
        self.in_flight = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_bumps_generation() {
        let mut seq = FetchSequencer::new();
        let first = seq.begin_reset();
        let second = seq.begin_reset();
        assert!(second.generation > first.generation);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_continuation_keeps_generation() {
        let mut seq = FetchSequencer::new();
        let reset = seq.begin_reset();
        assert!(seq.finish(reset));

        let more = seq.begin_continuation().unwrap();
        assert_eq!(more.generation, reset.generation);
        assert_eq!(more.kind, FetchKind::Continuation);
    }

    #[test]
    fn test_continuation_refused_while_busy() {
        let mut seq = FetchSequencer::new();
        let reset = seq.begin_reset();
        assert!(seq.begin_continuation().is_none());

        assert!(seq.finish(reset));
        let more = seq.begin_continuation().unwrap();
        assert!(seq.begin_continuation().is_none());
        assert!(seq.finish(more));
        assert!(!seq.is_busy());
    }

    #[test]
    fn test_stale_finish_leaves_current_fetch_outstanding() {
        let mut seq = FetchSequencer::new();
        let old = seq.begin_reset();
        let new = seq.begin_reset();

        assert!(!seq.finish(old));
        assert_eq!(seq.in_flight(), Some(FetchKind::Reset));
        assert!(seq.finish(new));
        assert_eq!(seq.in_flight(), None);
    }

    #[test]
    fn test_invalidate_clears_in_flight() {
        let mut seq = FetchSequencer::new();
        let reset = seq.begin_reset();
        let g = seq.invalidate();
        assert!(g > reset.generation);
        assert!(!seq.is_busy());
        assert!(!seq.finish(reset));
    }
}
