/// Suspends bus-mastering peripherals (e.g. DMA) for the duration of a programming operation.
pub trait BusArbiter {
    /// State captured by [`suspend`](Self::suspend) and handed back to [`resume`](Self::resume).
    type Saved;

    /// Stops competing bus masters and waits until they are idle.
    fn suspend(&mut self) -> Self::Saved;
    /// Restores the state captured by the matching `suspend`.
    fn resume(&mut self, saved: Self::Saved);
}

/// No-op arbiter for systems without competing bus masters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBusArbiter;

impl BusArbiter for NoBusArbiter {
    type Saved = ();

    fn suspend(&mut self) {}
    fn resume(&mut self, _saved: ()) {}
}
