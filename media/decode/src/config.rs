/*!
    Decode stream configuration.
*/

use std::num::NonZeroUsize;

/**
    Configuration for a [`DecodeStream`](crate::DecodeStream).
*/
#[derive(Clone, Debug, Default)]
pub struct DecodeStreamConfig {
    /**
        Maximum send/receive iterations a single read may take.

        `None` (the default) retries for as long as the decoder keeps asking
        for more input and packets are available. A cap guards against a
        decoder that never accepts a packet. The first step of a read
        always runs, so an empty queue is reported as such.
    */
    pub max_iterations: Option<NonZeroUsize>,
}

impl DecodeStreamConfig {
    /**
        Create a new config with default settings (unbounded retry).
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Create a config that fails a read after `iterations` state transitions.

        A cap of zero is raised to one.
    */
    pub fn with_max_iterations(iterations: usize) -> Self {
        Self {
            max_iterations: Some(NonZeroUsize::new(iterations).unwrap_or(NonZeroUsize::MIN)),
        }
    }
}
