/*!
    Per-stream state shared between a container and its decode stream.
*/

use std::sync::atomic::{AtomicBool, Ordering};

/**
    End-of-file and flush flags for one stream.

    The container owns the end-of-file flag and sets it once demuxing has
    reached the end of the input. The decode stream only reads it, to tell
    a finished stream apart from a starved one.
*/
#[derive(Debug, Default)]
pub struct StreamState {
    end_of_file: AtomicBool,
    flushed: AtomicBool,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Returns true once the container has no more packets to deliver.
    */
    pub fn is_end_of_file(&self) -> bool {
        self.end_of_file.load(Ordering::Acquire)
    }

    /**
        Set by the container when demuxing reaches (or leaves, after a seek)
        the end of the input.
    */
    pub fn set_end_of_file(&self, value: bool) {
        self.end_of_file.store(value, Ordering::Release);
    }

    /**
        Returns true if codec buffers were flushed and no frame has been
        produced since.
    */
    pub fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::Acquire)
    }

    pub fn set_flushed(&self, value: bool) {
        self.flushed.store(value, Ordering::Release);
    }
}
