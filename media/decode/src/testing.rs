/*!
    Test doubles for decode streams.

    Available behind the `test-util` feature or in `#[cfg(test)]` within this crate.
*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use media_types::{DecodedFrame, Packet, PixelFormat, Result};

use crate::backend::{DecoderBackend, ReceiveOutcome, SendOutcome};

/// Size of the frames produced by [`ScriptedDecoder`].
pub const FRAME_SIZE: u32 = 2;

/**
    Initialise a tracing subscriber for tests.

    Respects `RUST_LOG`, defaults to `trace`. Subsequent calls are no-ops.
*/
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trace".into()),
        )
        .with_test_writer()
        .try_init();
}

/**
    Everything a [`ScriptedDecoder`] was asked to do.
*/
#[derive(Debug, Default)]
pub struct DecoderLog {
    /// Payload of every packet submission attempt, in order.
    pub submitted: Vec<Vec<u8>>,
    /// Payload of every packet the decoder accepted, in order.
    pub accepted: Vec<Vec<u8>>,
    pub flushes: usize,
    pub closes: usize,
    /// `"flush"` and `"close"` in call order.
    pub events: Vec<&'static str>,
}

/**
    Decoder double that behaves like a codec with a fixed reorder delay,
    with optional scripted responses.

    Without a script it accepts packets while fewer than `delay` are
    buffered and produces a frame (from the oldest buffered packet) once
    `delay` packets are buffered. Scripted responses are consumed first, one
    per call. Produced frames are `FRAME_SIZE` square `Gray8` images filled
    with the first payload byte of their packet, carrying its pts.
*/
#[derive(Debug)]
pub struct ScriptedDecoder {
    delay: usize,
    sends: VecDeque<Result<SendOutcome>>,
    receives: VecDeque<Result<ReceiveOutcome>>,
    pending: VecDeque<Packet>,
    log: Rc<RefCell<DecoderLog>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::with_delay(1)
    }

    /**
        A decoder that buffers `delay` packets before producing a frame.
    */
    pub fn with_delay(delay: usize) -> Self {
        Self {
            delay: delay.max(1),
            sends: VecDeque::new(),
            receives: VecDeque::new(),
            pending: VecDeque::new(),
            log: Rc::default(),
        }
    }

    /**
        Queue a response for a future `send_packet` call.
    */
    pub fn script_send(mut self, outcome: Result<SendOutcome>) -> Self {
        self.sends.push_back(outcome);
        self
    }

    /**
        Queue a response for a future `receive_frame` call.
    */
    pub fn script_receive(mut self, outcome: Result<ReceiveOutcome>) -> Self {
        self.receives.push_back(outcome);
        self
    }

    pub fn log(&self) -> Rc<RefCell<DecoderLog>> {
        Rc::clone(&self.log)
    }

    fn accept(&mut self, packet: &Packet) {
        self.log.borrow_mut().accepted.push(packet.data.clone());
        self.pending.push_back(packet.clone());
    }

    fn produce(&mut self, frame: &mut DecodedFrame) {
        let packet = self.pending.pop_front();
        let fill = packet
            .as_ref()
            .and_then(|p| p.data.first().copied())
            .unwrap_or(0);
        frame.reset_layout(FRAME_SIZE, FRAME_SIZE, PixelFormat::Gray8);
        frame.planes[0].data.fill(fill);
        frame.pts = packet.and_then(|p| p.pts);
    }
}

impl Default for ScriptedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderBackend for ScriptedDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<SendOutcome> {
        self.log.borrow_mut().submitted.push(packet.data.clone());

        let outcome = match self.sends.pop_front() {
            Some(scripted) => scripted?,
            None if self.pending.len() < self.delay => SendOutcome::Accepted,
            None => SendOutcome::WouldBlock,
        };
        if outcome == SendOutcome::Accepted {
            self.accept(packet);
        }
        Ok(outcome)
    }

    fn receive_frame(&mut self, frame: &mut DecodedFrame) -> Result<ReceiveOutcome> {
        let outcome = match self.receives.pop_front() {
            Some(scripted) => scripted?,
            None if self.pending.len() >= self.delay => ReceiveOutcome::Produced,
            None => ReceiveOutcome::WouldBlock,
        };
        if outcome == ReceiveOutcome::Produced {
            self.produce(frame);
        }
        Ok(outcome)
    }

    fn flush(&mut self) {
        self.pending.clear();
        let mut log = self.log.borrow_mut();
        log.flushes += 1;
        log.events.push("flush");
    }

    fn close(&mut self) {
        let mut log = self.log.borrow_mut();
        log.closes += 1;
        log.events.push("close");
    }
}

/**
    Returns the fill byte of a frame produced by [`ScriptedDecoder`].
*/
pub fn payload_of(frame: &DecodedFrame) -> u8 {
    frame
        .planes
        .first()
        .and_then(|p| p.data.first().copied())
        .unwrap_or(0)
}
