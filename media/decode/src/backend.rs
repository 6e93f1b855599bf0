/*!
    Decoder backend capability.
*/

use media_types::{DecodedFrame, Packet, Result};

/**
    Outcome of submitting a packet to a decoder.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The decoder took the packet.
    Accepted,
    /// Output must be drained before the decoder takes more input.
    WouldBlock,
}

/**
    Outcome of asking a decoder for a frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// A frame was written into the caller's frame.
    Produced,
    /// The decoder needs more input before it can produce a frame.
    WouldBlock,
}

/**
    A stateful decoder with a two-phase send/receive protocol.

    Backends report genuine failures as [`Error::Decode`] and use the
    `WouldBlock` outcomes for flow control only.

    [`Error::Decode`]: media_types::Error::Decode
*/
pub trait DecoderBackend {
    /// Submit a packet. The backend copies what it needs from it.
    fn send_packet(&mut self, packet: &Packet) -> Result<SendOutcome>;

    /// Try to write one decoded frame into `frame`, overwriting it.
    fn receive_frame(&mut self, frame: &mut DecodedFrame) -> Result<ReceiveOutcome>;

    /// Discard all internally buffered packets and frames.
    fn flush(&mut self);

    /// Release the decoder. Called at most once.
    fn close(&mut self);
}

impl<D: DecoderBackend + ?Sized> DecoderBackend for Box<D> {
    fn send_packet(&mut self, packet: &Packet) -> Result<SendOutcome> {
        (**self).send_packet(packet)
    }

    fn receive_frame(&mut self, frame: &mut DecodedFrame) -> Result<ReceiveOutcome> {
        (**self).receive_frame(frame)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
