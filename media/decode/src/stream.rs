/*!
    Per-stream decode state machine.
*/

use std::sync::Arc;

use media_types::{DecodedFrame, Error, PacketQueue, Result, StreamState};
use tracing::{debug, trace, warn};

use crate::backend::{DecoderBackend, ReceiveOutcome, SendOutcome};
use crate::config::DecodeStreamConfig;

/**
    States of a single [`DecodeStream::read`] call.

    Failures leave the machine through an error return instead of a state.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadState {
    /// Submit the packet at the head of the queue.
    Send,
    /// Pull a decoded frame.
    Receive,
    /// A frame was produced.
    Done,
}

/**
    Feeds queued packets into a decoder and drains one frame per read.

    A demuxer pushes packets into the shared [`PacketQueue`] and sets the
    end-of-file flag on the shared [`StreamState`]. Each [`read`](Self::read)
    alternates between submitting the head packet and pulling a frame until
    the decoder produces one. Packets leave the queue only once the decoder
    has accepted them, so a packet the decoder pushes back on stays at the
    head and is retried.

    A stream must be the only consumer of its queue. Other holders of the
    queue may push, clear or close it at any time; the queue lock is not
    held while the decoder works on a packet.
*/
pub struct DecodeStream<D: DecoderBackend> {
    decoder: D,
    packets: Arc<PacketQueue>,
    state: Arc<StreamState>,
    config: DecodeStreamConfig,
    disposed: bool,
}

impl<D: DecoderBackend> DecodeStream<D> {
    pub fn new(
        decoder: D,
        packets: Arc<PacketQueue>,
        state: Arc<StreamState>,
        config: DecodeStreamConfig,
    ) -> Self {
        Self {
            decoder,
            packets,
            state,
            config,
            disposed: false,
        }
    }

    /**
        Decode the next frame into `frame`, overwriting its contents.

        # Errors

        - [`Error::Eof`] if the queue is empty and the container reached end of file
        - [`Error::Starved`] if the queue is empty but more packets may arrive;
          push packets and call again
        - [`Error::Decode`] if the decoder failed; the stream should not be read again
        - [`Error::Stalled`] if a configured iteration cap was hit
    */
    pub fn read(&mut self, frame: &mut DecodedFrame) -> Result<()> {
        self.ensure_open()?;

        let mut state = ReadState::Send;
        let mut iterations = 0usize;
        while state != ReadState::Done {
            if let Some(max) = self.config.max_iterations {
                if iterations >= max.get() {
                    warn!(iterations, "decoder made no progress, giving up");
                    return Err(Error::Stalled { iterations });
                }
            }
            iterations += 1;

            let next = match state {
                ReadState::Send => self.send()?,
                ReadState::Receive => self.receive(frame)?,
                ReadState::Done => ReadState::Done,
            };
            trace!(from = ?state, to = ?next, "decode state transition");
            state = next;
        }

        self.state.set_flushed(false);
        Ok(())
    }

    /**
        Discard everything buffered inside the decoder.

        Queued packets are left untouched. Call before seeking.
    */
    pub fn flush_buffers(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush();
        Ok(())
    }

    /**
        Flush the decoder and drop every queued packet.

        Returns the number of packets discarded.
    */
    pub fn reset(&mut self) -> Result<usize> {
        self.flush_buffers()?;
        let dropped = self.packets.clear();
        debug!(dropped, "decode stream reset");
        Ok(dropped)
    }

    pub fn packets(&self) -> &Arc<PacketQueue> {
        &self.packets
    }

    pub fn state(&self) -> &Arc<StreamState> {
        &self.state
    }

    pub fn config(&self) -> &DecodeStreamConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /**
        Flush and release the decoder. Calling this more than once is a no-op.
    */
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.flush();
        self.decoder.close();
        self.disposed = true;
        debug!(queued = self.packets.len(), "decode stream disposed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.disposed {
            Err(Error::Disposed {
                what: "decode stream",
            })
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) {
        self.decoder.flush();
        self.state.set_flushed(true);
    }

    fn send(&mut self) -> Result<ReadState> {
        let Some((head, packet)) = self.packets.peek() else {
            return Err(if self.state.is_end_of_file() {
                Error::Eof
            } else {
                Error::Starved
            });
        };

        match self.decoder.send_packet(&packet)? {
            SendOutcome::WouldBlock => Ok(ReadState::Receive),
            SendOutcome::Accepted => {
                // Accepted packets are owned by the decoder from here on.
                if self.packets.pop_if(head).is_none() {
                    warn!("packet queue changed while the decoder took its head");
                }
                trace!(remaining = self.packets.len(), "packet accepted");
                Ok(ReadState::Receive)
            }
        }
    }

    fn receive(&mut self, frame: &mut DecodedFrame) -> Result<ReadState> {
        match self.decoder.receive_frame(frame)? {
            ReceiveOutcome::Produced => Ok(ReadState::Done),
            ReceiveOutcome::WouldBlock => Ok(ReadState::Send),
        }
    }
}

impl<D: DecoderBackend> Drop for DecodeStream<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<D: DecoderBackend> std::fmt::Debug for DecodeStream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeStream")
            .field("packets", &self.packets)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedDecoder, init_test_tracing, payload_of};
    use media_types::Packet;

    fn stream(decoder: ScriptedDecoder) -> DecodeStream<ScriptedDecoder> {
        DecodeStream::new(
            decoder,
            Arc::new(PacketQueue::new()),
            Arc::new(StreamState::new()),
            DecodeStreamConfig::new(),
        )
    }

    fn push(stream: &DecodeStream<ScriptedDecoder>, tag: u8) {
        stream.packets().push(Packet::new(vec![tag]).with_pts(tag as i64));
    }

    fn queued_tags(stream: &DecodeStream<ScriptedDecoder>) -> Vec<u8> {
        let mut tags = Vec::new();
        while let Some(p) = stream.packets().pop() {
            tags.push(p.data[0]);
        }
        tags
    }

    #[test]
    fn one_packet_one_frame() {
        init_test_tracing();
        let mut s = stream(ScriptedDecoder::new());
        push(&s, 7);

        let mut frame = DecodedFrame::empty();
        s.read(&mut frame).unwrap();

        assert_eq!(payload_of(&frame), 7);
        assert_eq!(frame.pts, Some(7));
        assert!(s.packets().is_empty());
    }

    #[test]
    fn empty_queue_at_eof_is_end_of_stream() {
        let mut s = stream(ScriptedDecoder::new());
        s.state().set_end_of_file(true);
        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn empty_queue_before_eof_is_starvation() {
        let decoder = ScriptedDecoder::new();
        let log = decoder.log();
        let mut s = stream(decoder);

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(err.is_starved());
        assert!(s.packets().is_empty());
        assert!(log.borrow().submitted.is_empty());
    }

    #[test]
    fn would_block_on_send_keeps_packet_queued() {
        let decoder = ScriptedDecoder::new()
            .script_send(Ok(SendOutcome::WouldBlock))
            .script_receive(Ok(ReceiveOutcome::WouldBlock));
        let log = decoder.log();
        let mut s = stream(decoder);
        push(&s, 1);

        // WouldBlock, drain attempt, then the retry is accepted
        let mut frame = DecodedFrame::empty();
        s.read(&mut frame).unwrap();

        assert_eq!(log.borrow().submitted, vec![vec![1], vec![1]]);
        assert_eq!(log.borrow().accepted, vec![vec![1]]);
        assert_eq!(payload_of(&frame), 1);
    }

    #[test]
    fn iteration_cap_stops_a_stuck_decoder() {
        let decoder = ScriptedDecoder::new()
            .script_send(Ok(SendOutcome::WouldBlock))
            .script_receive(Ok(ReceiveOutcome::WouldBlock))
            .script_send(Ok(SendOutcome::WouldBlock))
            .script_receive(Ok(ReceiveOutcome::WouldBlock))
            .script_send(Ok(SendOutcome::WouldBlock));
        let mut s = DecodeStream::new(
            decoder,
            Arc::new(PacketQueue::new()),
            Arc::new(StreamState::new()),
            DecodeStreamConfig::with_max_iterations(5),
        );
        push(&s, 3);

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(matches!(err, Error::Stalled { iterations: 5 }));
        assert_eq!(queued_tags(&s), vec![3]);
    }

    #[test]
    fn zero_iteration_cap_still_reports_queue_state() {
        let mut s = DecodeStream::new(
            ScriptedDecoder::new(),
            Arc::new(PacketQueue::new()),
            Arc::new(StreamState::new()),
            DecodeStreamConfig::with_max_iterations(0),
        );

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(err.is_starved());

        s.state().set_end_of_file(true);
        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(err.is_eof());
    }

    /// Decoder that clears and refills the queue while taking a packet,
    /// as a seek on another thread would.
    struct SeekingDecoder {
        packets: Arc<PacketQueue>,
        seeked: bool,
    }

    impl DecoderBackend for SeekingDecoder {
        fn send_packet(&mut self, _: &Packet) -> Result<SendOutcome> {
            if !self.seeked {
                self.seeked = true;
                self.packets.clear();
                self.packets.push(Packet::new(vec![99]));
            }
            Ok(SendOutcome::Accepted)
        }

        fn receive_frame(&mut self, frame: &mut DecodedFrame) -> Result<ReceiveOutcome> {
            frame.reset_layout(1, 1, media_types::PixelFormat::Gray8);
            Ok(ReceiveOutcome::Produced)
        }

        fn flush(&mut self) {}

        fn close(&mut self) {}
    }

    #[test]
    fn accepted_packet_commit_spares_a_replaced_head() {
        let packets = Arc::new(PacketQueue::new());
        packets.push(Packet::new(vec![1]));
        let decoder = SeekingDecoder {
            packets: Arc::clone(&packets),
            seeked: false,
        };
        let mut s = DecodeStream::new(
            decoder,
            Arc::clone(&packets),
            Arc::new(StreamState::new()),
            DecodeStreamConfig::new(),
        );

        s.read(&mut DecodedFrame::empty()).unwrap();

        let left = packets.pop().unwrap();
        assert_eq!(left.data, vec![99]);
        assert!(packets.is_empty());
    }

    #[test]
    fn send_error_is_fatal_and_keeps_packet() {
        let decoder = ScriptedDecoder::new().script_send(Err(Error::decode(-1094995529, "invalid data")));
        let mut s = stream(decoder);
        push(&s, 4);

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(matches!(err, Error::Decode { code: -1094995529, .. }));
        assert_eq!(queued_tags(&s), vec![4]);
    }

    #[test]
    fn receive_error_is_fatal() {
        let decoder = ScriptedDecoder::new().script_receive(Err(Error::decode(-5, "io")));
        let mut s = stream(decoder);
        push(&s, 1);
        push(&s, 2);

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(matches!(err, Error::Decode { code: -5, .. }));
        assert_eq!(queued_tags(&s), vec![2]);
    }

    #[test]
    fn buffered_decoder_consumes_several_packets_per_frame() {
        let decoder = ScriptedDecoder::with_delay(3);
        let log = decoder.log();
        let mut s = stream(decoder);
        for tag in 1..=4 {
            push(&s, tag);
        }

        let mut frame = DecodedFrame::empty();
        s.read(&mut frame).unwrap();
        assert_eq!(payload_of(&frame), 1);
        assert_eq!(log.borrow().accepted.len(), 3);
        assert_eq!(queued_tags(&s), vec![4]);
    }

    #[test]
    fn frame_is_overwritten_in_place() {
        let mut s = stream(ScriptedDecoder::new());
        push(&s, 10);
        push(&s, 20);

        let mut frame = DecodedFrame::empty();
        s.read(&mut frame).unwrap();
        assert_eq!(payload_of(&frame), 10);
        s.read(&mut frame).unwrap();
        assert_eq!(payload_of(&frame), 20);
        assert_eq!(frame.pts, Some(20));
    }

    #[test]
    fn flush_buffers_leaves_queue_alone() {
        let decoder = ScriptedDecoder::new();
        let log = decoder.log();
        let mut s = stream(decoder);
        push(&s, 1);

        s.flush_buffers().unwrap();
        assert_eq!(log.borrow().flushes, 1);
        assert_eq!(s.packets().len(), 1);
        assert!(s.state().is_flushed());

        s.read(&mut DecodedFrame::empty()).unwrap();
        assert!(!s.state().is_flushed());
    }

    #[test]
    fn reset_drops_queued_packets() {
        let mut s = stream(ScriptedDecoder::new());
        push(&s, 1);
        push(&s, 2);
        assert_eq!(s.reset().unwrap(), 2);
        assert!(s.packets().is_empty());
    }

    #[test]
    fn dispose_flushes_then_closes_once() {
        let decoder = ScriptedDecoder::new();
        let log = decoder.log();
        let mut s = stream(decoder);

        s.dispose();
        s.dispose();
        drop(s);

        let log = log.borrow();
        assert_eq!(log.flushes, 1);
        assert_eq!(log.closes, 1);
        assert_eq!(log.events, vec!["flush", "close"]);
    }

    #[test]
    fn read_after_dispose_is_an_error() {
        let mut s = stream(ScriptedDecoder::new());
        push(&s, 1);
        s.dispose();

        let err = s.read(&mut DecodedFrame::empty()).unwrap_err();
        assert!(matches!(err, Error::Disposed { .. }));
        assert!(s.flush_buffers().is_err());
        assert_eq!(s.packets().len(), 1);
    }
}
