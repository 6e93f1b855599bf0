/*!
    Packet-driven decoding for the media crates.

    A [`DecodeStream`] pulls compressed packets from a shared
    [`PacketQueue`], feeds them to a decoder and drains one decoded frame
    per read into a caller-owned [`DecodedFrame`].

    # Features

    - `ffmpeg`: libavcodec decoder backend (`FfmpegDecoder`)
    - `test-util`: scripted decoder double and tracing setup for tests

    # Example

    ```ignore
    use std::sync::Arc;
    use media_decode::{DecodeStream, DecodeStreamConfig, DecodedFrame, Error, PacketQueue, StreamState};

    let packets = Arc::new(PacketQueue::new());
    let state = Arc::new(StreamState::new());
    let mut stream = DecodeStream::new(decoder, packets.clone(), state.clone(), DecodeStreamConfig::new());

    // Demuxer thread pushes into `packets` and sets `state` at end of file.

    let mut frame = DecodedFrame::empty();
    loop {
        match stream.read(&mut frame) {
            Ok(()) => { /* use frame */ }
            Err(Error::Starved) => { /* wait for the demuxer, then retry */ }
            Err(Error::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    ```

    # Flow Control

    The decoder may refuse a packet until output is drained, and may need
    several packets before it can produce a frame. Both conditions are
    handled inside [`DecodeStream::read`]; only an empty queue or a real
    decoder failure reaches the caller. A packet leaves the queue only once
    the decoder has accepted it.

    Reads never block on packet arrival. An empty queue before end of file
    fails with [`Error::Starved`] and the caller retries once more packets
    are queued.
*/

pub use media_types::{
    DecodedFrame, Error, FrameBuffer, Packet, PacketQueue, PixelFormat, Result, StreamState,
};

mod backend;
mod config;
mod reader;
mod stream;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backend::{DecoderBackend, ReceiveOutcome, SendOutcome};
pub use config::DecodeStreamConfig;
pub use reader::VideoReader;
pub use stream::{DecodeStream, ReadState};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegDecoder;
