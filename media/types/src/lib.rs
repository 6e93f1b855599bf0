/*!
    Shared types for the media crates.

    This crate defines the vocabulary that crosses crate boundaries. It has no
    dependency on FFmpeg, so consumers and test doubles can depend on it
    without pulling in native bindings.

    # Image Types

    - [`FrameBuffer`] - Caller-owned packed image buffer
    - [`DecodedFrame`] and [`Plane`] - Codec-native frame, overwritten in place
    - [`PixelFormat`], [`PlaneLayout`] and [`PlaneLayouts`] - Pixel formats and their plane geometry

    # Decode Plumbing

    - [`Packet`] - Encoded packet data
    - [`PacketQueue`] - FIFO shared between demuxer and decode stream
    - [`StreamState`] - End-of-file and flush flags for one stream

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod error;
mod format;
mod frame;
mod packet;
mod queue;
mod state;

pub use error::{Error, Result};
pub use format::{MAX_PLANES, PixelFormat, PlaneLayout, PlaneLayouts};
pub use frame::{DecodedFrame, FrameBuffer, Plane, PlaneMut, PlaneRef};
pub use packet::Packet;
pub use queue::{HeadTicket, PacketQueue};
pub use state::StreamState;
