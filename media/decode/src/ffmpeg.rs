/*!
    libavcodec-backed video decoder.
*/

use std::os::raw::c_int;

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    util::{error::EAGAIN, frame::video::Video as VideoFrameFFmpeg},
};

use media_transform::ffmpeg::pixel_from_ffmpeg;
use media_types::{DecodedFrame, Error, Packet, Result};

use crate::backend::{DecoderBackend, ReceiveOutcome, SendOutcome};

/**
    Video decoder using FFmpeg.

    Decoded planes are copied out of FFmpeg's frame into the caller's
    [`DecodedFrame`], reusing its storage.

    A [`Packet`] with an empty payload is sent as FFmpeg's drain packet: the
    decoder stops taking input and hands out its remaining buffered frames.
    Push one after the last real packet of a stream to get every frame out,
    and call [`DecoderBackend::flush`] before sending more data.
*/
pub struct FfmpegDecoder {
    decoder: Option<VideoDecoderFFmpeg>,
    scratch: VideoFrameFFmpeg,
}

impl FfmpegDecoder {
    /**
        Open a decoder for the stream described by `parameters`.
    */
    pub fn new(parameters: codec::Parameters) -> Result<Self> {
        ffmpeg_next::init().map_err(decode_error)?;

        let decoder = codec::context::Context::from_parameters(parameters)
            .map_err(decode_error)?
            .decoder()
            .video()
            .map_err(decode_error)?;

        Ok(Self {
            decoder: Some(decoder),
            scratch: VideoFrameFFmpeg::empty(),
        })
    }

    fn decoder(&mut self) -> Result<&mut VideoDecoderFFmpeg> {
        self.decoder.as_mut().ok_or(Error::Disposed {
            what: "ffmpeg decoder",
        })
    }
}

impl DecoderBackend for FfmpegDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<SendOutcome> {
        let ffmpeg_pkt = to_ffmpeg_packet(packet);
        match self.decoder()?.send_packet(&ffmpeg_pkt) {
            Ok(()) => Ok(SendOutcome::Accepted),
            Err(e) if is_again(&e) => Ok(SendOutcome::WouldBlock),
            Err(e) => Err(decode_error(e)),
        }
    }

    fn receive_frame(&mut self, frame: &mut DecodedFrame) -> Result<ReceiveOutcome> {
        let Self { decoder, scratch } = self;
        let decoder = decoder.as_mut().ok_or(Error::Disposed {
            what: "ffmpeg decoder",
        })?;

        match decoder.receive_frame(scratch) {
            Ok(()) => {
                copy_frame(scratch, frame)?;
                Ok(ReceiveOutcome::Produced)
            }
            Err(e) if is_again(&e) => Ok(ReceiveOutcome::WouldBlock),
            Err(e) => Err(decode_error(e)),
        }
    }

    fn flush(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.flush();
        }
    }

    fn close(&mut self) {
        // Dropping the decoder closes and frees the codec context.
        self.decoder.take();
    }
}

/**
    Build the FFmpeg packet for `packet`. An empty payload becomes the drain packet.
*/
fn to_ffmpeg_packet(packet: &Packet) -> ffmpeg_next::Packet {
    let mut ffmpeg_pkt = if packet.data.is_empty() {
        ffmpeg_next::Packet::empty()
    } else {
        ffmpeg_next::Packet::copy(&packet.data)
    };
    ffmpeg_pkt.set_pts(packet.pts);
    ffmpeg_pkt.set_dts(packet.dts);
    ffmpeg_pkt.set_duration(packet.duration);
    if packet.is_keyframe {
        ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
    }
    ffmpeg_pkt
}

fn is_again(e: &ffmpeg_next::Error) -> bool {
    matches!(e, ffmpeg_next::Error::Other { errno } if *errno == EAGAIN)
}

fn decode_error(e: ffmpeg_next::Error) -> Error {
    Error::decode(c_int::from(e), e.to_string())
}

/**
    Copy an FFmpeg frame into our frame type, one visible row at a time.
*/
fn copy_frame(src: &VideoFrameFFmpeg, dst: &mut DecodedFrame) -> Result<()> {
    let format = pixel_from_ffmpeg(src.format()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported pixel format: {:?}", src.format()))
    })?;
    let (width, height) = (src.width(), src.height());

    dst.reset_layout(width, height, format);
    let layout = format.plane_layout(width, height);
    for (i, (plane, dims)) in dst.planes.iter_mut().zip(&layout).enumerate() {
        let data = src.data(i);
        let stride = src.stride(i);
        for row in 0..dims.rows {
            let from = row * stride;
            let to = row * plane.stride;
            plane.data[to..to + dims.row_bytes]
                .copy_from_slice(&data[from..from + dims.row_bytes]);
        }
    }
    dst.pts = src.pts();
    Ok(())
}

impl std::fmt::Debug for FfmpegDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegDecoder")
            .field("open", &self.decoder.is_some())
            .finish_non_exhaustive()
    }
}
