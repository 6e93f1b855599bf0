/*!
    Decode-then-convert convenience wrapper.
*/

use media_transform::{PixelConverter, ScalerBackend, SoftwareScaler};
use media_types::{DecodedFrame, FrameBuffer, PixelFormat, Result};

use crate::backend::DecoderBackend;
use crate::stream::DecodeStream;

/**
    Reads frames from a [`DecodeStream`] and converts them into the
    caller's [`FrameBuffer`] layout.

    Owns one reusable codec-native frame, so steady-state reads only write
    into existing buffers.
*/
pub struct VideoReader<D: DecoderBackend, S: ScalerBackend = SoftwareScaler> {
    stream: DecodeStream<D>,
    converter: PixelConverter<S>,
    frame: DecodedFrame,
}

impl<D: DecoderBackend, S: ScalerBackend> VideoReader<D, S> {
    pub fn new(stream: DecodeStream<D>, converter: PixelConverter<S>) -> Self {
        Self {
            stream,
            converter,
            frame: DecodedFrame::empty(),
        }
    }

    /**
        Decode the next frame and write it into `target`, rescaling and
        reformatting as needed. Returns the frame's presentation timestamp.

        Errors from the stream ([`Error::Eof`], [`Error::Starved`], ...) are
        passed through unchanged.

        [`Error::Eof`]: media_types::Error::Eof
        [`Error::Starved`]: media_types::Error::Starved
    */
    pub fn read_into(&mut self, target: &mut FrameBuffer) -> Result<Option<i64>> {
        self.stream.read(&mut self.frame)?;
        self.converter.convert_from_frame(&self.frame, target)?;
        Ok(self.frame.pts)
    }

    /**
        Decode the next frame into a newly allocated buffer.
    */
    pub fn read_frame(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<FrameBuffer> {
        let mut target = FrameBuffer::alloc(width, height, format)?;
        self.read_into(&mut target)?;
        Ok(target)
    }

    /**
        The most recently decoded codec-native frame.
    */
    pub fn last_frame(&self) -> &DecodedFrame {
        &self.frame
    }

    pub fn stream(&self) -> &DecodeStream<D> {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut DecodeStream<D> {
        &mut self.stream
    }

    pub fn converter(&self) -> &PixelConverter<S> {
        &self.converter
    }

    /**
        Dispose the stream and the converter. Calling this more than once is a no-op.
    */
    pub fn dispose(&mut self) {
        self.stream.dispose();
        self.converter.dispose();
    }
}
