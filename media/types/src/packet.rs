/*!
    Encoded packet type.
*/

/**
    An encoded media packet.

    Contains compressed data from a single stream. Packets are the unit of
    data between demuxer and decoder and travel through a [`PacketQueue`]
    in FIFO order.

    [`PacketQueue`]: crate::PacketQueue
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp in stream time base units.
    pub pts: Option<i64>,
    /// Decode timestamp (may differ from PTS for B-frames).
    pub dts: Option<i64>,
    /// Duration in stream time base units.
    pub duration: i64,
    /// Whether this is a keyframe (can be decoded independently).
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a new packet without timing information.
    */
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    pub fn with_dts(mut self, dts: i64) -> Self {
        self.dts = Some(dts);
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /**
        Mark this packet as a keyframe.
    */
    pub fn keyframe(mut self) -> Self {
        self.is_keyframe = true;
        self
    }

    /**
        Returns the size of the compressed payload in bytes.
    */
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

// Ensure Packet is Send + Sync
static_assertions::assert_impl_all!(Packet: Send, Sync);
