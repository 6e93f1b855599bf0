/*!
    Pixel converter with a single-slot context cache.
*/

use media_types::{DecodedFrame, Error, FrameBuffer, PlaneMut, PlaneRef, Result};
use tracing::{debug, trace};

use crate::backend::{ConversionKey, ScalerBackend};
use crate::software::SoftwareScaler;

struct CachedContext<C> {
    key: ConversionKey,
    context: C,
}

/**
    Converts images between a caller's [`FrameBuffer`] layout and a
    codec-native [`DecodedFrame`] layout.

    The converter keeps the most recently used conversion context and only
    rebuilds it when the source or destination size or format changes.
    Repeated conversions with the same layouts reuse the context without
    allocating.

    The context is released by [`dispose`](Self::dispose) or on drop.
*/
pub struct PixelConverter<B: ScalerBackend = SoftwareScaler> {
    backend: B,
    cached: Option<CachedContext<B::Context>>,
    rebuilds: u64,
    disposed: bool,
}

impl PixelConverter<SoftwareScaler> {
    /**
        Create a converter backed by the built-in software scaler.
    */
    pub fn software() -> Self {
        Self::new(SoftwareScaler::new())
    }
}

impl<B: ScalerBackend> PixelConverter<B> {
    /**
        Create a converter using the given backend.

        No context is built until the first conversion.
    */
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cached: None,
            rebuilds: 0,
            disposed: false,
        }
    }

    /**
        Overwrite `destination` with `source`, rescaled and reformatted to
        the destination's layout. Used when encoding.

        `destination` must already hold planes large enough for its declared
        size and format.
    */
    pub fn convert_to_frame(
        &mut self,
        source: &FrameBuffer,
        destination: &mut DecodedFrame,
    ) -> Result<()> {
        self.ensure_open()?;
        if !destination.is_allocated() {
            return Err(Error::invalid_data(format!(
                "destination frame has no buffer for {}x{} {:?}",
                destination.width, destination.height, destination.format
            )));
        }

        let key = ConversionKey::new(
            source.dimensions(),
            source.format(),
            destination.dimensions(),
            destination.format,
        );
        let src = [source.as_plane()];
        let count = destination.plane_count();
        let mut dst = destination.plane_muts();
        self.run(key, &src, &mut dst[..count])
    }

    /**
        Overwrite `destination` with the decoded `source` frame, rescaled and
        reformatted to the buffer's layout. Used when decoding.
    */
    pub fn convert_from_frame(
        &mut self,
        source: &DecodedFrame,
        destination: &mut FrameBuffer,
    ) -> Result<()> {
        self.ensure_open()?;
        if !source.is_allocated() {
            return Err(Error::invalid_data(format!(
                "source frame has no buffer for {}x{} {:?}",
                source.width, source.height, source.format
            )));
        }

        let key = ConversionKey::new(
            source.dimensions(),
            source.format,
            destination.dimensions(),
            destination.format(),
        );
        let src = source.plane_refs();
        let mut dst = [destination.as_plane_mut()];
        self.run(key, &src[..source.plane_count()], &mut dst)
    }

    /**
        Number of times a conversion context has been built.
    */
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /**
        Key of the currently cached context, if any.
    */
    pub fn cached_key(&self) -> Option<&ConversionKey> {
        self.cached.as_ref().map(|c| &c.key)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /**
        Release the cached context. Calling this more than once is a no-op.
    */
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(cached) = self.cached.take() {
            debug!(key = ?cached.key, "releasing conversion context");
            self.backend.free_context(cached.context);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.disposed {
            Err(Error::Disposed {
                what: "pixel converter",
            })
        } else {
            Ok(())
        }
    }

    fn run(
        &mut self,
        key: ConversionKey,
        src: &[PlaneRef<'_>],
        dst: &mut [PlaneMut<'_>],
    ) -> Result<()> {
        let hit = matches!(&self.cached, Some(cached) if cached.key == key);
        if hit {
            trace!("conversion context cache hit");
        } else {
            // Build before releasing, so a failed build keeps the old context.
            let context = self.backend.create_context(&key)?;
            let previous = self.cached.replace(CachedContext { key, context });
            if let Some(previous) = previous {
                self.backend.free_context(previous.context);
            }
            self.rebuilds += 1;
            debug!(
                ?key,
                rebuilds = self.rebuilds,
                "built conversion context"
            );
        }

        match self.cached.as_mut() {
            Some(cached) => self.backend.scale(&mut cached.context, src, dst),
            None => Err(Error::conversion(-1, "no conversion context")),
        }
    }
}

impl<B: ScalerBackend> Drop for PixelConverter<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: ScalerBackend> std::fmt::Debug for PixelConverter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelConverter")
            .field("cached_key", &self.cached_key())
            .field("rebuilds", &self.rebuilds)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
