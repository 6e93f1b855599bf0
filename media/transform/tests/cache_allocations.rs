use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use media_transform::{
    ConversionKey, DecodedFrame, FrameBuffer, PixelConverter, PixelFormat, PlaneMut, PlaneRef,
    Result, ScalerBackend,
};

/// Counts allocations made by the current thread.
struct CountingAlloc;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: CountingAlloc = CountingAlloc;

fn allocations_during(f: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.with(Cell::get);
    f();
    ALLOCATIONS.with(Cell::get) - before
}

/// Backend that does no work of its own.
struct NullScaler;

impl ScalerBackend for NullScaler {
    type Context = ();

    fn create_context(&mut self, _: &ConversionKey) -> Result<()> {
        Ok(())
    }

    fn scale(&mut self, _: &mut (), _: &[PlaneRef<'_>], _: &mut [PlaneMut<'_>]) -> Result<()> {
        Ok(())
    }

    fn free_context(&mut self, _: ()) {}
}

#[test]
fn cache_hits_do_not_allocate() {
    // Planar native frames exercise the multi-plane path.
    let mut converter = PixelConverter::new(NullScaler);
    let mut yuv = DecodedFrame::alloc(16, 8, PixelFormat::Yuv420p);
    let mut rgba = FrameBuffer::alloc(16, 8, PixelFormat::Rgba).unwrap();

    // The first call builds the context, the second warms up logging callsites.
    converter.convert_from_frame(&yuv, &mut rgba).unwrap();
    converter.convert_from_frame(&yuv, &mut rgba).unwrap();
    let from_frame = allocations_during(|| converter.convert_from_frame(&yuv, &mut rgba).unwrap());

    converter.convert_to_frame(&rgba, &mut yuv).unwrap();
    converter.convert_to_frame(&rgba, &mut yuv).unwrap();
    let to_frame = allocations_during(|| converter.convert_to_frame(&rgba, &mut yuv).unwrap());

    assert_eq!((from_frame, to_frame), (0, 0));
    assert_eq!(converter.rebuild_count(), 2);

    // The software backend copies same-size frames without allocating.
    let mut converter = PixelConverter::software();
    let mut bgra = DecodedFrame::alloc(16, 8, PixelFormat::Bgra);
    let mut rgb = FrameBuffer::alloc(16, 8, PixelFormat::Rgb24).unwrap();

    converter.convert_to_frame(&rgb, &mut bgra).unwrap();
    converter.convert_to_frame(&rgb, &mut bgra).unwrap();
    let to_frame = allocations_during(|| converter.convert_to_frame(&rgb, &mut bgra).unwrap());

    let mut back = PixelConverter::software();
    back.convert_from_frame(&bgra, &mut rgb).unwrap();
    back.convert_from_frame(&bgra, &mut rgb).unwrap();
    let from_frame = allocations_during(|| back.convert_from_frame(&bgra, &mut rgb).unwrap());

    assert_eq!((from_frame, to_frame), (0, 0));
    assert_eq!(converter.rebuild_count() + back.rebuild_count(), 2);
}
