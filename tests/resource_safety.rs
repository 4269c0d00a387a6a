// Every codec call must release its engine context, on success and on
// failure alike. Live allocations are counted by a wrapping global
// allocator; this file holds a single test so no other test thread
// allocates while it measures.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use chunkzip::{
    compress, compress_paged, decompress, decompress_paged, max_compressed_size,
    max_gdeflate_compressed_size,
};

struct CountingAlloc;

static LIVE: AtomicIsize = AtomicIsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        LIVE.fetch_add(1, Ordering::SeqCst);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        LIVE.fetch_add(1, Ordering::SeqCst);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        LIVE.fetch_sub(1, Ordering::SeqCst);
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn exercise(data: &[u8], packed: &mut [u8], paged: &mut [u8], decoded: &mut [u8]) {
    let n = compress(6, data, packed).unwrap();
    decompress(&packed[..n], decoded).unwrap();
    // Failure paths: corrupt input, short output, bad level.
    let _ = decompress(&data[..64], decoded);
    let _ = decompress(&packed[..n], &mut decoded[..10]);
    let _ = compress(42, data, packed);

    let bound = max_gdeflate_compressed_size(data.len(), 2);
    let n = compress_paged(6, data, paged, bound.page_count, bound.page_size).unwrap();
    decompress_paged(&paged[..n], decoded).unwrap();
    let _ = decompress_paged(&data[..64], decoded);
    let _ = compress_paged(6, data, &mut paged[..32], bound.page_count, 16);
}

#[test]
fn repeated_calls_do_not_leak_contexts() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
    let mut packed = vec![0u8; max_compressed_size(data.len())];
    let mut paged = vec![0u8; max_gdeflate_compressed_size(data.len(), 2).max_size];
    let mut decoded = vec![0u8; data.len()];

    // Warm up lazily initialised runtime state (thread-locals, logger).
    exercise(&data, &mut packed, &mut paged, &mut decoded);
    let baseline = LIVE.load(Ordering::SeqCst);

    for _ in 0..10_000 {
        exercise(&data, &mut packed, &mut paged, &mut decoded);
    }

    assert_eq!(LIVE.load(Ordering::SeqCst), baseline);
}
