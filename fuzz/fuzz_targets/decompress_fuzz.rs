#![no_main]
use libfuzzer_sys::fuzz_target;
use chunkzip::{decompress, decompress_paged};

fuzz_target!(|data: &[u8]| {
    // Both decoders must reject arbitrary bytes with an error, never panic
    // or write past the output buffer.
    let capacity = data.first().map_or(0, |&b| usize::from(b) * 64);
    let mut out = vec![0u8; capacity];
    let _ = decompress(data, &mut out);
    let _ = decompress_paged(data, &mut out);
});
