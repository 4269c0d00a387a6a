#![no_main]
use libfuzzer_sys::fuzz_target;
use chunkzip::{
    compress, compress_paged, decompress, decompress_paged, max_compressed_size,
    max_gdeflate_compressed_size,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the level, second the page count hint.
    let level = i32::from(data[0] % 11) - 1;
    let pages = usize::from(data[1] % 8);
    let payload = &data[2..];

    let mut packed = vec![0u8; max_compressed_size(payload.len())];
    let n = compress(level, payload, &mut packed).unwrap();
    let mut decoded = vec![0u8; payload.len()];
    let m = decompress(&packed[..n], &mut decoded).unwrap();
    assert_eq!(&decoded[..m], payload);

    let bound = max_gdeflate_compressed_size(payload.len(), pages);
    let mut packed = vec![0u8; bound.max_size];
    let n = compress_paged(level, payload, &mut packed, bound.page_count, bound.page_size).unwrap();
    let mut decoded = vec![0u8; payload.len()];
    let m = decompress_paged(&packed[..n], &mut decoded).unwrap();
    assert_eq!(&decoded[..m], payload);
});
