//! Property-based tests using proptest

use proptest::prelude::*;
use rgb2gif::{
    Error,
    api::{encode_document, estimate_output_size, quantize_batch},
    encode::encode_into,
    schema::{Document, Palette, QuantizedFrame},
    storage::{load_frame, save_frame},
};
use rgb::RGB8;
use tempfile::tempdir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_single_frame_round_trip(
        width in 1u32..24,
        height in 1u32..24,
        index in any::<u32>(),
        seed in any::<u8>(),
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.yxf");
        let pixels: Vec<u8> = (0..width * height * 4)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();

        save_frame(&path, &pixels, width, height, index).unwrap();
        let stored = load_frame(&path).unwrap();

        prop_assert_eq!(stored.index, index);
        prop_assert_eq!(stored.frame.width(), width);
        prop_assert_eq!(stored.frame.height(), height);
        prop_assert_eq!(stored.frame.pixels(), &pixels[..]);
    }

    #[test]
    fn prop_quantized_indices_within_palette(
        width in 1u32..20,
        height in 1u32..20,
        target in 1u32..16,
        palette_size in 1usize..=256,
        frames in 1usize..4,
        data in prop::collection::vec(any::<u8>(), 20 * 20 * 4 * 3),
    ) {
        let len = (width * height * 4) as usize;
        let slices: Vec<&[u8]> = (0..frames).map(|f| &data[f * len..(f + 1) * len]).collect();

        let q = quantize_batch(&slices, width, height, target, palette_size).unwrap();
        prop_assert_eq!(q.indices.len(), frames * (target * target) as usize);
        prop_assert_eq!(q.palettes.len(), frames * palette_size);
        prop_assert!(q.indices.iter().all(|&i| (i as usize) < palette_size));
    }

    #[test]
    fn prop_estimate_bounds_encoder(
        frame_count in 1usize..4,
        side in 1u32..48,
        palette_size in 1usize..=256,
        seed in any::<u64>(),
    ) {
        let pixels = (side * side) as usize;
        let mut state = seed;
        let indices: Vec<u8> = (0..frame_count * pixels)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 33) % palette_size as u64) as u8
            })
            .collect();
        let palettes: Vec<u32> = (0..frame_count * palette_size)
            .map(|i| (i as u32).wrapping_mul(0x9E3779B9) & 0x00FF_FFFF)
            .collect();

        let bound = estimate_output_size(frame_count, side, palette_size).unwrap();
        let mut out = vec![0u8; bound];
        let written =
            encode_document(&indices, &palettes, frame_count, side, 3, &mut out).unwrap();
        prop_assert!(written <= bound);
        prop_assert_eq!(&out[..6], b"GIF89a");
        prop_assert_eq!(out[written - 1], 0x3B);
    }

    #[test]
    fn prop_short_buffer_reports_error_and_zeroes(
        side in 1u32..16,
        cut in 1usize..64,
    ) {
        let palette = Palette::new(vec![RGB8::new(1, 2, 3), RGB8::new(4, 5, 6)]).unwrap();
        let indices = (0..side * side).map(|i| (i % 2) as u8).collect();
        let frame = QuantizedFrame::new(indices, palette).unwrap();
        let doc = Document::new(side, vec![frame], 1).unwrap();

        let mut full = vec![0u8; estimate_output_size(1, side, 2).unwrap()];
        let needed = encode_into(&doc, &mut full).unwrap();

        let mut short = vec![0u8; needed.saturating_sub(cut)];
        let result = encode_into(&doc, &mut short);
        let too_small = matches!(result, Err(Error::BufferTooSmall { .. }));
        prop_assert!(too_small);
        prop_assert!(short.iter().all(|&b| b == 0));
    }
}
