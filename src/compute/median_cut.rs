//! Median-cut palette construction over a weighted RGB histogram.
//!
//! Deterministic: histogram entries are ordered by packed color, the box with
//! the widest channel extent is split first (lowest box index on ties) along
//! its widest axis (R, then G, then B on ties) at the count-weighted median.

use std::collections::HashMap;

use rgb::RGB8;

use crate::schema::pack_rgb;

/// Unique colors and their pixel counts.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    counts: HashMap<RGB8, u64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram of a pixel buffer.
    pub fn from_pixels(pixels: &[RGB8]) -> Self {
        let mut hist = Self::new();
        hist.add_pixels(pixels);
        hist
    }

    pub fn add_pixels(&mut self, pixels: &[RGB8]) {
        for &p in pixels {
            *self.counts.entry(p).or_insert(0) += 1;
        }
    }

    /// Fold another histogram into this one.
    pub fn merge(&mut self, other: &Histogram) {
        for (&color, &count) in &other.counts {
            *self.counts.entry(color).or_insert(0) += count;
        }
    }

    /// Number of unique colors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries sorted by packed color value.
    fn sorted_entries(&self) -> Vec<(RGB8, u64)> {
        let mut entries: Vec<(RGB8, u64)> = self.counts.iter().map(|(&c, &n)| (c, n)).collect();
        entries.sort_unstable_by_key(|&(c, _)| pack_rgb(c));
        entries
    }
}

#[inline]
fn channel(color: RGB8, axis: usize) -> u8 {
    match axis {
        0 => color.r,
        1 => color.g,
        _ => color.b,
    }
}

/// A contiguous run of histogram entries and its bounding box.
#[derive(Debug, Clone)]
struct ColorBox {
    start: usize,
    end: usize,
    min: [u8; 3],
    max: [u8; 3],
}

impl ColorBox {
    fn new(start: usize, end: usize, entries: &[(RGB8, u64)]) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for &(color, _) in &entries[start..end] {
            for axis in 0..3 {
                let v = channel(color, axis);
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }
        Self {
            start,
            end,
            min,
            max,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.end - self.start
    }

    /// Widest axis and its extent; R wins ties over G, G over B.
    fn widest_axis(&self) -> (usize, u8) {
        let mut best = (0, self.max[0] - self.min[0]);
        for axis in 1..3 {
            let extent = self.max[axis] - self.min[axis];
            if extent > best.1 {
                best = (axis, extent);
            }
        }
        best
    }

    fn split(&self, entries: &mut [(RGB8, u64)]) -> (ColorBox, ColorBox) {
        let (axis, _) = self.widest_axis();
        let run = &mut entries[self.start..self.end];
        run.sort_unstable_by_key(|&(c, _)| (channel(c, axis), pack_rgb(c)));

        let total: u64 = run.iter().map(|&(_, n)| n).sum();
        let mut acc = 0u64;
        let mut cut = run.len() - 1;
        for (i, &(_, n)) in run.iter().enumerate() {
            acc += n;
            if acc * 2 >= total {
                cut = i + 1;
                break;
            }
        }
        let mid = self.start + cut.clamp(1, run.len() - 1);

        (
            ColorBox::new(self.start, mid, entries),
            ColorBox::new(mid, self.end, entries),
        )
    }

    /// Count-weighted mean color, rounded.
    fn mean(&self, entries: &[(RGB8, u64)]) -> RGB8 {
        let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
        for &(color, count) in &entries[self.start..self.end] {
            r += color.r as u64 * count;
            g += color.g as u64 * count;
            b += color.b as u64 * count;
            n += count;
        }
        let n = n.max(1);
        RGB8::new(
            ((r + n / 2) / n) as u8,
            ((g + n / 2) / n) as u8,
            ((b + n / 2) / n) as u8,
        )
    }
}

/// Reduce a histogram to at most `max_colors` representative colors.
///
/// If the histogram holds no more than `max_colors` unique colors, the palette
/// is exactly those colors in packed-value order.
pub fn median_cut(hist: &Histogram, max_colors: usize) -> Vec<RGB8> {
    let mut entries = hist.sorted_entries();
    if entries.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let mut boxes = vec![ColorBox::new(0, entries.len(), &entries)];
    while boxes.len() < max_colors {
        let mut pick: Option<(usize, u8)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if b.len() < 2 {
                continue;
            }
            let (_, extent) = b.widest_axis();
            if pick.is_none_or(|(_, best)| extent > best) {
                pick = Some((i, extent));
            }
        }
        let Some((i, _)) = pick else {
            break;
        };
        let (left, right) = boxes[i].split(&mut entries);
        boxes[i] = left;
        boxes.insert(i + 1, right);
    }

    boxes.iter().map(|b| b.mean(&entries)).collect()
}
