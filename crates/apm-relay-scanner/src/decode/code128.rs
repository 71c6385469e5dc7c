//! Code 128 decoding from grayscale scanlines.
//!
//! Each sampled row is binarized against its own mid-level, turned into
//! bar/space run widths, and matched against the symbol table. Rows are read
//! in both directions so an upside-down card still decodes. A result is only
//! accepted when the stop pattern is found and the mod-103 checksum holds.

use image::GrayImage;
use lazy_static::lazy_static;

use super::Decoder;
use crate::camera::Frame;

/// Module widths for symbol values 0..=105, bar first.
const PATTERN_TABLE: &str = "\
    212222 222122 222221 121223 121322 131222 122213 122312 132212 221213 \
    221312 231212 112232 122132 122231 113222 123122 123221 223211 221132 \
    221231 213212 223112 312131 311222 321122 321221 312212 322112 322211 \
    212123 212321 232121 111323 131123 131321 112313 132113 132311 211313 \
    231113 231311 112133 112331 132131 113123 113321 133121 313121 211331 \
    231131 213113 213311 213131 311123 311321 331121 312113 312311 332111 \
    314111 221411 431111 111224 111422 121124 121421 141122 141221 112214 \
    112412 122114 122411 142112 142211 241211 221114 413111 241112 134111 \
    111242 121142 121241 114212 124112 124211 411212 421112 421211 212141 \
    214121 412121 111143 111341 131141 114113 114311 411113 411311 113141 \
    114131 311141 411131 211412 211214 211232";

pub(crate) const START_A: u8 = 103;
pub(crate) const START_B: u8 = 104;
pub(crate) const START_C: u8 = 105;
pub(crate) const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const SHIFT: u8 = 98;
const CODE_C: u8 = 99;
const CODE_B: u8 = 100;
const CODE_A: u8 = 101;
const FNC1: u8 = 102;

/// Summed per-element deviation, in modules, still accepted as a match.
/// Distinct table entries are at least two modules apart.
const MAX_SYMBOL_ERROR: f32 = 0.9;

/// Light margin required before the start symbol, in modules.
const MIN_QUIET_MODULES: f32 = 3.0;

lazy_static! {
    pub(crate) static ref PATTERNS: Vec<[u8; 6]> = PATTERN_TABLE
        .split_whitespace()
        .map(|entry| {
            let mut widths = [0u8; 6];
            for (slot, digit) in widths.iter_mut().zip(entry.bytes()) {
                *slot = digit - b'0';
            }
            widths
        })
        .collect();
}

/// Mod-103 checksum over a start symbol and its data symbols.
pub(crate) fn checksum(symbols: &[u8]) -> u8 {
    let weighted: u32 = symbols
        .iter()
        .enumerate()
        .map(|(i, &value)| (i.max(1) as u32) * value as u32)
        .sum();
    (weighted % 103) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    dark: bool,
    width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Scanline decoder for Code 128 (sets A, B and C).
#[derive(Debug, Clone)]
pub struct Code128Decoder {
    scanlines: usize,
    min_contrast: u8,
}

impl Default for Code128Decoder {
    fn default() -> Self {
        Self {
            scanlines: 15,
            min_contrast: 40,
        }
    }
}

impl Code128Decoder {
    /// Decoder with default sampling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows sampled per frame, taken from the center outward.
    pub fn with_scanlines(mut self, scanlines: usize) -> Self {
        self.scanlines = scanlines.max(1);
        self
    }

    /// Decode the first readable barcode in a grayscale image.
    pub fn decode_luma(&self, gray: &GrayImage) -> Option<String> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let raw = gray.as_raw();
        for y in scan_rows(height, self.scanlines) {
            let start = (y * width) as usize;
            let row = &raw[start..start + width as usize];
            let Some(mut runs) = runs_of(row, self.min_contrast) else {
                continue;
            };
            if let Some(text) = decode_runs(&runs) {
                return Some(text);
            }
            runs.reverse();
            if let Some(text) = decode_runs(&runs) {
                return Some(text);
            }
        }
        None
    }
}

impl Decoder for Code128Decoder {
    fn name(&self) -> &str {
        "code128"
    }

    fn decode(&self, frame: &Frame) -> Vec<String> {
        self.decode_luma(&frame.to_luma8()).into_iter().collect()
    }
}

/// Row indices to sample, nearest to the vertical center first.
fn scan_rows(height: u32, count: usize) -> Vec<u32> {
    let count = (count as u32).clamp(1, height);
    let center = i64::from(height / 2);
    let mut rows: Vec<u32> = (1..=count).map(|k| k * height / (count + 1)).collect();
    rows.dedup();
    rows.sort_by_key(|&y| (i64::from(y) - center).abs());
    rows
}

fn runs_of(row: &[u8], min_contrast: u8) -> Option<Vec<Run>> {
    let (lo, hi) = row
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if hi.saturating_sub(lo) < min_contrast {
        return None;
    }
    let threshold = ((u16::from(lo) + u16::from(hi)) / 2) as u8;

    let mut runs: Vec<Run> = Vec::new();
    for &pixel in row {
        let dark = pixel < threshold;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.width += 1,
            _ => runs.push(Run { dark, width: 1 }),
        }
    }
    Some(runs)
}

fn decode_runs(runs: &[Run]) -> Option<String> {
    (0..runs.len())
        .filter(|&i| runs[i].dark)
        .find_map(|i| decode_from(runs, i))
}

fn decode_from(runs: &[Run], start: usize) -> Option<String> {
    let first = symbol_at(runs, start)?;
    if !(START_A..=START_C).contains(&first) {
        return None;
    }
    let module = total_width(&runs[start..start + 6]) as f32 / 11.0;
    if start > 0 && (runs[start - 1].width as f32) < module * MIN_QUIET_MODULES {
        return None;
    }

    let mut symbols = vec![first];
    let mut pos = start + 6;
    while !is_stop(runs, pos) {
        let value = symbol_at(runs, pos)?;
        if value >= START_A {
            return None;
        }
        symbols.push(value);
        pos += 6;
    }

    // start, at least one data symbol, checksum
    if symbols.len() < 3 {
        return None;
    }
    let expected = symbols.pop()?;
    if checksum(&symbols) != expected {
        return None;
    }
    translate(&symbols)
}

fn total_width(runs: &[Run]) -> u32 {
    runs.iter().map(|r| r.width).sum()
}

fn deviation(runs: &[Run], modules: &[u8], total_modules: f32) -> f32 {
    let scale = total_modules / total_width(runs) as f32;
    runs.iter()
        .zip(modules)
        .map(|(run, &m)| (run.width as f32 * scale - f32::from(m)).abs())
        .sum()
}

fn symbol_at(runs: &[Run], pos: usize) -> Option<u8> {
    let window = runs.get(pos..pos + 6)?;
    if !window[0].dark || total_width(window) < 11 {
        return None;
    }
    let (value, error) = PATTERNS
        .iter()
        .enumerate()
        .map(|(value, pattern)| (value, deviation(window, pattern, 11.0)))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    (error <= MAX_SYMBOL_ERROR).then_some(value as u8)
}

fn is_stop(runs: &[Run], pos: usize) -> bool {
    match runs.get(pos..pos + 7) {
        Some(window) if window[0].dark && total_width(window) >= 13 => {
            deviation(window, &STOP_PATTERN, 13.0) <= MAX_SYMBOL_ERROR
        }
        _ => false,
    }
}

fn translate(symbols: &[u8]) -> Option<String> {
    let mut set = match symbols[0] {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        _ => CodeSet::C,
    };
    let mut shifted = false;
    let mut out = String::new();

    for &value in &symbols[1..] {
        let active = match (shifted, set) {
            (true, CodeSet::A) => CodeSet::B,
            (true, CodeSet::B) => CodeSet::A,
            _ => set,
        };
        shifted = false;

        match active {
            CodeSet::C => match value {
                0..=99 => {
                    out.push(char::from(b'0' + value / 10));
                    out.push(char::from(b'0' + value % 10));
                }
                CODE_B => set = CodeSet::B,
                CODE_A => set = CodeSet::A,
                FNC1 => {}
                _ => return None,
            },
            CodeSet::A => match value {
                0..=63 => out.push(char::from(value + 32)),
                64..=95 => out.push(char::from(value - 64)),
                SHIFT => shifted = true,
                CODE_C => set = CodeSet::C,
                CODE_B => set = CodeSet::B,
                // FNC3, FNC2, FNC4, FNC1
                96 | 97 | CODE_A | FNC1 => {}
                _ => return None,
            },
            CodeSet::B => match value {
                0..=95 => out.push(char::from(value + 32)),
                SHIFT => shifted = true,
                CODE_C => set = CodeSet::C,
                CODE_A => set = CodeSet::A,
                // FNC3, FNC2, FNC4, FNC1
                96 | 97 | CODE_B | FNC1 => {}
                _ => return None,
            },
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encode, render_code128, render_symbols};
    use image::{imageops, DynamicImage, GrayImage, Luma};
    use proptest::prelude::*;

    #[test]
    fn test_pattern_table_shape() {
        assert_eq!(PATTERNS.len(), 106);
        for pattern in PATTERNS.iter() {
            assert_eq!(pattern.iter().map(|&m| m as u32).sum::<u32>(), 11);
        }
    }

    #[test]
    fn test_checksum_known_value() {
        // Start B, "PJ" -> 104 + 1*48 + 2*42 = 236 % 103 = 30
        assert_eq!(checksum(&[START_B, 48, 42]), 30);
    }

    #[test]
    fn test_decode_set_b() {
        let img = render_code128("APM-2024", 2, 40).unwrap();
        assert_eq!(
            Code128Decoder::new().decode_luma(&img).as_deref(),
            Some("APM-2024")
        );
    }

    #[test]
    fn test_decode_set_c_digits() {
        let img = render_code128("0123456789", 3, 30).unwrap();
        assert_eq!(
            Code128Decoder::new().decode_luma(&img).as_deref(),
            Some("0123456789")
        );
    }

    #[test]
    fn test_decode_code_switch() {
        let mut symbols = vec![START_C, 12, 34, CODE_B, b'A' - 32];
        symbols.push(checksum(&symbols));
        let img = render_symbols(&symbols, 2, 30);
        assert_eq!(
            Code128Decoder::new().decode_luma(&img).as_deref(),
            Some("1234A")
        );
    }

    #[test]
    fn test_decode_shift_in_set_a() {
        // Set A "AB", shift to read "c" from set B, then "D"
        let mut symbols = vec![START_A, 33, 34, SHIFT, b'c' - 32, 36];
        symbols.push(checksum(&symbols));
        let img = render_symbols(&symbols, 2, 30);
        assert_eq!(
            Code128Decoder::new().decode_luma(&img).as_deref(),
            Some("ABcD")
        );
    }

    #[test]
    fn test_decode_upside_down() {
        let img = render_code128("0001234567", 2, 30).unwrap();
        let flipped = imageops::rotate180(&img);
        assert_eq!(
            Code128Decoder::new().decode_luma(&flipped).as_deref(),
            Some("0001234567")
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let mut symbols = encode("12345").unwrap();
        let last = symbols.len() - 1;
        symbols[last] = (symbols[last] + 1) % 103;
        let img = render_symbols(&symbols, 2, 30);
        assert_eq!(Code128Decoder::new().decode_luma(&img), None);
    }

    #[test]
    fn test_blank_and_empty_images() {
        let decoder = Code128Decoder::new();
        assert_eq!(
            decoder.decode_luma(&GrayImage::from_pixel(64, 16, Luma([255]))),
            None
        );
        assert_eq!(decoder.decode_luma(&GrayImage::new(0, 0)), None);
    }

    #[test]
    fn test_decoder_trait_on_color_frame() {
        let img = render_code128("ID42", 2, 24).unwrap();
        let frame = DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(img).to_rgb8());
        assert_eq!(Code128Decoder::new().decode(&frame), vec!["ID42".to_string()]);
    }

    #[test]
    fn test_barcode_with_margin_rows() {
        // barcode only in the lower band; center rows are blank
        let code = render_code128("987", 2, 10).unwrap();
        let mut canvas = GrayImage::from_pixel(code.width(), 60, Luma([255]));
        imageops::replace(&mut canvas, &code, 0, 45);
        let decoder = Code128Decoder::new().with_scanlines(30);
        assert_eq!(decoder.decode_luma(&canvas).as_deref(), Some("987"));
    }

    #[test]
    fn test_scan_rows_center_first() {
        let rows = scan_rows(100, 3);
        assert_eq!(rows, vec![50, 25, 75]);
        assert_eq!(scan_rows(2, 10).len(), 2);
    }

    proptest! {
        #[test]
        fn prop_printable_text_decodes(text in "[ -~]{1,16}", module in 1u32..4) {
            let img = render_code128(&text, module, 12).unwrap();
            prop_assert_eq!(Code128Decoder::new().decode_luma(&img), Some(text));
        }
    }
}
