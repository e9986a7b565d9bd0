//! Glyph-width measurement for the paged export.
//!
//! The PDF uses the standard Helvetica font, so widths come from its AFM
//! metrics (units of 1/1000 em) rather than from a rasterizer.

/// Measures the rendered width of a string.
pub trait TextMeasurer {
    /// Width of `text` at `size` points.
    fn width_of(&self, text: &str, size: f64) -> f64;
}

/// Helvetica advance widths for the printable ASCII range 0x20..=0x7E.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica advance widths for WinAnsi bytes 0x80..=0xFF. Bytes the
/// encoding leaves undefined (0x81, 0x8D, 0x8F, 0x90, 0x9D) are never emitted.
const HELVETICA_HIGH: [u16; 128] = [
    556, 556, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 556, 611, 556, // 0x80
    556, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 556, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

/// Standard Helvetica metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

impl Helvetica {
    /// Advance width of the glyph a WinAnsi byte selects.
    pub fn byte_width(byte: u8) -> u16 {
        match byte {
            0x20..=0x7E => HELVETICA_ASCII[usize::from(byte - 0x20)],
            0x80..=0xFF => HELVETICA_HIGH[usize::from(byte - 0x80)],
            _ => HELVETICA_ASCII[usize::from(b'?' - 0x20)],
        }
    }

    pub fn glyph_width(ch: char) -> u16 {
        Helvetica::byte_width(win_ansi_byte(ch))
    }
}

impl TextMeasurer for Helvetica {
    fn width_of(&self, text: &str, size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| u32::from(Helvetica::glyph_width(c))).sum();
        f64::from(units) * size / 1000.0
    }
}

/// WinAnsi bytes 0x80..=0x9F that stand for characters outside Latin-1.
fn win_ansi_extra(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Maps a character to the WinAnsi byte the PDF text will show.
///
/// Tabs become spaces; control characters (C0 and C1) and anything the
/// encoding cannot represent become `?`.
pub fn win_ansi_byte(ch: char) -> u8 {
    match ch as u32 {
        0x09 => b' ',
        0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
        _ => win_ansi_extra(ch).unwrap_or(b'?'),
    }
}

/// Encodes text as single-byte WinAnsi for a PDF string.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}
