use pdf_writer::{Name, Pdf, Ref};

/// The three base-14 faces the reports draw with. None of them are embedded;
/// every conforming viewer ships the metrics below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"Helvetica",
            FontStyle::Bold => b"Helvetica-Bold",
            FontStyle::Italic => b"Helvetica-Oblique",
        }
    }

    /// Advance width of a WinAnsi byte at 1000 units/em.
    fn advance_1000(self, byte: u8) -> f32 {
        let table = match self {
            FontStyle::Bold => &HELVETICA_BOLD_ASCII,
            // Oblique shares the upright metrics.
            FontStyle::Regular | FontStyle::Italic => &HELVETICA_ASCII,
        };
        match byte {
            32..=126 => table[(byte - 32) as usize] as f32,
            0x85 | 0x89 | 0x97 | 0x99 => 1000.0, // ellipsis, per mille, em dash, trademark
            0x91 | 0x92 => 222.0,
            0x93 | 0x94 => 333.0,
            0x95 => 350.0,
            0x96 => 556.0,
            0xA0 => 278.0,
            0xB0 => 400.0,
            _ => 556.0,
        }
    }

    /// Width of `text` in points when set at `font_size`.
    /// Characters outside WinAnsi are never drawn and take no space.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .filter_map(winansi_byte)
            .filter(|&b| b >= 32)
            .map(|b| self.advance_1000(b) * font_size / 1000.0)
            .sum()
    }
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0-9
    278, 278, 584, 584, 584, 556, 1015,                                             // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N-Z
    278, 278, 278, 469, 556, 333,                                                   // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n-z
    334, 260, 334, 584,                                                             // {..~
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    let bytes: Vec<u8> = s.chars().filter_map(winansi_byte).collect();
    let dropped = s.chars().count() - bytes.len();
    if dropped > 0 {
        log::debug!("winansi: dropped {dropped} unencodable char(s) from {s:?}");
    }
    bytes
}

fn winansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x0000..=0x007F => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Write the Type1 font dictionaries and return `(resource name, ref)` pairs
/// for the page resource dictionaries.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Vec<(&'static str, Ref)> {
    FontStyle::ALL
        .iter()
        .map(|&style| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(style.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            log::debug!(
                "register_font: {} as {}",
                String::from_utf8_lossy(style.base_font()),
                style.pdf_name()
            );
            (style.pdf_name(), font_ref)
        })
        .collect()
}
