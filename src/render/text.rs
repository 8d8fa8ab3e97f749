//! Text compositing: shaping seam, UI font contexts, and placement helpers.
//!
//! Glyph outlines and metrics come from an external shaping capability behind
//! [`TextShaper`]; this module is responsible only for compositing coverage
//! masks into the framebuffer at 4-bit granularity, clearing the destination
//! rectangle first so a previously drawn, wider string cannot ghost through.
//!
//! [`MonoShaper`] is the built-in raster implementation: a scaled 5×7 cell
//! font that keeps the appliance usable when no TTF shaping stack is wired in,
//! and gives tests deterministic metrics.

use crate::render::framebuffer::FrameBuffer;

/// UI contexts that select font weight and size. Exhaustive by design: every
/// caller names its context and every shaper must map all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontContext {
    /// Top status bar: compact.
    StatusBar,
    /// Standby banner on the idle screen.
    Idle,
    /// Recording indicator: large and bold.
    Recording,
    /// Menu rows.
    Menu,
    /// The selected menu row.
    Selected,
    /// Section headers.
    Header,
    /// Confirmation titles and warnings.
    Alert,
    /// Fine print: filenames, hints, metadata.
    Details,
    /// Large emphasis text.
    Emphasis,
}

impl FontContext {
    /// All contexts, for exhaustive mapping tests.
    pub const ALL: [Self; 9] = [
        Self::StatusBar,
        Self::Idle,
        Self::Recording,
        Self::Menu,
        Self::Selected,
        Self::Header,
        Self::Alert,
        Self::Details,
        Self::Emphasis,
    ];
}

/// Shaped text as an alpha coverage mask (0–255 per pixel), row-major.
#[derive(Debug, Clone)]
pub struct TextMask {
    /// Advance width in pixels.
    pub width: usize,
    /// Mask height in pixels.
    pub height: usize,
    /// Row-major coverage values.
    pub coverage: Vec<u8>,
}

/// External text-shaping capability.
pub trait TextShaper {
    /// Shape `text` for `ctx` into a coverage mask.
    fn shape(&mut self, text: &str, ctx: FontContext) -> TextMask;

    /// Advance width of `text` in pixels, without producing a mask.
    fn measure(&mut self, text: &str, ctx: FontContext) -> usize;

    /// Row height (including leading) for `ctx`.
    fn line_height(&self, ctx: FontContext) -> usize;
}

/// Composite a mask with its *baseline* at `y` (mask bottom sits on `y`),
/// clearing the destination rectangle first.
pub fn composite(fb: &mut FrameBuffer, x: i32, y: i32, mask: &TextMask) {
    let top = y - mask.height as i32;
    fb.clear_rect(x, top, mask.width as i32, mask.height as i32);
    for row in 0..mask.height {
        for col in 0..mask.width {
            let alpha = mask.coverage[row * mask.width + col];
            if alpha > 0 {
                fb.set_pixel(x + col as i32, top + row as i32, (alpha / 17).min(15));
            }
        }
    }
}

/// Draw `text` with its baseline at `y`, left edge at `x`.
pub fn draw(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, x: i32, y: i32, text: &str, ctx: FontContext) {
    let mask = shaper.shape(text, ctx);
    composite(fb, x, y, &mask);
}

/// Draw `text` horizontally centered on the panel, baseline at `y`.
pub fn draw_centered(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, text: &str, ctx: FontContext, y: i32) {
    let width = shaper.measure(text, ctx) as i32;
    let x = ((crate::render::framebuffer::PANEL_WIDTH as i32 - width) / 2).max(0);
    draw(fb, shaper, x, y, text, ctx);
}

/// Draw `text` right-aligned against the panel edge minus `right_margin`.
pub fn draw_right(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    text: &str,
    ctx: FontContext,
    y: i32,
    right_margin: i32,
) {
    let width = shaper.measure(text, ctx) as i32;
    let x = (crate::render::framebuffer::PANEL_WIDTH as i32 - width - right_margin).max(0);
    draw(fb, shaper, x, y, text, ctx);
}

/// Shorten `text` with a trailing ellipsis until it fits in `max_width`.
pub fn ellipsize(shaper: &mut dyn TextShaper, text: &str, ctx: FontContext, max_width: usize) -> String {
    if shaper.measure(text, ctx) <= max_width {
        return text.to_string();
    }
    let mut shortened: String = text.to_string();
    while !shortened.is_empty() {
        shortened.pop();
        let candidate = format!("{shortened}...");
        if shaper.measure(&candidate, ctx) <= max_width {
            return candidate;
        }
    }
    String::new()
}

// ──────────────────── built-in 5×7 shaper ────────────────────

/// Glyph cell geometry: 5 columns + 1 column of spacing, 7 rows.
const GLYPH_COLS: usize = 5;
const GLYPH_ADVANCE: usize = 6;
const GLYPH_ROWS: usize = 7;

/// Built-in raster shaper over a 5×7 cell font, integer-scaled per context.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonoShaper;

impl MonoShaper {
    /// Integer scale factor per context (1 = 5×7 cells, 2 = 10×14).
    #[must_use]
    pub const fn scale(ctx: FontContext) -> usize {
        match ctx {
            FontContext::StatusBar
            | FontContext::Menu
            | FontContext::Selected
            | FontContext::Details => 1,
            FontContext::Idle
            | FontContext::Recording
            | FontContext::Header
            | FontContext::Alert
            | FontContext::Emphasis => 2,
        }
    }

    fn columns(c: char) -> [u8; GLYPH_COLS] {
        let index = c as usize;
        if (0x20..=0x7E).contains(&index) {
            FONT_5X7[index - 0x20]
        } else {
            // Unknown glyph: solid block.
            [0x7F; GLYPH_COLS]
        }
    }
}

impl TextShaper for MonoShaper {
    fn shape(&mut self, text: &str, ctx: FontContext) -> TextMask {
        let scale = Self::scale(ctx);
        let chars: Vec<char> = text.chars().collect();
        let width = chars.len() * GLYPH_ADVANCE * scale;
        let height = GLYPH_ROWS * scale;
        let mut coverage = vec![0u8; width * height];

        for (i, &c) in chars.iter().enumerate() {
            let columns = Self::columns(c);
            let origin = i * GLYPH_ADVANCE * scale;
            for (col, bits) in columns.iter().enumerate() {
                for row in 0..GLYPH_ROWS {
                    if bits & (1 << row) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let x = origin + col * scale + sx;
                            let y = row * scale + sy;
                            coverage[y * width + x] = 255;
                        }
                    }
                }
            }
        }

        TextMask {
            width,
            height,
            coverage,
        }
    }

    fn measure(&mut self, text: &str, ctx: FontContext) -> usize {
        text.chars().count() * GLYPH_ADVANCE * Self::scale(ctx)
    }

    fn line_height(&self, ctx: FontContext) -> usize {
        GLYPH_ROWS * Self::scale(ctx) + 2
    }
}

/// Printable-ASCII 5×7 font, column-major, bit 0 = top row.
#[rustfmt::skip]
const FONT_5X7: [[u8; GLYPH_COLS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x14, 0x08, 0x3E, 0x08, 0x14], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x10, 0x08, 0x08, 0x10, 0x08], // '~'
];
