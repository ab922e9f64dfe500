//! Content stream interpretation: turns text-showing operators into positioned runs.
//!
//! Only the operators that affect text placement are tracked. Glyph widths are
//! not read from font programs; run widths are estimated from the character
//! count, which is accurate enough for line grouping and gap detection.

use lopdf::content::Operation;
use lopdf::Object;

use crate::model::{BBox, RawRun};

/// Fraction of the font size used as an average glyph advance.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// TJ adjustments beyond this (in thousandths of an em) are treated as word spaces.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A 2D affine matrix `[a b c d e f]` as used by PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other` in PDF row-vector convention.
    fn multiply(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    /// Length of the transformed unit vertical vector.
    fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        let [a, b, _, _, _, _] = self.0;
        (a * a + b * b).sqrt()
    }
}

/// Graphics and text state while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    render_mode: i64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            render_mode: 0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, text_space_units: f32) {
        self.text_matrix = Matrix::translation(text_space_units, 0.0).multiply(&self.text_matrix);
    }
}

/// Page geometry needed to flip PDF user space into top-down coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageFrame {
    pub origin_x: f32,
    pub origin_y: f32,
    pub height: f32,
}

/// Walks content stream operations and emits runs in top-down page coordinates.
pub(crate) struct RunExtractor<'f> {
    frame: PageFrame,
    resolve_font: &'f dyn Fn(&[u8]) -> String,
    decode: &'f dyn Fn(&[u8], &[u8]) -> String,
    state: TextState,
    stack: Vec<TextState>,
    in_text: bool,
    runs: Vec<RawRun>,
}

impl<'f> RunExtractor<'f> {
    /// Create an extractor.
    ///
    /// `resolve_font` maps a font resource name to its base font name and
    /// `decode` turns (font resource, string bytes) into text.
    pub fn new(
        frame: PageFrame,
        resolve_font: &'f dyn Fn(&[u8]) -> String,
        decode: &'f dyn Fn(&[u8], &[u8]) -> String,
    ) -> Self {
        Self {
            frame,
            resolve_font,
            decode,
            state: TextState::default(),
            stack: Vec::new(),
            in_text: false,
            runs: Vec::new(),
        }
    }

    /// Interpret all operations and return the collected runs.
    pub fn run(mut self, operations: &[Operation]) -> Vec<RawRun> {
        for op in operations {
            self.apply(op);
        }
        self.runs
    }

    fn apply(&mut self, op: &Operation) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_from(operands) {
                    self.state.ctm = m.multiply(&self.state.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.state.text_matrix = Matrix::IDENTITY;
                self.state.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        self.state.font_name = (self.resolve_font)(name);
                        self.state.font_resource = name.clone();
                    }
                    self.state.font_size = number(&operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.state.leading = leading;
                }
            }
            "Tr" => {
                if let Some(mode) = operands.first().and_then(number) {
                    self.state.render_mode = mode as i64;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    self.state.move_line(tx, ty);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    self.state.leading = -ty;
                    self.state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_from(operands) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "T*" => self.state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode_bytes(bytes);
                    self.show(text, 0.0);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode_bytes(bytes);
                    self.show(text, 0.0);
                }
            }
            "\"" => {
                self.state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode_bytes(bytes);
                    self.show(text, 0.0);
                }
            }
            _ => {}
        }
    }

    fn decode_bytes(&self, bytes: &[u8]) -> String {
        (self.decode)(&self.state.font_resource, bytes)
    }

    /// Show a TJ array: strings interleaved with kerning adjustments.
    fn show_array(&mut self, items: &[Object]) {
        let mut combined = String::new();
        let mut kerning = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode_bytes(bytes)),
                other => {
                    if let Some(n) = number(other) {
                        kerning += n;
                        if -n > TJ_SPACE_THRESHOLD && needs_space(&combined) {
                            combined.push(' ');
                        }
                    }
                }
            }
        }
        self.show(combined, kerning);
    }

    fn show(&mut self, text: String, kerning: f32) {
        if !self.in_text {
            return;
        }

        let char_count = text.chars().count() as f32;
        let advance = char_count * self.state.font_size * AVG_CHAR_WIDTH
            - kerning / 1000.0 * self.state.font_size;

        if !text.trim().is_empty() {
            let rendering = self.state.text_matrix.multiply(&self.state.ctm);
            let (x, y) = rendering.origin();
            let size = self.state.font_size * rendering.vertical_scale();
            let width = advance.max(0.0) * rendering.horizontal_scale();

            let x = x - self.frame.origin_x;
            let baseline = self.frame.height - (y - self.frame.origin_y);
            let bbox = BBox::new(x, baseline - size * 0.8, x + width, baseline + size * 0.2);

            // Render mode 2 fills and strokes glyph outlines.
            let synthetic_bold = self.state.render_mode == 2;
            self.runs.push(
                RawRun::new(text, bbox, size, self.state.font_name.clone())
                    .with_synthetic_bold(synthetic_bold),
            );
        }

        self.state.advance(advance);
    }
}

/// Whether a word space should be appended after `text`.
fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c),
        None => false,
    }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut values = [0.0f32; 6];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(Matrix(values))
}

/// Helper to extract a number from a PDF object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        // Extensions B-F
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}
