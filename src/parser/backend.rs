//! PDF backend abstraction layer.
//!
//! The heading engine only needs, per page, an ordered list of text runs with
//! geometry and font metadata. [`PdfBackend`] is that boundary; [`LopdfBackend`]
//! implements it on top of lopdf.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::content::{number, PageFrame, RunExtractor};
use crate::error::{Error, Result};
use crate::model::PageRuns;

/// PDF magic bytes.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Letter size, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Abstract source of positioned text runs.
pub trait PdfBackend {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text runs of one page (0-based index), in content-stream order.
    fn page_runs(&self, index: usize) -> Result<PageRuns>;
}

/// Check that data starts with a PDF header, allowing leading junk bytes.
///
/// Viewers accept a header within the first kilobyte, so this does too.
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(1024)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with byte order mark
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        if !has_pdf_header(data) {
            return Err(Error::UnknownFormat);
        }

        // Documents that need a password fail here with a decryption error.
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            log::debug!("Document is encrypted with an empty user password");
        }

        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| Error::MissingObject(format!("page {}", index)))
    }

    /// Find a page attribute, following the Parent chain for inherited keys.
    fn inherited<'a>(&'a self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut dict = page;
        for _ in 0..32 {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn media_box(&self, page: &Dictionary) -> [f32; 4] {
        let values: Option<Vec<f32>> = self
            .inherited(page, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| number(self.resolve(o))).collect());

        match values.as_deref() {
            Some(&[x0, y0, x1, y1, ..]) if (x1 - x0).abs() > 1.0 && (y1 - y0).abs() > 1.0 => {
                [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
            }
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    /// Get the decompressed page content stream.
    fn page_content(&self, page: &Dictionary) -> Result<Vec<u8>> {
        let contents = match page.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        let stream_data = |obj: &Object| -> Option<Vec<u8>> {
            match self.resolve(obj) {
                Object::Stream(s) => s.decompressed_content().ok().or_else(|| Some(s.content.clone())),
                _ => None,
            }
        };

        match self.resolve(contents) {
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(data) = stream_data(obj) {
                        content.extend_from_slice(&data);
                        content.push(b'\n');
                    }
                }
                Ok(content)
            }
            Object::Stream(_) => {
                stream_data(contents).ok_or_else(|| Error::PdfParse("Invalid content stream".to_string()))
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_runs(&self, index: usize) -> Result<PageRuns> {
        let page_id = self.page_id(index)?;
        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let [x0, y0, x1, y1] = self.media_box(page);
        let mut page_runs = PageRuns::new(index, x1 - x0, y1 - y0);

        let data = self.page_content(page)?;
        if data.is_empty() {
            return Ok(page_runs);
        }

        let content =
            lopdf::content::Content::decode(&data).map_err(|e| Error::PdfParse(e.to_string()))?;

        let fonts: BTreeMap<Vec<u8>, &Dictionary> = self.doc.get_page_fonts(page_id).unwrap_or_default();

        let resolve_font = |name: &[u8]| -> String {
            fonts
                .get(name)
                .and_then(|f| f.get(b"BaseFont").ok())
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| String::from_utf8_lossy(name).to_string())
        };

        let decode = |font: &[u8], bytes: &[u8]| -> String {
            if let Some(font_dict) = fonts.get(font) {
                if let Ok(encoding) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                        return text;
                    }
                }
            }
            decode_text_simple(bytes)
        };

        let frame = PageFrame {
            origin_x: x0,
            origin_y: y0,
            height: y1 - y0,
        };
        page_runs.runs = RunExtractor::new(frame, &resolve_font, &decode).run(&content.operations);

        log::debug!("Page {}: {} text runs", index, page_runs.runs.len());
        Ok(page_runs)
    }
}

/// Read every selected page, honouring the error mode.
pub fn read_pages(
    backend: &dyn PdfBackend,
    options: &super::ExtractOptions,
) -> Result<Vec<PageRuns>> {
    let mut pages = Vec::with_capacity(backend.page_count());
    for index in 0..backend.page_count() {
        if !options.includes_page(index) {
            break;
        }
        match backend.page_runs(index) {
            Ok(page) => pages.push(page),
            Err(e) => {
                if options.error_mode == super::ErrorMode::Strict {
                    return Err(e);
                }
                log::warn!("Failed to extract text from page {}: {}", index, e);
                pages.push(PageRuns::letter(index));
            }
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, RawRun};
    use crate::parser::{ErrorMode, ExtractOptions};

    struct FlakyBackend;

    impl PdfBackend for FlakyBackend {
        fn page_count(&self) -> usize {
            3
        }

        fn page_runs(&self, index: usize) -> Result<PageRuns> {
            if index == 1 {
                return Err(Error::PdfParse("bad stream".into()));
            }
            let mut page = PageRuns::letter(index);
            page.push(RawRun::new("text", BBox::new(0.0, 0.0, 20.0, 10.0), 10.0, "Helvetica"));
            Ok(page)
        }
    }

    #[test]
    fn test_has_pdf_header() {
        assert!(has_pdf_header(b"%PDF-1.7\n%test"));
        assert!(has_pdf_header(b"\r\n  %PDF-1.4\n"));
        assert!(!has_pdf_header(b"<!DOCTYPE html>"));
        assert!(!has_pdf_header(b""));
    }

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_load_rejects_non_pdf() {
        let result = LopdfBackend::load_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_load_rejects_truncated_pdf() {
        let result = LopdfBackend::load_bytes(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(result.is_err());
    }

    #[test]
    fn test_read_pages_lenient_skips_bad_page() {
        let pages = read_pages(&FlakyBackend, &ExtractOptions::new().lenient()).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_empty());
        assert_eq!(pages[2].runs.len(), 1);
    }

    #[test]
    fn test_read_pages_strict_fails() {
        let options = ExtractOptions::new().with_error_mode(ErrorMode::Strict);
        assert!(read_pages(&FlakyBackend, &options).is_err());
    }

    #[test]
    fn test_read_pages_respects_page_limit() {
        let pages = read_pages(&FlakyBackend, &ExtractOptions::new().with_max_pages(1)).unwrap();
        assert_eq!(pages.len(), 1);
    }
}
