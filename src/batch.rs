//! Directory processing.
//!
//! Every PDF in the input directory goes through its own pipeline. Documents
//! run on a rayon pool and report back over a bounded channel; the calling
//! thread writes one `<stem>.json` per readable document. A document that
//! fails is reported and skipped, never aborting the batch.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::OutlineDocument;
use crate::parser::ExtractOptions;
use crate::render::{self, JsonFormat};
use crate::OutlineExtractor;

/// Outcomes in flight between workers and the writer.
const CHANNEL_CAPACITY: usize = 16;

/// Result of processing one input file.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Input PDF
    pub input: PathBuf,
    /// JSON file written, or the reason the document was skipped
    pub result: Result<PathBuf>,
    /// Number of outline entries (0 when skipped)
    pub headings: usize,
    /// Wall time spent on the document
    pub elapsed: Duration,
}

impl DocumentOutcome {
    /// Whether an output file was written.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written
    pub succeeded: Vec<PathBuf>,
    /// Skipped inputs and why
    pub failed: Vec<(PathBuf, String)>,
    /// Total wall time
    pub elapsed: Duration,
}

impl BatchReport {
    /// Number of inputs processed.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Find `*.pdf` files (any extension case) directly inside a directory, sorted by name.
pub fn discover_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "input directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for an input PDF: `<output>/<stem>.json`.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{}.json", stem))
}

/// Process every PDF in `input` and write outlines to `output`.
///
/// `on_outcome` is called on the calling thread once per document, in
/// completion order. Only an unreadable input directory or an output
/// directory that cannot be created fail the whole batch.
pub fn process_directory<I, O, F>(
    input: I,
    output: O,
    options: &ExtractOptions,
    mut on_outcome: F,
) -> Result<BatchReport>
where
    I: AsRef<Path>,
    O: AsRef<Path>,
    F: FnMut(&DocumentOutcome),
{
    let start = Instant::now();
    let (input, output) = (input.as_ref(), output.as_ref());

    let files = discover_pdfs(input)?;
    std::fs::create_dir_all(output)?;
    log::info!("Processing {} PDF files from {}", files.len(), input.display());

    let extractor = OutlineExtractor::with_options(options.clone());
    let mut report = BatchReport::default();
    let (tx, rx) = bounded::<(PathBuf, Result<OutlineDocument>, Instant)>(CHANNEL_CAPACITY);

    std::thread::scope(|scope| {
        let extractor = &extractor;
        let files = &files;
        scope.spawn(move || {
            if options.parallel {
                files
                    .par_iter()
                    .for_each_with(tx, |tx, path| run_document(extractor, path, tx));
            } else {
                for path in files {
                    run_document(extractor, path, &tx);
                }
            }
        });

        for (path, result, started) in rx {
            let mut headings = 0;
            let result = result.and_then(|outline| {
                headings = outline.outline.len();
                let target = output_path(&path, output);
                render::write_json(&outline, &target, JsonFormat::Pretty)?;
                Ok(target)
            });

            match &result {
                Ok(target) => report.succeeded.push(target.clone()),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    report.failed.push((path.clone(), e.to_string()));
                }
            }

            let outcome = DocumentOutcome {
                input: path,
                result,
                headings,
                elapsed: started.elapsed(),
            };
            on_outcome(&outcome);
        }
    });

    report.succeeded.sort();
    report.failed.sort();
    report.elapsed = start.elapsed();
    log::info!(
        "Batch finished: {} written, {} skipped in {:.2?}",
        report.succeeded.len(),
        report.failed.len(),
        report.elapsed
    );
    Ok(report)
}

type OutcomeSender = Sender<(PathBuf, Result<OutlineDocument>, Instant)>;

fn run_document(extractor: &OutlineExtractor, path: &Path, tx: &OutcomeSender) {
    let started = Instant::now();

    // Malformed files can panic inside the PDF parser; contain it to this document.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| extractor.extract_file(path)))
        .unwrap_or_else(|_| Err(Error::PdfParse("parser panicked on malformed input".to_string())));

    // The receiver only disconnects once the writer is gone, so nothing is left to report to.
    let _ = tx.send((path.to_path_buf(), result, started));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_pdfs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let files = discover_pdfs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_missing_input_dir_is_batch_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = process_directory(&missing, dir.path().join("out"), &ExtractOptions::default(), |_| {});
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/in/report.final.pdf"), Path::new("/out"));
        assert_eq!(path, PathBuf::from("/out/report.final.json"));
    }

    #[test]
    fn test_unreadable_documents_are_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("broken.pdf"), b"%PDF-1.4\n garbage").unwrap();
        std::fs::write(input.path().join("html.pdf"), b"<html></html>").unwrap();

        let mut seen = 0;
        let report = process_directory(
            input.path(),
            output.path(),
            &ExtractOptions::default().sequential(),
            |outcome| {
                seen += 1;
                assert!(!outcome.is_success());
            },
        )
        .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(report.failed.len(), 2);
        assert!(report.succeeded.is_empty());
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }
}
