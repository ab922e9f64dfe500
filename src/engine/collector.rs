//! Block collection: merges raw runs on the same visual line into text blocks.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use unicode_normalization::UnicodeNormalization;

use super::Thresholds;
use crate::model::{BBox, PageRuns, RawRun, TextBlock};
use crate::parser::is_spaceless_script_char;

/// Normalize block text: NFC, whitespace collapsed, trimmed.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collect text blocks from every page, in reading order.
///
/// Blocks never span pages. Font family ids are assigned document-wide in
/// order of first appearance.
pub fn collect_blocks(pages: &[PageRuns], thresholds: &Thresholds) -> Vec<TextBlock> {
    let mut families = FamilyRegistry::default();
    let mut blocks = Vec::new();

    for page in pages {
        let runs = sanitize_runs(page);
        if runs.is_empty() {
            continue;
        }

        for line in group_into_lines(runs, thresholds) {
            for segment in split_line(line, thresholds) {
                if let Some(block) = build_block(page.index, &segment, &mut families) {
                    blocks.push(block);
                }
            }
        }
    }

    log::debug!(
        "Collected {} blocks from {} pages ({} font families)",
        blocks.len(),
        pages.len(),
        families.ids.len()
    );
    blocks
}

#[derive(Default)]
struct FamilyRegistry {
    ids: BTreeMap<String, usize>,
}

impl FamilyRegistry {
    fn id(&mut self, family: String) -> usize {
        let next = self.ids.len();
        *self.ids.entry(family).or_insert(next)
    }
}

/// Drop empty runs and repair malformed geometry.
fn sanitize_runs(page: &PageRuns) -> Vec<RawRun> {
    let mut runs = Vec::with_capacity(page.runs.len());
    for run in &page.runs {
        if run.text.trim().is_empty() {
            continue;
        }
        if !run.bbox.is_finite() {
            log::debug!("Page {}: dropping run with non-finite geometry", page.index);
            continue;
        }

        let bbox = run.bbox.normalized();
        let font_size = if run.font_size.is_finite() && run.font_size > 0.0 {
            run.font_size
        } else if bbox.height() > 0.0 {
            bbox.height()
        } else {
            log::debug!("Page {}: dropping run without usable font size", page.index);
            continue;
        };

        runs.push(RawRun {
            bbox,
            font_size,
            ..run.clone()
        });
    }
    runs
}

/// Group runs into visual lines, top to bottom.
fn group_into_lines(mut runs: Vec<RawRun>, thresholds: &Thresholds) -> Vec<Vec<RawRun>> {
    runs.sort_by(|a, b| {
        a.bbox
            .y1
            .total_cmp(&b.bbox.y1)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<Vec<RawRun>> = Vec::new();
    let mut current: Vec<RawRun> = Vec::new();
    let mut baseline = 0.0f32;
    let mut line_size = 0.0f32;

    for run in runs {
        if current.is_empty() {
            baseline = run.bbox.y1;
            line_size = run.font_size;
            current.push(run);
            continue;
        }

        let tolerance = thresholds.line_tolerance_ratio * line_size.max(run.font_size);
        if (run.bbox.y1 - baseline).abs() <= tolerance {
            line_size = line_size.max(run.font_size);
            current.push(run);
        } else {
            lines.push(std::mem::take(&mut current));
            baseline = run.bbox.y1;
            line_size = run.font_size;
            current.push(run);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Split one line into horizontally contiguous segments of compatible size.
fn split_line(mut line: Vec<RawRun>, thresholds: &Thresholds) -> Vec<Vec<RawRun>> {
    line.sort_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));

    let mut segments: Vec<Vec<RawRun>> = Vec::new();
    for run in line {
        let joins = segments.last().and_then(|seg| seg.last()).map_or(false, |prev| {
            let gap = run.bbox.x0 - prev.bbox.x1;
            let size = prev.font_size.max(run.font_size);
            gap <= thresholds.max_gap_ratio * size
                && (prev.font_size - run.font_size).abs() <= thresholds.size_tolerance
        });

        match segments.last_mut() {
            Some(segment) if joins => segment.push(run),
            _ => segments.push(vec![run]),
        }
    }
    segments
}

/// Merge a segment of runs into a block.
fn build_block(page: usize, runs: &[RawRun], families: &mut FamilyRegistry) -> Option<TextBlock> {
    let first = runs.first()?;

    let mut text = String::new();
    let mut bbox: BBox = first.bbox;
    let mut prev: Option<&RawRun> = None;
    for run in runs {
        if let Some(prev) = prev {
            if needs_separator(prev, run) {
                text.push(' ');
            }
            bbox = bbox.union(&run.bbox);
        }
        text.push_str(&run.text);
        prev = Some(run);
    }

    let text = normalize_text(&text);
    if text.is_empty() {
        return None;
    }

    // Run-weighted style attributes
    let weight = |r: &RawRun| r.text.chars().filter(|c| !c.is_whitespace()).count().max(1) as f32;
    let total: f32 = runs.iter().map(weight).sum();
    let font_size = runs.iter().map(|r| r.font_size * weight(r)).sum::<f32>() / total;
    let bold: f32 = runs.iter().filter(|r| r.is_bold()).map(weight).sum();

    let dominant = runs
        .iter()
        .max_by(|a, b| weight(a).partial_cmp(&weight(b)).unwrap_or(Ordering::Equal))
        .unwrap_or(first);

    Some(TextBlock {
        page,
        bbox,
        text,
        font_size,
        is_bold: bold / total > 0.5,
        font_family: families.id(dominant.font_family()),
    })
}

/// Whether a space belongs between two adjacent runs.
fn needs_separator(prev: &RawRun, next: &RawRun) -> bool {
    let prev_last = prev.text.chars().last();
    let next_first = next.text.chars().next();
    let (Some(a), Some(b)) = (prev_last, next_first) else {
        return false;
    };
    if a.is_whitespace() || b.is_whitespace() {
        return false;
    }
    if is_spaceless_script_char(a) && is_spaceless_script_char(b) {
        return false;
    }

    let gap = next.bbox.x0 - prev.bbox.x1;
    gap > prev.font_size.min(next.font_size) * 0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32, size: f32, font: &str) -> RawRun {
        let width = text.chars().count() as f32 * size * 0.5;
        RawRun::new(text, BBox::new(x, y - size * 0.8, x + width, y + size * 0.2), size, font)
    }

    fn page(index: usize, runs: Vec<RawRun>) -> PageRuns {
        PageRuns {
            runs,
            ..PageRuns::letter(index)
        }
    }

    #[test]
    fn test_merges_runs_on_same_line() {
        let pages = vec![page(
            0,
            vec![
                run("Hello", 72.0, 100.0, 12.0, "Helvetica"),
                run("World", 72.0 + 30.0 + 4.0, 100.3, 12.0, "Helvetica"),
            ],
        )];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Hello World");
        assert_eq!(blocks[0].page, 0);
    }

    #[test]
    fn test_distant_runs_stay_separate() {
        let pages = vec![page(
            0,
            vec![
                run("Name", 72.0, 100.0, 10.0, "Helvetica"),
                run("Date", 400.0, 100.0, 10.0, "Helvetica"),
            ],
        )];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Name");
        assert_eq!(blocks[1].text, "Date");
    }

    #[test]
    fn test_reading_order_top_to_bottom_left_to_right() {
        let pages = vec![page(
            0,
            vec![
                run("Bottom", 72.0, 300.0, 10.0, "Helvetica"),
                run("Right", 400.0, 100.0, 10.0, "Helvetica"),
                run("Left", 72.0, 100.0, 10.0, "Helvetica"),
            ],
        )];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Left", "Right", "Bottom"]);
    }

    #[test]
    fn test_whitespace_runs_dropped_and_empty_page_ok() {
        let pages = vec![
            page(0, vec![run("   ", 72.0, 100.0, 10.0, "Helvetica")]),
            page(1, vec![]),
        ];
        assert!(collect_blocks(&pages, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_inverted_geometry_is_repaired() {
        let mut bad = run("Inverted", 72.0, 100.0, 10.0, "Helvetica");
        bad.bbox = BBox::new(bad.bbox.x1, bad.bbox.y1, bad.bbox.x0, bad.bbox.y0);
        let mut nan = run("Broken", 72.0, 200.0, 10.0, "Helvetica");
        nan.bbox.x0 = f32::NAN;

        let blocks = collect_blocks(&[page(0, vec![bad, nan])], &Thresholds::default());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].bbox.x0 <= blocks[0].bbox.x1);
        assert!(blocks[0].bbox.y0 <= blocks[0].bbox.y1);
    }

    #[test]
    fn test_weighted_size_and_boldness() {
        let pages = vec![page(
            0,
            vec![
                run("Important", 72.0, 100.0, 14.0, "Arial-Bold"),
                run("x", 72.0 + 63.0 + 2.0, 100.0, 13.5, "Arial"),
            ],
        )];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_bold);
        assert!(blocks[0].font_size > 13.9);
    }

    #[test]
    fn test_cjk_runs_join_without_space() {
        let pages = vec![page(
            0,
            vec![
                run("概要", 72.0, 100.0, 12.0, "MSMincho"),
                run("説明", 72.0 + 12.0 + 3.0, 100.0, 12.0, "MSMincho"),
            ],
        )];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        assert_eq!(blocks[0].text, "概要説明");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Cafe\u{0301}   menu \n"), "Café menu");
    }

    #[test]
    fn test_font_family_ids_are_shared_across_pages() {
        let pages = vec![
            page(0, vec![run("One", 72.0, 100.0, 10.0, "Times-Roman")]),
            page(1, vec![run("Two", 72.0, 100.0, 10.0, "Times-Bold")]),
            page(2, vec![run("Three", 72.0, 100.0, 10.0, "Courier")]),
        ];
        let blocks = collect_blocks(&pages, &Thresholds::default());
        assert_eq!(blocks[0].font_family, blocks[1].font_family);
        assert_ne!(blocks[0].font_family, blocks[2].font_family);
    }
}
