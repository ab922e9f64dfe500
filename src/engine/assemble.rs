//! Outline assembly: ordering, continuation merging, title selection, dedup.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::language::LanguageRules;
use super::Thresholds;
use crate::model::{
    AssignedLevel, BBox, HeadingCandidate, HeadingLevel, OutlineDocument, OutlineEntry,
    StyleSignature, TextBlock,
};
use crate::parser::is_spaceless_script_char;

/// An accepted heading, possibly spanning several wrapped lines.
#[derive(Debug, Clone)]
struct Pending {
    level: AssignedLevel,
    rank: usize,
    text: String,
    page: usize,
    bbox: BBox,
    signature: StyleSignature,
    font_size: f32,
    title_style: bool,
}

impl Pending {
    fn from_block(
        candidate: &HeadingCandidate,
        block: &TextBlock,
        first_page: usize,
        top_style: Option<StyleSignature>,
    ) -> Self {
        let signature = block.signature();
        Self {
            level: candidate.level,
            rank: candidate.rank,
            text: block.text.clone(),
            page: block.page,
            bbox: block.bbox,
            signature,
            font_size: block.font_size,
            title_style: block.page == first_page && top_style == Some(signature),
        }
    }

    /// Title lines, or the top style on the first page, may wrap freely.
    fn is_title_like(&self) -> bool {
        matches!(self.level, AssignedLevel::Title) || self.title_style
    }

    fn append(&mut self, block: &TextBlock) {
        let joins_tightly = match (self.text.chars().last(), block.text.chars().next()) {
            (Some(a), Some(b)) => is_spaceless_script_char(a) && is_spaceless_script_char(b),
            _ => true,
        };
        if self.text.ends_with('-') && !self.text.ends_with(" -") {
            self.text.pop();
        } else if !joins_tightly {
            self.text.push(' ');
        }
        self.text.push_str(&block.text);
        self.bbox = self.bbox.union(&block.bbox);
    }
}

/// Order accepted candidates by page, then vertical, then horizontal position.
fn ordered<'a>(candidates: &'a [HeadingCandidate], blocks: &[TextBlock]) -> Vec<&'a HeadingCandidate> {
    let mut accepted: Vec<&HeadingCandidate> = candidates
        .iter()
        .filter(|c| c.level.is_accepted() && c.block < blocks.len())
        .collect();
    accepted.sort_by(|a, b| {
        let (ba, bb) = (&blocks[a.block], &blocks[b.block]);
        ba.page
            .cmp(&bb.page)
            .then_with(|| ba.bbox.y0.partial_cmp(&bb.bbox.y0).unwrap_or(Ordering::Equal))
            .then_with(|| ba.bbox.x0.partial_cmp(&bb.bbox.x0).unwrap_or(Ordering::Equal))
            .then_with(|| a.block.cmp(&b.block))
    });
    accepted
}

/// Whether `next` continues the heading in `last` on the following line.
fn continues(
    last: &Pending,
    candidate: &HeadingCandidate,
    next: &TextBlock,
    rules: &LanguageRules,
    thresholds: &Thresholds,
) -> bool {
    if last.page != next.page || last.signature != next.signature() {
        return false;
    }
    let same_level = last.level == candidate.level;
    let title_tail = matches!(last.level, AssignedLevel::Title);
    if !same_level && !title_tail {
        return false;
    }
    if rules.has_numbering(&next.text) {
        return false;
    }

    let size = last.font_size.max(next.font_size);
    let gap = next.bbox.y0 - last.bbox.y1;
    if gap < -0.5 * size || gap > thresholds.continuation_gap_ratio * size {
        return false;
    }
    let overlaps = next.bbox.x0 < last.bbox.x1 && last.bbox.x0 < next.bbox.x1;
    if !overlaps {
        return false;
    }

    if last.is_title_like() {
        return true;
    }

    // Stacked headings look exactly like a wrapped one, so ordinary headings
    // only join when the text itself reads as unfinished.
    let starts_lower = next.text.chars().next().map_or(false, char::is_lowercase);
    let dangling = last.text.ends_with([',', '-', '&', '/'])
        || last
            .text
            .split_whitespace()
            .last()
            .map_or(false, |w| rules.is_stop_word(&w.to_lowercase()));
    starts_lower || dangling
}

/// Build the final title and outline from assigned candidates.
///
/// `top_style` is the most prominent candidate signature of the document.
pub fn assemble(
    blocks: &[TextBlock],
    candidates: &[HeadingCandidate],
    top_style: Option<StyleSignature>,
    rules: &LanguageRules,
    thresholds: &Thresholds,
) -> OutlineDocument {
    let Some(first_page) = blocks.iter().map(|b| b.page).min() else {
        return OutlineDocument::empty();
    };

    let mut pending: Vec<Pending> = Vec::new();
    for candidate in ordered(candidates, blocks) {
        let block = &blocks[candidate.block];
        match pending.last_mut() {
            Some(last) if continues(last, candidate, block, rules, thresholds) => last.append(block),
            _ => pending.push(Pending::from_block(candidate, block, first_page, top_style)),
        }
    }

    // Title: a designated title line, else the first unnumbered H1.
    let title_index = pending
        .iter()
        .enumerate()
        .filter(|(_, p)| p.level == AssignedLevel::Title)
        .min_by_key(|(i, p)| (p.rank, *i))
        .map(|(i, _)| i)
        .or_else(|| {
            pending
                .iter()
                .position(|p| {
                    p.level == AssignedLevel::Heading(HeadingLevel::H1) && !rules.has_numbering(&p.text)
                })
        });
    let title = title_index
        .map(|i| pending[i].text.clone())
        .unwrap_or_default();

    let mut seen: HashSet<(HeadingLevel, &str, usize)> = HashSet::new();
    let mut outline = Vec::new();
    for (i, p) in pending.iter().enumerate() {
        if Some(i) == title_index {
            continue;
        }
        let level = match p.level {
            AssignedLevel::Heading(level) => level,
            // Extra title lines that did not merge are top-level headings.
            AssignedLevel::Title => HeadingLevel::H1,
            AssignedLevel::None => continue,
        };
        if level == HeadingLevel::H1 && !title.is_empty() && p.text == title {
            continue;
        }
        if !seen.insert((level, p.text.as_str(), p.page)) {
            continue;
        }
        outline.push(OutlineEntry::new(level, p.text.clone(), p.page));
    }

    log::debug!(
        "Assembled outline: title={:?}, {} entries",
        title,
        outline.len()
    );
    OutlineDocument { title, outline }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::language::RuleRegistry;

    fn block(page: usize, y: f32, x: f32, text: &str, size: f32) -> TextBlock {
        TextBlock {
            page,
            bbox: BBox::new(x, y, x + 200.0, y + size),
            text: text.to_string(),
            font_size: size,
            is_bold: true,
            font_family: 0,
        }
    }

    fn heading(block: usize, level: HeadingLevel, rank: usize) -> HeadingCandidate {
        HeadingCandidate::new(block, AssignedLevel::Heading(level), rank)
    }

    fn run_with_top(
        blocks: &[TextBlock],
        candidates: &[HeadingCandidate],
        top_style: Option<StyleSignature>,
    ) -> OutlineDocument {
        let registry = RuleRegistry::builtin();
        assemble(blocks, candidates, top_style, registry.get("en"), &Thresholds::default())
    }

    /// The style of the first rank-0 candidate is the top style.
    fn run(blocks: &[TextBlock], candidates: &[HeadingCandidate]) -> OutlineDocument {
        let top_style = candidates
            .iter()
            .find(|c| c.rank == 0)
            .map(|c| blocks[c.block].signature());
        run_with_top(blocks, candidates, top_style)
    }

    #[test]
    fn test_empty() {
        assert_eq!(run(&[], &[]), OutlineDocument::empty());
    }

    #[test]
    fn test_orders_by_page_then_position() {
        let blocks = vec![
            block(1, 300.0, 72.0, "Later", 14.0),
            block(0, 500.0, 72.0, "Second", 14.0),
            block(0, 100.0, 72.0, "Document Title", 20.0),
            block(0, 200.0, 72.0, "First", 14.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H2, 1),
            heading(1, HeadingLevel::H2, 1),
            heading(2, HeadingLevel::H1, 0),
            heading(3, HeadingLevel::H2, 1),
        ];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "Document Title");
        let texts: Vec<_> = doc.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second", "Later"]);
    }

    #[test]
    fn test_title_not_repeated_as_h1() {
        let blocks = vec![
            block(0, 100.0, 72.0, "Annual Report", 20.0),
            block(3, 100.0, 72.0, "Annual Report", 20.0),
            block(3, 200.0, 72.0, "Summary", 20.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 0),
            heading(1, HeadingLevel::H1, 0),
            heading(2, HeadingLevel::H1, 0),
        ];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "Annual Report");
        assert_eq!(doc.outline, vec![OutlineEntry::new(HeadingLevel::H1, "Summary", 3)]);
    }

    #[test]
    fn test_designated_title_wins() {
        let blocks = vec![
            block(0, 50.0, 72.0, "Welcome", 16.0),
            block(0, 100.0, 72.0, "BIG EVENT", 30.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 1),
            HeadingCandidate::new(1, AssignedLevel::Title, 0),
        ];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "BIG EVENT");
        assert_eq!(doc.outline, vec![OutlineEntry::new(HeadingLevel::H1, "Welcome", 0)]);
    }

    #[test]
    fn test_wrapped_title_is_joined() {
        let blocks = vec![
            block(0, 100.0, 72.0, "Request for Proposal to Present a", 20.0),
            block(0, 124.0, 72.0, "Business Plan", 20.0),
            block(0, 300.0, 72.0, "Summary", 14.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 0),
            heading(1, HeadingLevel::H1, 0),
            heading(2, HeadingLevel::H2, 1),
        ];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "Request for Proposal to Present a Business Plan");
        assert_eq!(doc.outline.len(), 1);
    }

    #[test]
    fn test_stacked_headings_stay_separate() {
        let blocks = vec![
            block(2, 100.0, 72.0, "Goals", 14.0),
            block(2, 118.0, 72.0, "Methods", 14.0),
            block(2, 200.0, 72.0, "Results of the", 14.0),
            block(2, 218.0, 72.0, "Pilot Study", 14.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H2, 1),
            heading(1, HeadingLevel::H2, 1),
            heading(2, HeadingLevel::H2, 1),
            heading(3, HeadingLevel::H2, 1),
        ];
        let doc = run(&blocks, &candidates);
        let texts: Vec<_> = doc.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Goals", "Methods", "Results of the Pilot Study"]);
    }

    #[test]
    fn test_numbered_line_never_continues() {
        let blocks = vec![
            block(1, 100.0, 72.0, "1. Scope of", 14.0),
            block(1, 118.0, 72.0, "2. Terms", 14.0),
        ];
        let candidates = vec![heading(0, HeadingLevel::H1, 0), heading(1, HeadingLevel::H1, 0)];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "");
        assert_eq!(
            doc.outline,
            vec![
                OutlineEntry::new(HeadingLevel::H1, "1. Scope of", 1),
                OutlineEntry::new(HeadingLevel::H1, "2. Terms", 1),
            ]
        );
    }

    #[test]
    fn test_numbered_h1_is_not_fallback_title() {
        let blocks = vec![
            block(0, 100.0, 72.0, "1. Overview", 12.0),
            block(0, 300.0, 72.0, "Product Notes", 12.0),
            block(1, 100.0, 72.0, "2. Design", 12.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 0),
            heading(1, HeadingLevel::H1, 0),
            heading(2, HeadingLevel::H1, 0),
        ];
        let doc = run(&blocks, &candidates);
        assert_eq!(doc.title, "Product Notes");
        assert_eq!(
            doc.outline,
            vec![
                OutlineEntry::new(HeadingLevel::H1, "1. Overview", 0),
                OutlineEntry::new(HeadingLevel::H1, "2. Design", 1),
            ]
        );
    }

    #[test]
    fn test_top_level_section_does_not_absorb_next_line() {
        // Numbering depth 0 under a larger title style.
        let blocks = vec![
            block(0, 40.0, 72.0, "Field Manual", 20.0),
            block(0, 100.0, 72.0, "1. Scope", 14.0),
            block(0, 118.0, 72.0, "Background", 14.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 0),
            heading(1, HeadingLevel::H1, 0),
            heading(2, HeadingLevel::H1, 1),
        ];
        let top = Some(StyleSignature::new(20.0, true));
        let doc = run_with_top(&blocks, &candidates, top);
        assert_eq!(doc.title, "Field Manual");
        let texts: Vec<_> = doc.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["1. Scope", "Background"]);
    }

    #[test]
    fn test_exact_duplicates_removed() {
        let blocks = vec![
            block(0, 100.0, 72.0, "Title", 20.0),
            block(1, 100.0, 72.0, "Notes", 14.0),
            block(1, 400.0, 72.0, "Appendix", 14.0),
            block(1, 600.0, 72.0, "Notes", 14.0),
        ];
        let candidates = vec![
            heading(0, HeadingLevel::H1, 0),
            heading(1, HeadingLevel::H2, 1),
            heading(2, HeadingLevel::H2, 1),
            heading(3, HeadingLevel::H2, 1),
        ];
        let doc = run(&blocks, &candidates);
        let texts: Vec<_> = doc.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Notes", "Appendix"]);
    }

    #[test]
    fn test_rejected_candidates_ignored() {
        let blocks = vec![block(0, 100.0, 72.0, "Body", 10.0)];
        let doc = run(&blocks, &[HeadingCandidate::rejected(0)]);
        assert!(doc.is_empty());
    }
}
