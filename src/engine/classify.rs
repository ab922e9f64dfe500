//! Document type classification from structural signals.
//!
//! Rules are checked in a fixed priority order (form, flyer, rfp, technical,
//! pathway) and the first match wins. Nothing here looks at file names.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::language::LanguageRules;
use super::patterns::StructuralPatterns;
use super::profile::StyleProfile;
use super::Thresholds;
use crate::model::{DocumentTypeTag, StyleSignature, TextBlock};

/// Words or fewer for a block to count as short.
const SHORT_BLOCK_WORDS: usize = 5;

/// Longest block considered for a stage-name group.
const STAGE_BLOCK_WORDS: usize = 6;

/// Short candidate blocks that share a leading stage word ("Step", "Phase").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageGroup {
    /// Lowercased stage word
    pub prefix: String,
    /// Boldness shared by the members
    pub bold: bool,
    /// Block indices of the members
    pub blocks: Vec<usize>,
    /// Distinct pages the members appear on
    pub pages: usize,
    /// Best style rank among the members
    pub rank: usize,
}

/// Whole-document signals used by the classifier and the heading policies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentSignals {
    pub block_count: usize,
    pub page_count: usize,
    pub short_block_ratio: f32,
    pub field_ratio: f32,
    pub sentence_ratio: f32,
    pub candidate_ratio: f32,
    pub body_blocks: usize,
    pub numbered_blocks: usize,
    pub numbered_pages: usize,
    pub numbered_depths: usize,
    pub numbered_style: Option<StyleSignature>,
    pub numbered_style_share: f32,
    pub admin_keywords: Vec<String>,
    pub stage_groups: Vec<StageGroup>,
}

impl DocumentSignals {
    /// Gather signals from a document's blocks.
    pub fn compute(
        blocks: &[TextBlock],
        profile: &StyleProfile,
        rules: &LanguageRules,
        patterns: &StructuralPatterns,
        thresholds: &Thresholds,
    ) -> Self {
        let mut signals = Self {
            block_count: blocks.len(),
            page_count: profile.page_count(),
            ..Self::default()
        };
        if blocks.is_empty() {
            return signals;
        }

        let total = blocks.len() as f32;
        let mut short = 0usize;
        let mut fields = 0usize;
        let mut sentences = 0usize;
        let mut candidates = 0usize;

        let mut numbered_styles: BTreeMap<StyleSignature, usize> = BTreeMap::new();
        let mut numbered_pages = BTreeSet::new();
        let mut numbered_depths = BTreeSet::new();

        for block in blocks {
            let sig = block.signature();
            if block.word_count() <= SHORT_BLOCK_WORDS {
                short += 1;
            }
            if patterns.is_field_label(&block.text) {
                fields += 1;
            }
            if patterns.is_sentence(&block.text) {
                sentences += 1;
            }
            if profile.body() == Some(sig) {
                signals.body_blocks += 1;
            }
            if !profile.is_candidate(&sig) {
                continue;
            }
            candidates += 1;

            if let Some(depth) = rules.numbering_depth(&block.text) {
                *numbered_styles.entry(sig).or_default() += 1;
                numbered_pages.insert(block.page);
                numbered_depths.insert(depth);
            }
        }

        signals.short_block_ratio = short as f32 / total;
        signals.field_ratio = fields as f32 / total;
        signals.sentence_ratio = sentences as f32 / total;
        signals.candidate_ratio = candidates as f32 / total;

        signals.numbered_blocks = numbered_styles.values().sum();
        signals.numbered_pages = numbered_pages.len();
        signals.numbered_depths = numbered_depths.len();
        if let Some((sig, count)) = numbered_styles.iter().max_by_key(|(sig, count)| (**count, **sig)) {
            signals.numbered_style = Some(*sig);
            signals.numbered_style_share = *count as f32 / signals.numbered_blocks as f32;
        }

        // Keywords are looked for where titles and headings live.
        let keyword_texts = blocks
            .iter()
            .filter(|b| b.page == 0 || profile.is_candidate(&b.signature()))
            .map(|b| b.text.as_str());
        signals.admin_keywords = rules.admin_keyword_hits(keyword_texts).into_iter().collect();

        signals.stage_groups = stage_groups(blocks, profile, rules, thresholds);
        signals
    }

    /// Pick the document type. The first matching rule wins.
    pub fn document_type(&self, profile: &StyleProfile, thresholds: &Thresholds) -> DocumentTypeTag {
        if self.block_count == 0 {
            return DocumentTypeTag::Plain;
        }
        if self.is_form(thresholds) {
            DocumentTypeTag::Form
        } else if self.is_flyer(profile, thresholds) {
            DocumentTypeTag::Flyer
        } else if self.is_rfp(thresholds) {
            DocumentTypeTag::Rfp
        } else if self.is_technical(thresholds) {
            DocumentTypeTag::Technical
        } else if !self.stage_groups.is_empty() {
            DocumentTypeTag::Pathway
        } else {
            DocumentTypeTag::Plain
        }
    }

    fn is_form(&self, t: &Thresholds) -> bool {
        self.block_count >= t.form_min_blocks
            && self.short_block_ratio >= t.form_short_block_ratio
            && self.field_ratio >= t.form_field_ratio
            && self.sentence_ratio <= t.form_sentence_ratio
    }

    fn is_flyer(&self, profile: &StyleProfile, t: &Thresholds) -> bool {
        profile.top_candidate().is_some()
            && self.page_count <= t.flyer_max_pages
            && self.body_blocks <= t.flyer_max_body_blocks
            && (profile.is_sparse() || self.candidate_ratio >= t.flyer_candidate_ratio)
    }

    fn has_numbering(&self, t: &Thresholds) -> bool {
        self.numbered_blocks >= t.numbered_min_blocks
            && (self.numbered_pages >= t.numbered_min_pages || self.numbered_depths >= 2)
            && self.numbered_style_share >= t.numbered_style_share
    }

    fn is_rfp(&self, t: &Thresholds) -> bool {
        self.admin_keywords.len() >= t.rfp_min_keywords && self.numbered_blocks > 0
    }

    fn is_technical(&self, t: &Thresholds) -> bool {
        self.has_numbering(t)
    }
}

/// Classify a document, returning the tag and the signals behind it.
pub fn classify(
    blocks: &[TextBlock],
    profile: &StyleProfile,
    rules: &LanguageRules,
    patterns: &StructuralPatterns,
    thresholds: &Thresholds,
) -> (DocumentTypeTag, DocumentSignals) {
    let signals = DocumentSignals::compute(blocks, profile, rules, patterns, thresholds);
    let tag = signals.document_type(profile, thresholds);
    log::debug!(
        "Document type: {} (fields={:.2}, candidates={:.2}, numbered={}, keywords={}, stage groups={})",
        tag,
        signals.field_ratio,
        signals.candidate_ratio,
        signals.numbered_blocks,
        signals.admin_keywords.len(),
        signals.stage_groups.len()
    );
    (tag, signals)
}

/// Leading stage word of a short block, digits and punctuation removed.
fn stage_prefix(text: &str, rules: &LanguageRules) -> Option<String> {
    let first = text.split_whitespace().next()?;
    let word: String = first
        .trim_end_matches(|c: char| !c.is_alphabetic())
        .to_lowercase();
    if word.chars().count() < 2 || !word.chars().all(char::is_alphabetic) {
        return None;
    }
    if rules.is_stop_word(&word) {
        return None;
    }
    Some(word)
}

fn stage_groups(
    blocks: &[TextBlock],
    profile: &StyleProfile,
    rules: &LanguageRules,
    thresholds: &Thresholds,
) -> Vec<StageGroup> {
    let Some(body) = profile.body() else {
        return Vec::new();
    };

    let mut groups: BTreeMap<(String, bool), Vec<usize>> = BTreeMap::new();
    for (i, block) in blocks.iter().enumerate() {
        let sig = block.signature();
        if !sig.is_more_prominent_than(&body) {
            continue;
        }
        if block.word_count() > STAGE_BLOCK_WORDS
            || rules.has_numbering(&block.text)
            || profile.is_running_artifact(&block.text)
        {
            continue;
        }
        if let Some(prefix) = stage_prefix(&block.text, rules) {
            groups.entry((prefix, block.is_bold)).or_default().push(i);
        }
    }

    groups
        .into_iter()
        .filter_map(|((prefix, bold), members)| {
            if members.len() < thresholds.pathway_min_repeats {
                return None;
            }
            let pages: BTreeSet<usize> = members.iter().map(|&i| blocks[i].page).collect();
            if pages.len() < thresholds.pathway_min_pages {
                return None;
            }
            let rank = members
                .iter()
                .filter_map(|&i| profile.rank(&blocks[i].signature()))
                .min()?;
            Some(StageGroup {
                prefix,
                bold,
                blocks: members,
                pages: pages.len(),
                rank,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::language::RuleRegistry;
    use crate::model::BBox;

    fn block(page: usize, y: f32, text: &str, size: f32, bold: bool) -> TextBlock {
        TextBlock {
            page,
            bbox: BBox::new(72.0, y, 72.0 + text.len() as f32 * size * 0.5, y + size),
            text: text.to_string(),
            font_size: size,
            is_bold: bold,
            font_family: 0,
        }
    }

    fn paragraph(page: usize, y: f32) -> TextBlock {
        block(
            page,
            y,
            "The committee reviewed every report received during the period.",
            10.0,
            false,
        )
    }

    fn run_classifier(blocks: &[TextBlock]) -> (DocumentTypeTag, DocumentSignals) {
        let thresholds = Thresholds::default();
        let registry = RuleRegistry::builtin();
        let page_count = blocks.iter().map(|b| b.page + 1).max().unwrap_or(0);
        let profile = StyleProfile::build(blocks, page_count, &thresholds);
        classify(blocks, &profile, registry.get("en"), &StructuralPatterns::new(), &thresholds)
    }

    #[test]
    fn test_empty_is_plain() {
        assert_eq!(run_classifier(&[]).0, DocumentTypeTag::Plain);
    }

    #[test]
    fn test_form() {
        let mut blocks = vec![block(0, 40.0, "Application Form", 16.0, true)];
        let labels = ["Name:", "Date:", "Address:", "Phone:", "Signature ______", "Email:", "Designation:", "Amount:"];
        for (i, label) in labels.iter().enumerate() {
            blocks.push(block(0, 80.0 + i as f32 * 20.0, label, 10.0, false));
            blocks.push(block(0, 80.0 + i as f32 * 20.0, "Office use", 10.0, false));
        }
        assert_eq!(run_classifier(&blocks).0, DocumentTypeTag::Form);
    }

    #[test]
    fn test_flyer() {
        let blocks = vec![
            block(0, 40.0, "SUMMER PICNIC", 32.0, true),
            block(0, 120.0, "Bring the whole family", 12.0, false),
            block(0, 140.0, "Games and food for everyone", 12.0, false),
            block(0, 160.0, "Saturday at noon", 12.0, false),
            block(0, 180.0, "Riverside park pavilion", 12.0, false),
        ];
        assert_eq!(run_classifier(&blocks).0, DocumentTypeTag::Flyer);
    }

    fn numbered_doc(extra: &[&str]) -> Vec<TextBlock> {
        let mut blocks = Vec::new();
        let headings = ["1. Introduction", "1.1 Scope", "2. Requirements", "2.1 Interfaces", "3. Testing"];
        for (page, heading) in headings.iter().enumerate() {
            blocks.push(block(page, 60.0, heading, 14.0, true));
            for j in 0..5 {
                blocks.push(paragraph(page, 100.0 + j as f32 * 14.0));
            }
        }
        for (i, text) in extra.iter().enumerate() {
            blocks.push(block(0, 30.0 + i as f32, text, 14.0, true));
        }
        blocks
    }

    #[test]
    fn test_technical() {
        let (tag, signals) = run_classifier(&numbered_doc(&[]));
        assert_eq!(tag, DocumentTypeTag::Technical);
        assert_eq!(signals.numbered_blocks, 5);
        assert_eq!(signals.numbered_style, Some(StyleSignature::new(14.0, true)));
    }

    #[test]
    fn test_rfp_beats_technical() {
        let (tag, signals) = run_classifier(&numbered_doc(&["Request for Proposal", "Appendix A: Terms"]));
        assert_eq!(tag, DocumentTypeTag::Rfp);
        assert!(signals.admin_keywords.len() >= 2);
    }

    #[test]
    fn test_pathway() {
        let mut blocks = Vec::new();
        for page in 0..3 {
            let text = ["Step 1", "Step 2", "Step 3"][page];
            blocks.push(block(page, 60.0, text, 14.0, true));
            for j in 0..5 {
                blocks.push(paragraph(page, 100.0 + j as f32 * 14.0));
            }
        }
        let (tag, signals) = run_classifier(&blocks);
        assert_eq!(tag, DocumentTypeTag::Pathway);
        assert_eq!(signals.stage_groups.len(), 1);
        assert_eq!(signals.stage_groups[0].prefix, "step");
        assert_eq!(signals.stage_groups[0].pages, 3);
    }

    #[test]
    fn test_plain_report() {
        let mut blocks = Vec::new();
        for page in 0..4 {
            let heading = ["Overview", "Background", "Findings", "Outlook"][page];
            blocks.push(block(page, 60.0, heading, 14.0, true));
            for j in 0..5 {
                blocks.push(paragraph(page, 100.0 + j as f32 * 14.0));
            }
        }
        assert_eq!(run_classifier(&blocks).0, DocumentTypeTag::Plain);
    }
}
