//! Document-wide style statistics.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::Thresholds;
use crate::model::{StyleSignature, TextBlock};

/// Per-signature statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleStats {
    /// Number of non-trivial blocks with this signature
    pub count: usize,
    /// Total characters across those blocks
    pub chars: usize,
    /// Mean block text length
    pub mean_len: f32,
    /// Whether this signature ranks as a heading candidate
    pub is_candidate: bool,
}

/// Body-text baseline and ranked heading-candidate signatures for one document.
///
/// Built once per document and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct StyleProfile {
    stats: BTreeMap<StyleSignature, StyleStats>,
    body: Option<StyleSignature>,
    ranking: Vec<StyleSignature>,
    sparse: bool,
    page_count: usize,
    repeated: BTreeSet<String>,
}

impl StyleProfile {
    /// Build the profile from all blocks of a document.
    ///
    /// `page_count` counts every page, including pages without text.
    pub fn build(blocks: &[TextBlock], page_count: usize, thresholds: &Thresholds) -> Self {
        let mut stats: BTreeMap<StyleSignature, StyleStats> = BTreeMap::new();
        let mut non_trivial = 0usize;

        for block in blocks {
            let chars = block.char_count();
            if chars < thresholds.short_text_cutoff {
                continue;
            }
            non_trivial += 1;
            let entry = stats.entry(block.signature()).or_default();
            entry.count += 1;
            entry.chars += chars;
        }

        for entry in stats.values_mut() {
            entry.mean_len = entry.chars as f32 / entry.count as f32;
        }

        let page_count = blocks
            .iter()
            .map(|b| b.page + 1)
            .max()
            .unwrap_or(0)
            .max(page_count);
        let repeated = running_texts(blocks, page_count, thresholds);

        let mut profile = Self {
            stats,
            body: None,
            ranking: Vec::new(),
            sparse: non_trivial < thresholds.sparse_block_minimum,
            page_count,
            repeated,
        };
        if profile.stats.is_empty() {
            return profile;
        }

        if profile.sparse {
            profile.rank_by_size(thresholds);
        } else {
            profile.rank_by_frequency(thresholds);
        }

        log::debug!(
            "Style profile: body={}, candidates=[{}], sparse={}",
            profile.body.map(|s| s.to_string()).unwrap_or_default(),
            profile
                .ranking
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            profile.sparse
        );
        profile
    }

    /// Body is the signature carrying the most text; candidates are the
    /// larger or bolder signatures of heading-like length.
    fn rank_by_frequency(&mut self, thresholds: &Thresholds) {
        let body = self
            .stats
            .iter()
            .max_by_key(|(sig, s)| (s.chars, s.count, Reverse(sig.half_points), !sig.bold))
            .map(|(sig, _)| *sig);
        let Some(body) = body else { return };
        self.body = Some(body);

        let mut ranking: Vec<StyleSignature> = self
            .stats
            .iter()
            .filter(|(sig, s)| {
                sig.is_more_prominent_than(&body) && s.mean_len <= thresholds.candidate_mean_chars
            })
            .map(|(sig, _)| *sig)
            .collect();
        ranking.sort_by_key(|sig| (Reverse(sig.half_points), Reverse(sig.bold)));
        self.set_ranking(ranking);
    }

    /// Sparse documents: frequencies are unreliable, so the smallest size is
    /// the baseline and every larger size is a candidate.
    fn rank_by_size(&mut self, thresholds: &Thresholds) {
        let body = self
            .stats
            .keys()
            .min_by_key(|sig| (sig.half_points, sig.bold))
            .copied();
        let Some(body) = body else { return };
        self.body = Some(body);

        let mut ranking: Vec<StyleSignature> = self
            .stats
            .iter()
            .filter(|(sig, s)| {
                sig.half_points > body.half_points && s.mean_len <= thresholds.candidate_mean_chars
            })
            .map(|(sig, _)| *sig)
            .collect();
        ranking.sort_by_key(|sig| (Reverse(sig.half_points), Reverse(sig.bold)));
        self.set_ranking(ranking);
    }

    fn set_ranking(&mut self, ranking: Vec<StyleSignature>) {
        for sig in &ranking {
            if let Some(stats) = self.stats.get_mut(sig) {
                stats.is_candidate = true;
            }
        }
        self.ranking = ranking;
    }

    /// The body-text signature, if the document has any non-trivial text.
    pub fn body(&self) -> Option<StyleSignature> {
        self.body
    }

    /// Candidate signatures, most prominent first.
    pub fn candidates(&self) -> &[StyleSignature] {
        &self.ranking
    }

    /// Whether a signature is a heading candidate.
    pub fn is_candidate(&self, sig: &StyleSignature) -> bool {
        self.stats.get(sig).map_or(false, |s| s.is_candidate)
    }

    /// Zero-based rank of a candidate signature.
    ///
    /// In sparse documents signatures of equal size share a rank.
    pub fn rank(&self, sig: &StyleSignature) -> Option<usize> {
        if !self.is_candidate(sig) {
            return None;
        }
        if self.sparse {
            let larger: BTreeSet<i32> = self
                .ranking
                .iter()
                .map(|s| s.half_points)
                .filter(|hp| *hp > sig.half_points)
                .collect();
            return Some(larger.len());
        }
        self.ranking.iter().position(|s| s == sig)
    }

    /// The most prominent candidate signature.
    pub fn top_candidate(&self) -> Option<StyleSignature> {
        self.ranking.first().copied()
    }

    /// Statistics for a signature.
    pub fn stats(&self, sig: &StyleSignature) -> Option<&StyleStats> {
        self.stats.get(sig)
    }

    /// Whether the sparse-document fallback was used.
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Whether a block's text repeats as a running header or footer.
    pub fn is_running_artifact(&self, text: &str) -> bool {
        self.repeated.contains(&artifact_key(text))
    }
}

/// Words that may surround the number in a page label.
const PAGE_LABEL_WORDS: &[&str] = &[
    "page", "p", "pg", "of", "seite", "von", "página", "pagina", "de", "sur", "di", "ページ", "页",
];

/// Key used to detect running headers/footers: lowercase, whitespace
/// collapsed. Digits are dropped only from page labels, so "Page 3 of 10"
/// and "Page 4 of 10" collide while "Chapter 1" and "Chapter 2" stay apart.
fn artifact_key(text: &str) -> String {
    let lower: String = text.chars().flat_map(char::to_lowercase).collect();
    let normalized = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    if !is_page_label(&normalized) {
        return normalized;
    }
    let stripped: String = normalized.chars().filter(|c| !c.is_ascii_digit()).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A page number, alone or with label words: "12", "page 3 of 10", "p. 4", "7/20".
fn is_page_label(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .all(|w| PAGE_LABEL_WORDS.contains(&w))
}

fn running_texts(blocks: &[TextBlock], page_count: usize, thresholds: &Thresholds) -> BTreeSet<String> {
    if page_count < 2 {
        return BTreeSet::new();
    }

    let mut pages_by_text: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
    for block in blocks {
        let key = artifact_key(&block.text);
        if key.is_empty() {
            continue;
        }
        pages_by_text.entry(key).or_default().insert(block.page);
    }

    let min_pages = (page_count as f32 * thresholds.running_artifact_page_ratio).ceil() as usize;
    pages_by_text
        .into_iter()
        .filter(|(_, pages)| pages.len() >= 2 && pages.len() >= min_pages)
        .map(|(text, _)| text)
        .collect()
}
