//! Heading level assignment.
//!
//! One [`HeadingPolicy`] is selected per document from its type tag; every
//! block then goes through the shared rejection filters and the policy's
//! level mapping.

use std::collections::BTreeMap;

use super::classify::DocumentSignals;
use super::language::LanguageRules;
use super::patterns::StructuralPatterns;
use super::profile::StyleProfile;
use super::Thresholds;
use crate::model::{
    AssignedLevel, DocumentTypeTag, HeadingCandidate, HeadingLevel, StyleSignature, TextBlock,
};

/// Everything the policies read. All of it is immutable per document.
#[derive(Clone, Copy)]
pub struct AssignContext<'a> {
    pub blocks: &'a [TextBlock],
    pub profile: &'a StyleProfile,
    pub rules: &'a LanguageRules,
    pub patterns: &'a StructuralPatterns,
    pub thresholds: &'a Thresholds,
}

/// Why a block can never be a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooLong,
    TooShort,
    Noise,
    RunningArtifact,
    Prose,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Empty => "empty",
            Rejection::TooLong => "too long",
            Rejection::TooShort => "too short",
            Rejection::Noise => "noise",
            Rejection::RunningArtifact => "running artifact",
            Rejection::Prose => "prose",
        }
    }
}

impl<'a> AssignContext<'a> {
    /// Shared filters applied before any policy.
    pub fn rejection(&self, block: &TextBlock) -> Option<Rejection> {
        let text = block.text.trim();
        if text.is_empty() {
            return Some(Rejection::Empty);
        }
        let chars = text.chars().count();
        if chars > self.thresholds.max_heading_chars {
            return Some(Rejection::TooLong);
        }
        if chars < self.rules.min_heading_chars() {
            return Some(Rejection::TooShort);
        }
        if self.patterns.is_noise(text) {
            return Some(Rejection::Noise);
        }
        // Numbered text is never a running header.
        if !self.rules.has_numbering(text) && self.profile.is_running_artifact(text) {
            return Some(Rejection::RunningArtifact);
        }
        if self.rules.stop_word_ratio(text) > self.thresholds.max_stop_word_ratio
            || self.patterns.is_multi_sentence(text)
        {
            return Some(Rejection::Prose);
        }
        None
    }

    /// Default mapping: candidate style rank to level.
    fn style_level(&self, block: &TextBlock) -> Option<(AssignedLevel, usize)> {
        let rank = self.profile.rank(&block.signature())?;
        Some((AssignedLevel::Heading(HeadingLevel::from_depth(rank)), rank))
    }

    /// Horizontal text extent (min x0, max x1) per page.
    fn page_extents(&self) -> BTreeMap<usize, (f32, f32)> {
        let mut extents: BTreeMap<usize, (f32, f32)> = BTreeMap::new();
        for block in self.blocks {
            let entry = extents
                .entry(block.page)
                .or_insert((block.bbox.x0, block.bbox.x1));
            entry.0 = entry.0.min(block.bbox.x0);
            entry.1 = entry.1.max(block.bbox.x1);
        }
        extents
    }
}

/// Per-document-type heading policy.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadingPolicy {
    /// Style rank only.
    Plain,
    /// Field labels never qualify; headings must be isolated, wide and large.
    Form {
        extents: BTreeMap<usize, (f32, f32)>,
    },
    /// Largest block on the first page is the title; the rest is flat.
    Flyer { title_block: Option<usize> },
    /// Leading numbering decides the level; style rank is the fallback.
    Numbered { numbered_style: Option<StyleSignature> },
    /// Members of a stage group share one level.
    Pathway { stage_rank: BTreeMap<usize, usize> },
}

impl HeadingPolicy {
    /// Select the policy for a classified document.
    pub fn select(tag: DocumentTypeTag, signals: &DocumentSignals, ctx: &AssignContext<'_>) -> Self {
        match tag {
            DocumentTypeTag::Plain => HeadingPolicy::Plain,
            DocumentTypeTag::Form => HeadingPolicy::Form {
                extents: ctx.page_extents(),
            },
            DocumentTypeTag::Flyer => HeadingPolicy::Flyer {
                title_block: flyer_title(ctx),
            },
            DocumentTypeTag::Technical | DocumentTypeTag::Rfp => HeadingPolicy::Numbered {
                numbered_style: signals.numbered_style,
            },
            DocumentTypeTag::Pathway => {
                let mut stage_rank = BTreeMap::new();
                for group in &signals.stage_groups {
                    for &index in &group.blocks {
                        stage_rank.insert(index, group.rank);
                    }
                }
                HeadingPolicy::Pathway { stage_rank }
            }
        }
    }

    /// Level and confidence rank for a block that passed the shared filters.
    pub fn level_for(&self, index: usize, ctx: &AssignContext<'_>) -> Option<(AssignedLevel, usize)> {
        let block = ctx.blocks.get(index)?;
        match self {
            HeadingPolicy::Plain => ctx.style_level(block),

            HeadingPolicy::Form { extents } => {
                if ctx.patterns.is_field_label(&block.text) {
                    return None;
                }
                let body = ctx.profile.body();
                let large = body.map_or(true, |b| block.signature().half_points > b.half_points);
                if !large || !is_isolated(index, ctx.blocks) {
                    return None;
                }
                if !spans_page(block, extents.get(&block.page), ctx.thresholds) {
                    return None;
                }
                ctx.style_level(block)
            }

            HeadingPolicy::Flyer { title_block } => {
                if *title_block == Some(index) {
                    return Some((AssignedLevel::Title, 0));
                }
                ctx.style_level(block).map(|(_, rank)| (AssignedLevel::Heading(HeadingLevel::H1), rank))
            }

            HeadingPolicy::Numbered { numbered_style } => {
                let sig = block.signature();
                let styled = ctx.profile.is_candidate(&sig) || *numbered_style == Some(sig);
                match ctx.rules.numbering_depth(&block.text) {
                    Some(depth) if styled => {
                        Some((AssignedLevel::Heading(HeadingLevel::from_depth(depth)), depth))
                    }
                    _ => ctx.style_level(block),
                }
            }

            HeadingPolicy::Pathway { stage_rank } => match stage_rank.get(&index) {
                Some(&rank) => Some((AssignedLevel::Heading(HeadingLevel::from_depth(rank)), rank)),
                None => ctx.style_level(block),
            },
        }
    }
}

/// Most prominent acceptable candidate on the first page with text.
fn flyer_title(ctx: &AssignContext<'_>) -> Option<usize> {
    let first_page = ctx.blocks.iter().map(|b| b.page).min()?;
    ctx.blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.page == first_page)
        .filter(|(_, b)| ctx.profile.is_candidate(&b.signature()))
        .filter(|(_, b)| ctx.rejection(b).is_none())
        // Earliest block wins ties.
        .max_by_key(|(i, b)| {
            let sig = b.signature();
            (sig.half_points, sig.bold, std::cmp::Reverse(*i))
        })
        .map(|(i, _)| i)
}

/// No other block shares the line.
fn is_isolated(index: usize, blocks: &[TextBlock]) -> bool {
    let Some(block) = blocks.get(index) else {
        return false;
    };
    !blocks.iter().enumerate().any(|(i, other)| {
        i != index
            && other.page == block.page
            && block.bbox.vertical_overlap(&other.bbox)
                > 0.5 * block.bbox.height().min(other.bbox.height())
    })
}

/// Wide relative to the page's text, or centred on it.
fn spans_page(block: &TextBlock, extent: Option<&(f32, f32)>, thresholds: &Thresholds) -> bool {
    let Some(&(left, right)) = extent else {
        return true;
    };
    let width = right - left;
    if width <= 0.0 {
        return true;
    }
    let centre = (left + right) / 2.0;
    let block_centre = (block.bbox.x0 + block.bbox.x1) / 2.0;
    block.bbox.width() >= thresholds.form_min_width_ratio * width
        || (block_centre - centre).abs() <= 0.1 * width
}

/// Assign a level to every block, in document order.
pub fn assign_levels(policy: &HeadingPolicy, ctx: &AssignContext<'_>) -> Vec<HeadingCandidate> {
    let mut candidates = Vec::with_capacity(ctx.blocks.len());
    let mut previous: Option<&str> = None;
    let mut rejected: BTreeMap<&'static str, usize> = BTreeMap::new();

    for (index, block) in ctx.blocks.iter().enumerate() {
        if let Some(reason) = ctx.rejection(block) {
            if ctx.profile.is_candidate(&block.signature()) {
                *rejected.entry(reason.as_str()).or_default() += 1;
            }
            candidates.push(HeadingCandidate::rejected(index));
            continue;
        }

        let Some((level, rank)) = policy.level_for(index, ctx) else {
            candidates.push(HeadingCandidate::rejected(index));
            continue;
        };

        let text = block.text.as_str();
        if previous == Some(text) {
            *rejected.entry("duplicate").or_default() += 1;
            candidates.push(HeadingCandidate::rejected(index));
            continue;
        }

        previous = Some(text);
        candidates.push(HeadingCandidate::new(index, level, rank));
    }

    if !rejected.is_empty() {
        log::debug!("Rejected candidate-styled blocks: {:?}", rejected);
    }
    candidates
}
