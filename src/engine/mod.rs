//! Heading inference engine.
//!
//! Turns per-page text runs into a title and a leveled outline:
//!
//! ```text
//! PageRuns → collector → profile → language → classify → assign → assemble
//! ```
//!
//! Every stage is a pure function of its inputs, so one [`OutlineEngine`] can
//! be shared across worker threads.

pub mod assemble;
pub mod assign;
pub mod classify;
pub mod collector;
pub mod language;
pub mod patterns;
pub mod profile;
mod thresholds;

pub use assign::{AssignContext, HeadingPolicy};
pub use classify::{DocumentSignals, StageGroup};
pub use language::{HeuristicDetector, LanguageDetector, LanguageRules, RuleRegistry, DEFAULT_LANGUAGE};
pub use patterns::StructuralPatterns;
pub use profile::{StyleProfile, StyleStats};
pub use thresholds::Thresholds;

use serde::Serialize;

use crate::model::{
    DocumentTypeTag, HeadingCandidate, OutlineDocument, PageRuns, StyleSignature, TextBlock,
};

/// Diagnostics for one document, alongside its outline.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineReport {
    /// Number of pages read
    pub page_count: usize,
    /// Number of collected text blocks
    pub block_count: usize,
    /// Selected document type
    pub document_type: DocumentTypeTag,
    /// Tag returned by the detector, if any
    pub detected_language: Option<String>,
    /// Tag of the rule set actually used
    pub language: String,
    /// Body-text signature
    pub body_style: Option<StyleSignature>,
    /// Candidate signatures, most prominent first
    pub candidate_styles: Vec<StyleSignature>,
    /// Whether the sparse-document ranking was used
    pub sparse: bool,
    /// Signals the classifier decided on
    pub signals: DocumentSignals,
    /// The extracted outline
    pub outline: OutlineDocument,
}

/// The heading inference pipeline.
pub struct OutlineEngine {
    thresholds: Thresholds,
    registry: RuleRegistry,
    detector: Box<dyn LanguageDetector>,
    patterns: StructuralPatterns,
}

impl OutlineEngine {
    /// Engine with the given thresholds, built-in languages and the offline detector.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            registry: RuleRegistry::builtin(),
            detector: Box::new(HeuristicDetector::new()),
            patterns: StructuralPatterns::new(),
        }
    }

    /// Replace the language detector.
    pub fn with_detector<D: LanguageDetector + 'static>(mut self, detector: D) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Replace the thresholds, keeping the detector and registry.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the language rule registry.
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Thresholds in use.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Extract the title and outline.
    pub fn extract(&self, pages: &[PageRuns]) -> OutlineDocument {
        self.analyze(pages).outline
    }

    /// Extract the outline and report how it was derived.
    pub fn analyze(&self, pages: &[PageRuns]) -> OutlineReport {
        let thresholds = &self.thresholds;
        let blocks = collector::collect_blocks(pages, thresholds);
        let profile = StyleProfile::build(&blocks, pages.len(), thresholds);

        let sample = language::sample_text(&blocks, &profile, thresholds);
        let (detected_language, rules) = language::resolve(self.detector.as_ref(), &self.registry, &sample);

        let (document_type, signals) =
            classify::classify(&blocks, &profile, rules, &self.patterns, thresholds);

        let candidates = self.assign(&blocks, &profile, rules, document_type, &signals);
        let outline =
            assemble::assemble(&blocks, &candidates, profile.top_candidate(), rules, thresholds);

        OutlineReport {
            page_count: pages.len(),
            block_count: blocks.len(),
            document_type,
            detected_language,
            language: rules.tag().to_string(),
            body_style: profile.body(),
            candidate_styles: profile.candidates().to_vec(),
            sparse: profile.is_sparse(),
            signals,
            outline,
        }
    }

    fn assign(
        &self,
        blocks: &[TextBlock],
        profile: &StyleProfile,
        rules: &LanguageRules,
        document_type: DocumentTypeTag,
        signals: &DocumentSignals,
    ) -> Vec<HeadingCandidate> {
        let ctx = AssignContext {
            blocks,
            profile,
            rules,
            patterns: &self.patterns,
            thresholds: &self.thresholds,
        };
        let policy = HeadingPolicy::select(document_type, signals, &ctx);
        let candidates = assign::assign_levels(&policy, &ctx);
        log::debug!(
            "Accepted {} of {} blocks as headings",
            candidates.iter().filter(|c| c.level.is_accepted()).count(),
            blocks.len()
        );
        candidates
    }
}

impl Default for OutlineEngine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl std::fmt::Debug for OutlineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineEngine")
            .field("thresholds", &self.thresholds)
            .field("languages", &self.registry.tags().collect::<Vec<_>>())
            .finish()
    }
}
