//! Language detection and per-language lexical rules.
//!
//! Rule sets are plain data: adding a language means adding one
//! [`RuleData`] entry to [`BUILTIN_RULES`].

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use super::profile::StyleProfile;
use super::Thresholds;
use crate::error::{Error, Result};
use crate::model::TextBlock;

/// Tag of the rule set used when detection fails or names an unknown language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Best-effort language identification from a text sample.
///
/// Returns an ISO 639-1 style tag, or `None` when the language is unknown.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, sample: &str) -> Option<String>;
}

/// How a numbering pattern maps to a heading depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingDepth {
    /// Depth is the number of dot-separated components in capture group 1,
    /// minus one ("1" → 0, "1.2" → 1, "1.2.3" → 2).
    Dotted,
    /// Fixed zero-based depth ("Chapter 3" → 0).
    Fixed(usize),
}

/// Writing system a rule set applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Han,
    Kana,
}

/// Static description of one language's rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleData {
    pub tag: &'static str,
    pub script: Script,
    pub numbering: &'static [(&'static str, NumberingDepth)],
    pub stop_words: &'static [&'static str],
    pub admin_keywords: &'static [&'static str],
    pub min_heading_chars: usize,
}

const DOTTED: (&str, NumberingDepth) = (
    r"^(\d{1,2}(?:\.\d{1,2}){0,3})(?:\.|\))?(?:\s+|$)",
    NumberingDepth::Dotted,
);

/// Built-in rule sets.
pub const BUILTIN_RULES: &[RuleData] = &[
    RuleData {
        tag: "en",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:chapter|part)\s+(?:\d+|[ivxlc]+)\b", NumberingDepth::Fixed(0)),
            (r"(?i)^(?:appendix|annex)\s+[a-z0-9]{1,3}\b", NumberingDepth::Fixed(0)),
            (r"(?i)^section\s+\d+\b", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "the", "and", "of", "to", "in", "is", "for", "that", "with", "on", "are", "be", "this",
            "by", "as", "at", "from", "it", "or", "an", "will", "which", "have", "not", "was", "we",
            "you", "your", "our", "a", "can", "has", "their", "they", "been",
        ],
        admin_keywords: &[
            "request for proposal", "terms of reference", "scope of work", "rfp", "proposal",
            "appendix", "terms", "deliverables", "evaluation", "submission", "contract", "budget",
            "milestones",
        ],
        min_heading_chars: 3,
    },
    RuleData {
        tag: "es",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:capítulo|parte|sección|anexo|apéndice)\s+\S+", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "el", "la", "los", "las", "de", "del", "y", "en", "que", "es", "por", "para", "con",
            "una", "un", "se", "su", "al", "lo", "como", "más", "pero", "sus", "este", "esta", "son",
        ],
        admin_keywords: &[
            "solicitud de propuesta", "términos de referencia", "propuesta", "anexo", "términos",
            "contrato", "evaluación", "presupuesto", "entregables",
        ],
        min_heading_chars: 2,
    },
    RuleData {
        tag: "fr",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:chapitre|partie|section|annexe)\s+\S+", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "le", "la", "les", "des", "de", "du", "et", "en", "un", "une", "est", "que", "qui",
            "pour", "dans", "par", "sur", "avec", "au", "aux", "ce", "cette", "sont", "pas", "plus",
        ],
        admin_keywords: &[
            "appel d'offres", "cahier des charges", "termes de référence", "proposition", "annexe",
            "contrat", "évaluation", "budget", "livrables",
        ],
        min_heading_chars: 2,
    },
    RuleData {
        tag: "de",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:kapitel|teil|abschnitt|anhang)\s+\S+", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "den", "mit", "von",
            "für", "auf", "dem", "des", "sich", "im", "auch", "werden", "wird", "sind", "oder", "bei",
        ],
        admin_keywords: &[
            "ausschreibung", "leistungsbeschreibung", "angebot", "anhang", "vertrag", "bewertung",
            "budget", "fristen",
        ],
        min_heading_chars: 3,
    },
    RuleData {
        tag: "pt",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:capítulo|parte|seção|secção|anexo)\s+\S+", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "o", "os", "as", "do", "da", "dos", "das", "e", "em", "que", "para", "com", "um", "uma",
            "no", "na", "não", "mais", "são", "ao", "pelo", "pela",
        ],
        admin_keywords: &[
            "pedido de proposta", "termos de referência", "proposta", "anexo", "contrato",
            "avaliação", "orçamento",
        ],
        min_heading_chars: 2,
    },
    RuleData {
        tag: "it",
        script: Script::Latin,
        numbering: &[
            DOTTED,
            (r"(?i)^(?:capitolo|parte|sezione|allegato)\s+\S+", NumberingDepth::Fixed(0)),
        ],
        stop_words: &[
            "il", "lo", "gli", "di", "della", "delle", "che", "per", "non", "sono", "nel", "nella",
            "alla", "è", "questo", "questa", "anche", "come", "ed", "dei",
        ],
        admin_keywords: &[
            "richiesta di proposta", "capitolato", "proposta", "allegato", "contratto",
            "valutazione", "bilancio",
        ],
        min_heading_chars: 2,
    },
    RuleData {
        tag: "ja",
        script: Script::Kana,
        numbering: &[
            DOTTED,
            (r"^第[0-9０-９一二三四五六七八九十百]+章", NumberingDepth::Fixed(0)),
            (r"^第[0-9０-９一二三四五六七八九十百]+節", NumberingDepth::Fixed(1)),
            (r"^第[0-9０-９一二三四五六七八九十百]+[条項]", NumberingDepth::Fixed(2)),
        ],
        stop_words: &[],
        admin_keywords: &["提案依頼書", "提案", "付録", "契約", "評価", "予算"],
        min_heading_chars: 1,
    },
    RuleData {
        tag: "zh",
        script: Script::Han,
        numbering: &[
            DOTTED,
            (r"^第[0-9０-９一二三四五六七八九十百]+章", NumberingDepth::Fixed(0)),
            (r"^[一二三四五六七八九十]+、", NumberingDepth::Fixed(0)),
            (r"^第[0-9０-９一二三四五六七八九十百]+[节節]", NumberingDepth::Fixed(1)),
            (r"^[（(][一二三四五六七八九十]+[）)]", NumberingDepth::Fixed(1)),
            (r"^第[0-9０-９一二三四五六七八九十百]+条", NumberingDepth::Fixed(2)),
        ],
        stop_words: &[],
        admin_keywords: &["招标", "投标", "建议书", "附录", "合同", "评估", "预算"],
        min_heading_chars: 1,
    },
];

/// Compiled rule set for one language.
#[derive(Debug, Clone)]
pub struct LanguageRules {
    tag: String,
    numbering: Vec<(Regex, NumberingDepth)>,
    stop_words: BTreeSet<String>,
    admin_keywords: Option<Regex>,
    min_heading_chars: usize,
}

impl LanguageRules {
    /// Compile a rule set from its static description.
    pub fn from_data(data: &RuleData) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::Config(format!("language '{}': {}", data.tag, e)))
        };

        let numbering = data
            .numbering
            .iter()
            .map(|(pattern, depth)| Ok((compile(pattern)?, *depth)))
            .collect::<Result<Vec<_>>>()?;

        let admin_keywords = if data.admin_keywords.is_empty() {
            None
        } else {
            // Longer phrases first so they win over their own prefixes.
            let mut keywords: Vec<&str> = data.admin_keywords.to_vec();
            keywords.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
            let alternation = keywords.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
            let pattern = match data.script {
                Script::Latin => format!(r"(?i)\b(?:{})\b", alternation),
                Script::Han | Script::Kana => format!("(?:{})", alternation),
            };
            Some(compile(&pattern)?)
        };

        Ok(Self {
            tag: data.tag.to_string(),
            numbering,
            stop_words: data.stop_words.iter().map(|w| w.to_string()).collect(),
            admin_keywords,
            min_heading_chars: data.min_heading_chars,
        })
    }

    /// Rule set with no lexical rules at all.
    fn bare(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            numbering: Vec::new(),
            stop_words: BTreeSet::new(),
            admin_keywords: None,
            min_heading_chars: 1,
        }
    }

    /// Language tag of this rule set.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Minimum characters a heading needs.
    pub fn min_heading_chars(&self) -> usize {
        self.min_heading_chars
    }

    /// Zero-based depth of a leading numbering token, if the text has one.
    pub fn numbering_depth(&self, text: &str) -> Option<usize> {
        let text = text.trim_start();
        for (regex, depth) in &self.numbering {
            let Some(caps) = regex.captures(text) else { continue };
            return Some(match depth {
                NumberingDepth::Fixed(d) => *d,
                NumberingDepth::Dotted => caps
                    .get(1)
                    .map_or(0, |m| m.as_str().split('.').count().saturating_sub(1)),
            });
        }
        None
    }

    /// Whether the text starts with a numbering token.
    pub fn has_numbering(&self, text: &str) -> bool {
        self.numbering_depth(text).is_some()
    }

    /// Whether a lowercase word is a stop-word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Share of words in the text that are stop-words.
    ///
    /// Returns 0 for texts shorter than four words.
    pub fn stop_word_ratio(&self, text: &str) -> f32 {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();
        if words.len() < 4 {
            return 0.0;
        }
        let stops = words.iter().filter(|w| self.stop_words.contains(w.as_str())).count();
        stops as f32 / words.len() as f32
    }

    /// Distinct administrative keywords found in the texts.
    pub fn admin_keyword_hits<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let Some(regex) = &self.admin_keywords else {
            return BTreeSet::new();
        };
        let mut hits = BTreeSet::new();
        for text in texts {
            for m in regex.find_iter(text) {
                hits.insert(m.as_str().to_lowercase());
            }
        }
        hits
    }
}

/// Mapping from language tag to compiled rule set.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<String, LanguageRules>,
    fallback: LanguageRules,
}

impl RuleRegistry {
    /// Registry with every built-in language.
    pub fn builtin() -> Self {
        let mut rules = BTreeMap::new();
        for data in BUILTIN_RULES {
            match LanguageRules::from_data(data) {
                Ok(compiled) => {
                    rules.insert(data.tag.to_string(), compiled);
                }
                Err(e) => log::warn!("Skipping built-in rules: {}", e),
            }
        }
        let fallback = rules
            .get(DEFAULT_LANGUAGE)
            .cloned()
            .unwrap_or_else(|| LanguageRules::bare(DEFAULT_LANGUAGE));
        Self { rules, fallback }
    }

    /// Add or replace a rule set.
    pub fn insert(&mut self, rules: LanguageRules) {
        if rules.tag == DEFAULT_LANGUAGE {
            self.fallback = rules.clone();
        }
        self.rules.insert(rules.tag.clone(), rules);
    }

    /// Whether a tag has its own rule set.
    pub fn contains(&self, tag: &str) -> bool {
        self.rules.contains_key(tag)
    }

    /// Rule set for a tag, falling back to the default language.
    pub fn get(&self, tag: &str) -> &LanguageRules {
        self.rules.get(tag).unwrap_or(&self.fallback)
    }

    /// Registered tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|k| k.as_str())
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reduce a detector tag such as `en-US` or `pt_BR` to its primary subtag.
pub fn normalize_tag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Build the detection sample: the first non-empty blocks, topped up with
/// body text when they are too short.
pub fn sample_text(blocks: &[TextBlock], profile: &StyleProfile, thresholds: &Thresholds) -> String {
    let mut sample = String::new();
    let mut used = BTreeSet::new();

    for (i, block) in blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.text.is_empty())
        .take(thresholds.language_sample_blocks)
    {
        push_sample(&mut sample, &block.text);
        used.insert(i);
    }

    if sample.chars().count() < thresholds.language_sample_chars {
        if let Some(body) = profile.body() {
            for (i, block) in blocks.iter().enumerate() {
                if sample.chars().count() >= thresholds.language_sample_chars {
                    break;
                }
                if !used.contains(&i) && block.signature() == body {
                    push_sample(&mut sample, &block.text);
                }
            }
        }
    }
    sample
}

fn push_sample(sample: &mut String, text: &str) {
    if !sample.is_empty() {
        sample.push(' ');
    }
    sample.push_str(text);
}

/// Resolve the rule set for a document, falling back to the default language.
///
/// Returns the detected tag (if any) alongside the rules actually used.
pub fn resolve<'r>(
    detector: &dyn LanguageDetector,
    registry: &'r RuleRegistry,
    sample: &str,
) -> (Option<String>, &'r LanguageRules) {
    let detected = if sample.trim().is_empty() {
        None
    } else {
        detector.detect(sample).map(|t| normalize_tag(&t)).filter(|t| !t.is_empty())
    };

    match detected.as_deref() {
        Some(tag) if registry.contains(tag) => {
            log::debug!("Detected language: {}", tag);
            (detected.clone(), registry.get(tag))
        }
        Some(tag) => {
            log::debug!("No rules for language '{}', using {}", tag, DEFAULT_LANGUAGE);
            (detected.clone(), registry.get(DEFAULT_LANGUAGE))
        }
        None => {
            log::debug!("Language undetermined, using {}", DEFAULT_LANGUAGE);
            (None, registry.get(DEFAULT_LANGUAGE))
        }
    }
}

/// Offline detector: script analysis for CJK, stop-word voting for Latin text.
#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    languages: Vec<(&'static str, BTreeSet<&'static str>)>,
    min_hits: usize,
}

impl HeuristicDetector {
    pub fn new() -> Self {
        let languages = BUILTIN_RULES
            .iter()
            .filter(|data| data.script == Script::Latin)
            .map(|data| (data.tag, data.stop_words.iter().copied().collect()))
            .collect();
        Self { languages, min_hits: 3 }
    }
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for HeuristicDetector {
    fn detect(&self, sample: &str) -> Option<String> {
        let mut letters = 0usize;
        let mut han = 0usize;
        let mut kana = 0usize;
        let mut hangul = 0usize;
        for c in sample.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            match c as u32 {
                0x3040..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => kana += 1,
                0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => han += 1,
                0xAC00..=0xD7AF | 0x1100..=0x11FF => hangul += 1,
                _ => {}
            }
        }
        if letters == 0 {
            return None;
        }

        let share = |n: usize| n as f32 / letters as f32;
        if share(kana) >= 0.05 && share(kana + han) >= 0.3 {
            return Some("ja".to_string());
        }
        if share(han) >= 0.3 {
            return Some("zh".to_string());
        }
        if share(hangul) >= 0.3 {
            return Some("ko".to_string());
        }

        let words: Vec<String> = sample
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let mut scores: Vec<(usize, &str)> = self
            .languages
            .iter()
            .map(|(tag, stops)| (words.iter().filter(|w| stops.contains(w.as_str())).count(), *tag))
            .collect();
        // Highest score first; tag order breaks ties deterministically.
        scores.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(b.1)));

        let (best, tag) = *scores.first()?;
        let runner_up = scores.get(1).map_or(0, |s| s.0);
        if best >= self.min_hits && best as f32 >= runner_up as f32 * 1.5 {
            Some(tag.to_string())
        } else {
            None
        }
    }
}
