//! Mapping between application language codes and provider locale tags,
//! plus the fallback heuristics used when the provider's detection is
//! missing or ambiguous.
//!
//! Resolution ranks three disjoint evidence sources:
//!
//! 1. the provider-supplied tag (exact locale, then primary-subtag prefix),
//! 2. the writing system of the recognized text,
//! 3. lexical markers and script-specific letters inside a script family.
//!
//! When no evidence applies the configured language wins.

use super::provider::AutoDetect;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LOCALE: &str = "en-US";

/// Application code → provider locale
const LOCALES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("fr", "fr-FR"),
    ("es", "es-ES"),
    ("ar", "ar-SA"),
    ("fa", "fa-IR"),
    ("ur", "ur-PK"),
    ("ps", "ps-AF"),
    ("zh", "zh-CN"),
    ("hi", "hi-IN"),
    ("bn", "bn-IN"),
    ("pt", "pt-BR"),
    ("ru", "ru-RU"),
    ("uk", "uk-UA"),
    ("de", "de-DE"),
    ("it", "it-IT"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("ro", "ro-RO"),
    ("tr", "tr-TR"),
    ("ja", "ja-JP"),
    ("ko", "ko-KR"),
    ("vi", "vi-VN"),
    ("tl", "fil-PH"),
    ("sw", "sw-KE"),
    ("so", "so-SO"),
    ("am", "am-ET"),
    ("ti", "ti-ET"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Arabic,
    Cyrillic,
    Han,
    Kana,
    Hangul,
    Devanagari,
    Bengali,
    Ethiopic,
}

fn script_of(c: char) -> Option<Script> {
    match c as u32 {
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Some(Script::Latin),
        0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
            Some(Script::Arabic)
        }
        0x0400..=0x04FF => Some(Script::Cyrillic),
        0x3040..=0x30FF => Some(Script::Kana),
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => Some(Script::Han),
        0xAC00..=0xD7AF | 0x1100..=0x11FF => Some(Script::Hangul),
        0x0900..=0x097F => Some(Script::Devanagari),
        0x0980..=0x09FF => Some(Script::Bengali),
        0x1200..=0x137F => Some(Script::Ethiopic),
        _ => None,
    }
}

/// Writing system of each application language
fn script_for_language(code: &str) -> Script {
    match code {
        "ar" | "fa" | "ur" | "ps" => Script::Arabic,
        "ru" | "uk" => Script::Cyrillic,
        "zh" => Script::Han,
        "ja" => Script::Kana,
        "ko" => Script::Hangul,
        "hi" => Script::Devanagari,
        "bn" => Script::Bengali,
        "am" | "ti" => Script::Ethiopic,
        _ => Script::Latin,
    }
}

/// Dominant script of `text`, by letter count
pub fn dominant_script(text: &str) -> Option<Script> {
    let mut counts: Vec<(Script, usize)> = Vec::new();
    for script in text.chars().filter_map(script_of) {
        match counts.iter_mut().find(|(s, _)| *s == script) {
            Some((_, n)) => *n += 1,
            None => counts.push((script, 1)),
        }
    }
    // Japanese mixes kana and kanji; any kana means Japanese
    if counts.iter().any(|(s, _)| *s == Script::Kana) {
        return Some(Script::Kana);
    }
    counts.into_iter().max_by_key(|(_, n)| *n).map(|(s, _)| s)
}

/// Members of a script family that share one writing system
struct FamilyMember {
    code: &'static str,
    letters: &'static [char],
    words: &'static [&'static str],
}

/// Ranked: earlier members win ties. The family default comes last.
const ARABIC_FAMILY: &[FamilyMember] = &[
    FamilyMember {
        code: "ur",
        letters: &['ٹ', 'ڈ', 'ڑ', 'ں', 'ھ', 'ے', 'ۓ'],
        words: &["ہے", "ہیں", "کے", "میں", "اور", "نہیں"],
    },
    FamilyMember {
        code: "ps",
        letters: &['ټ', 'ځ', 'څ', 'ډ', 'ړ', 'ږ', 'ښ', 'ګ', 'ڼ', 'ۍ', 'ې'],
        words: &["دی", "دا", "او", "زه", "ته"],
    },
    FamilyMember {
        code: "fa",
        letters: &['ژ'],
        words: &["است", "این", "را", "که", "من", "چه", "می"],
    },
    FamilyMember {
        code: "ar",
        letters: &['ة', 'ى', 'ي', 'ك'],
        words: &["في", "على", "هذا", "التي", "الذي", "أنا"],
    },
];

/// Letters shared by Persian, Urdu and Pashto but absent from Arabic
const PERSO_ARABIC_EXTENSION: &[char] = &['پ', 'چ', 'گ', 'ی', 'ک'];

const CYRILLIC_FAMILY: &[FamilyMember] = &[
    FamilyMember {
        code: "uk",
        letters: &['і', 'ї', 'є', 'ґ'],
        words: &["що", "це", "як", "та"],
    },
    FamilyMember {
        code: "ru",
        letters: &['ы', 'э', 'ъ', 'ё'],
        words: &["что", "это", "как", "и"],
    },
];

fn family(script: Script) -> Option<&'static [FamilyMember]> {
    match script {
        Script::Arabic => Some(ARABIC_FAMILY),
        Script::Cyrillic => Some(CYRILLIC_FAMILY),
        _ => None,
    }
}

/// Which evidence source decided a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    ProviderTag,
    Script,
    Lexical,
    Configured,
}

/// A resolved application language and how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub language: String,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("auto-detection needs more than one candidate language, got {0}")]
    TooFewCandidates(usize),
}

/// Language tag mapping and reverse resolution
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    default_locale: String,
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl LanguageResolver {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
        }
    }

    /// Provider locale for an application code; unknown codes use the default
    pub fn to_provider_tag(&self, app_code: &str) -> String {
        let code = normalize(app_code);
        LOCALES
            .iter()
            .find(|(app, _)| *app == code)
            .map(|(_, locale)| locale.to_string())
            .unwrap_or_else(|| {
                debug!("No locale for '{}', using {}", app_code, self.default_locale);
                self.default_locale.clone()
            })
    }

    /// Configure multi-language detection; requires more than one distinct candidate
    pub fn configure_auto_detect(&self, candidates: &[String]) -> Result<AutoDetect, LanguageError> {
        let mut locales: Vec<String> = Vec::new();
        for code in candidates {
            let locale = self.to_provider_tag(code);
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }

        if locales.len() < 2 {
            return Err(LanguageError::TooFewCandidates(locales.len()));
        }

        Ok(AutoDetect {
            locales,
            prioritize_latency: true,
        })
    }

    /// Application code for a provider tag, exact locale first, then prefix
    pub fn from_provider_tag(&self, tag: &str) -> Option<String> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }

        if let Some((app, _)) = LOCALES.iter().find(|(_, l)| l.eq_ignore_ascii_case(tag)) {
            return Some(app.to_string());
        }

        let primary = normalize(tag);
        LOCALES
            .iter()
            .find(|(app, locale)| *app == primary || normalize(locale) == primary)
            .map(|(app, _)| app.to_string())
    }

    /// Resolve the language of a final result
    ///
    /// `candidates` narrows script-family refinement; empty means unrestricted.
    pub fn resolve(
        &self,
        detected_tag: Option<&str>,
        text: &str,
        configured: &str,
        candidates: &[String],
    ) -> Resolution {
        let configured = normalize(configured);
        let allowed: Vec<String> = candidates.iter().map(|c| normalize(c)).collect();

        if let Some(language) = detected_tag.and_then(|tag| self.from_provider_tag(tag)) {
            // Provider tags inside a shared script can still be wrong about the member
            if allowed.len() != 1 {
                if let Some(refined) = challenge_tag(&language, text, &allowed) {
                    return refined;
                }
            }
            return Resolution {
                language,
                evidence: Evidence::ProviderTag,
            };
        }

        // No provider detection: stay with the configured language unless the
        // text is plainly written in another candidate's script
        if let Some(script) = dominant_script(text) {
            if script != script_for_language(&configured) {
                let in_script: Vec<&String> = allowed
                    .iter()
                    .filter(|c| script_for_language(c) == script)
                    .collect();
                if let Some(first) = in_script.first() {
                    if let Some(refined) = refine_in_family(first, text, &allowed) {
                        return refined;
                    }
                    return Resolution {
                        language: first.to_string(),
                        evidence: Evidence::Script,
                    };
                }
            }
        }

        Resolution {
            language: configured,
            evidence: Evidence::Configured,
        }
    }
}

struct Score<'a> {
    member: &'a FamilyMember,
    points: usize,
    evidence: Evidence,
}

/// Members of `language`'s script family allowed by `allowed`, with their evidence
///
/// 2 points per distinct script-specific letter, 1 per lexical marker word,
/// 1 for any Perso-Arabic extension letter (non-Arabic members).
fn score_family(language: &str, text: &str, allowed: &[String]) -> Option<Vec<Score<'static>>> {
    let members = family(script_for_language(language))?;

    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '،' || c == '؟')
        .filter(|t| !t.is_empty())
        .collect();
    let has_extension = text.chars().any(|c| PERSO_ARABIC_EXTENSION.contains(&c));

    let scores = members
        .iter()
        .filter(|m| allowed.is_empty() || allowed.iter().any(|a| a == m.code))
        .map(|member| {
            let letters = member
                .letters
                .iter()
                .filter(|l| text.contains(**l))
                .count();
            let words = member.words.iter().filter(|w| tokens.contains(*w)).count();
            let extension = usize::from(has_extension && member.code != "ar");
            let evidence = if letters > 0 || extension > 0 {
                Evidence::Script
            } else {
                Evidence::Lexical
            };
            Score {
                member,
                points: letters * 2 + words + extension,
                evidence,
            }
        })
        .collect();
    Some(scores)
}

/// Pick the best member of `language`'s script family for `text`
///
/// Highest score wins, ties go to the earlier-ranked member. With no
/// evidence at all the family default (the last member) is used.
fn refine_in_family(language: &str, text: &str, allowed: &[String]) -> Option<Resolution> {
    let scores = score_family(language, text, allowed)?;
    if scores.len() < 2 {
        return None;
    }

    let mut best: Option<&Score> = None;
    for score in &scores {
        if score.points > 0 && best.map_or(true, |top| score.points > top.points) {
            best = Some(score);
        }
    }

    let (member, evidence) = match best {
        Some(score) => (score.member, score.evidence),
        None => (scores.last()?.member, Evidence::Script),
    };
    Some(Resolution {
        language: member.code.to_string(),
        evidence,
    })
}

/// A family member other than the tagged `language` with strictly more evidence
///
/// The provider's member keeps ties and texts with no evidence at all.
fn challenge_tag(language: &str, text: &str, allowed: &[String]) -> Option<Resolution> {
    let scores = score_family(language, text, allowed)?;
    let tagged = score_family(language, text, &[language.to_string()])?
        .first()
        .map_or(0, |s| s.points);

    let mut best: Option<&Score> = None;
    for score in scores.iter().filter(|s| s.member.code != language) {
        let top = best.map_or(tagged, |b| b.points);
        if score.points > top {
            best = Some(score);
        }
    }

    best.map(|score| Resolution {
        language: score.member.code.to_string(),
        evidence: score.evidence,
    })
}

/// Lowercased primary subtag: "en-US" → "en", "FR" → "fr"
fn normalize(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
