// Narrative (LLM-style) similarity judgments.
//
// Two sources produce the same `Narrative` shape:
// - a chat-completion backend answering a fixed JSON prompt, parsed here;
// - a deterministic fallback that maps an embedding cosine score onto a
//   fixed table of canned phrases.
//
// The score bands are a fixed policy, not a fitted model:
//   > 0.8 highly similar, > 0.6 moderately similar,
//   > 0.4 somewhat similar, otherwise largely dissimilar.

use serde::{Deserialize, Serialize};

/// Score substituted when a chat response cannot be parsed.
pub const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Chat,
    Embedding,
}

/// A qualitative similarity judgment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub score: f64,
    pub reasoning: String,
    pub key_similarities: Vec<String>,
    pub key_differences: Vec<String>,
    pub source: NarrativeSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

struct Band {
    floor: f64,
    label: &'static str,
    similarities: &'static [&'static str],
    differences: &'static [&'static str],
}

/// Checked top to bottom; the first band whose floor the score exceeds wins.
static BANDS: [Band; 4] = [
    Band {
        floor: 0.8,
        label: "highly similar",
        similarities: &[
            "Both documents cover the same core subject matter",
            "Key concepts and terminology closely align",
            "Overall meaning and intent are nearly equivalent",
        ],
        differences: &["Differences are limited to wording and emphasis"],
    },
    Band {
        floor: 0.6,
        label: "moderately similar",
        similarities: &[
            "The documents address related topics",
            "Several key concepts overlap",
        ],
        differences: &[
            "Focus and level of detail differ",
            "Some concepts appear in only one document",
        ],
    },
    Band {
        floor: 0.4,
        label: "somewhat similar",
        similarities: &["The documents share some thematic elements"],
        differences: &[
            "The main subjects differ noticeably",
            "Most concepts are not shared",
        ],
    },
    Band {
        floor: f64::NEG_INFINITY,
        label: "largely dissimilar",
        similarities: &["Little meaningful overlap in content"],
        differences: &[
            "The documents address different subjects",
            "Terminology and concepts diverge substantially",
        ],
    },
];

fn band_for(score: f64) -> &'static Band {
    BANDS
        .iter()
        .find(|b| score > b.floor)
        .unwrap_or(&BANDS[BANDS.len() - 1])
}

/// Qualitative label for a similarity score.
pub fn similarity_label(score: f64) -> &'static str {
    band_for(score).label
}

/// Build a deterministic narrative from an embedding cosine score.
pub fn narrative_from_score(score: f64) -> Narrative {
    let band = band_for(score);
    Narrative {
        score,
        reasoning: format!(
            "Based on embedding analysis, the documents are {} (cosine similarity {:.3}).",
            band.label, score
        ),
        key_similarities: band.similarities.iter().map(|s| s.to_string()).collect(),
        key_differences: band.differences.iter().map(|s| s.to_string()).collect(),
        source: NarrativeSource::Embedding,
        note: None,
    }
}

/// The JSON object the chat prompt asks for.
#[derive(Debug, Deserialize)]
struct ChatJudgment {
    similarity_score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    key_similarities: Vec<String>,
    #[serde(default)]
    key_differences: Vec<String>,
}

/// Parse a chat completion into a narrative.
///
/// Markdown code fences and any prose around the outermost `{...}` are
/// ignored. Anything that still fails to parse yields `NEUTRAL_SCORE` with
/// a note instead of an error.
pub fn parse_chat_judgment(content: &str) -> Narrative {
    let candidate = extract_json_object(content).unwrap_or(content);

    match serde_json::from_str::<ChatJudgment>(candidate) {
        Ok(j) if j.similarity_score.is_finite() => Narrative {
            score: j.similarity_score.clamp(0.0, 1.0),
            reasoning: j.reasoning,
            key_similarities: j.key_similarities,
            key_differences: j.key_differences,
            source: NarrativeSource::Chat,
            note: None,
        },
        Ok(_) => neutral("similarity_score was not a finite number".to_string()),
        Err(e) => neutral(format!("could not parse chat response as JSON: {e}")),
    }
}

fn neutral(note: String) -> Narrative {
    Narrative {
        score: NEUTRAL_SCORE,
        reasoning: "The model response could not be interpreted; a neutral score was used."
            .to_string(),
        key_similarities: Vec::new(),
        key_differences: Vec::new(),
        source: NarrativeSource::Chat,
        note: Some(note),
    }
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}
