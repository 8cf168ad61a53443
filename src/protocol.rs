//! Public protocol structs for HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{ActivityKind, ActivityModel, CrosswordIssue};
use crate::generator::CrosswordEntry;
use crate::matching::{MatchingState, TextMatch};
use crate::normalize::{FieldReport, Normalized};
use crate::shuffle::DerangeMethod;

/// Normalized activity as delivered to renderers.
#[derive(Debug, Serialize)]
pub struct ActivityOut {
    #[serde(flatten)]
    pub model: ActivityModel,
    pub renderable: bool,
    pub degraded: bool,
    pub fields: Vec<FieldReport>,
    pub dropped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<CrosswordIssue>,
}

/// Convert a normalization result to the public DTO.
pub fn to_out(n: Normalized<ActivityModel>) -> ActivityOut {
    let issues = match &n.model {
        ActivityModel::Crossword(c) => c.inspect(),
        _ => vec![],
    };
    ActivityOut {
        renderable: n.model.is_renderable(),
        degraded: n.is_degraded(),
        fields: n.fields,
        dropped: n.dropped,
        issues,
        model: n.model,
    }
}

#[derive(Debug, Serialize)]
pub struct StoredOut {
    pub id: String,
    pub activity: ActivityOut,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(rename = "pdfId", alias = "pdf_id")]
    pub pdf_id: String,
    /// When false, upstream failures are returned instead of building locally.
    #[serde(default = "default_true")]
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub id: String,
    /// "generator" or "local_fallback".
    pub origin: &'static str,
    pub activity: ActivityOut,
}

#[derive(Debug, Deserialize)]
pub struct MatchingQuery {
    pub seed: Option<u64>,
}

/// Matching state plus the seed that rebuilds the same layout for grading.
#[derive(Debug, Serialize)]
pub struct MatchingOut {
    pub seed: u64,
    #[serde(flatten)]
    pub state: MatchingState,
}

/// A `(term number, definition label)` choice on a seeded layout.
#[derive(Debug, Deserialize)]
pub struct LabelChoice {
    pub number: usize,
    pub label: String,
}

/// Either text matches (`answers`) or label choices on the layout built from `seed`.
#[derive(Debug, Deserialize)]
pub struct GradeIn {
    #[serde(default)]
    pub answers: Vec<TextMatch>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub choices: Vec<LabelChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ShuffleIn {
    pub items: Vec<String>,
    #[serde(default = "default_true")]
    pub derange: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ShuffleOut {
    pub items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<DerangeMethod>,
}

/// Word list either as an array or as free text ("sol, luna, marte").
#[derive(Debug, Deserialize)]
pub struct WordSearchBuildIn {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrosswordBuildIn {
    pub entries: Vec<CrosswordEntry>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}
