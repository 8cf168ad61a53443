//! Seed data: sample activities and a small vocabulary for local generation.

use serde_json::json;

use crate::domain::{ActivityKind, RawActivity};
use crate::generator::CrosswordEntry;

/// Sample activities stored at startup so the service is useful without
/// the upstream generator. Each one uses a different historical payload shape.
pub fn seed_activities() -> Vec<(String, RawActivity)> {
  vec![
    (
      "sample-word-search".into(),
      RawActivity {
        kind: ActivityKind::WordSearch,
        data: json!({
          "grid": [
            ["M", "A", "R", "K", "E", "T"],
            ["I", "N", "G", "D", "I", "G"],
            ["I", "T", "A", "L", "S", "O"],
            ["C", "O", "N", "T", "E", "N"],
            ["T", "O", "S", "E", "O", "S"],
          ],
          "words": ["MARKETING", "DIGITAL", "SEO", "CONTENIDOS"],
          "solution": [],
        }),
      },
    ),
    (
      "sample-crossword".into(),
      RawActivity {
        kind: ActivityKind::Crossword,
        data: json!({
          "grid": ["C###S", "####E", "####O", "MARKE", "####T"],
          "clues": {
            "across": [{ "number": 2, "clue": "Disciplina de promoción", "answer": "MARKE" }],
            "down": [{ "number": 1, "clue": "Estrategia de posicionamiento", "answer": "SEO" }],
          },
        }),
      },
    ),
    (
      "sample-word-connection".into(),
      RawActivity {
        kind: ActivityKind::WordConnection,
        data: json!({
          "words": ["SEO", "SEM", "Branding"],
          "concepts": ["Optimización en buscadores", "Publicidad en buscadores", "Gestión de marca"],
          "pairs": [
            { "word": "SEO", "concept": "Optimización en buscadores" },
            { "word": "SEM", "concept": "Publicidad en buscadores" },
            { "word": "Branding", "concept": "Gestión de marca" },
          ],
        }),
      },
    ),
  ]
}

/// Vocabulary used when an activity has to be generated locally.
pub fn seed_vocabulary() -> Vec<CrosswordEntry> {
  [
    ("SEO", "Optimización para motores de búsqueda"),
    ("MARKETING", "Disciplina de promoción de productos"),
    ("BRANDING", "Gestión de marca"),
    ("CONTENIDO", "Material que se publica para atraer audiencia"),
    ("DIGITAL", "Que usa medios electrónicos"),
    ("CLIENTE", "Persona que compra un producto"),
    ("CAMPAÑA", "Conjunto de acciones publicitarias"),
  ]
  .iter()
  .map(|(answer, clue)| CrosswordEntry { clue: clue.to_string(), answer: answer.to_string() })
  .collect()
}
