//! Matching exercise built from a word-connection activity.
//!
//! Terms are numbered `1..n` in pair order; the definition column is a
//! derangement of the term column (by definition text) and is labelled
//! `A, B, …, Z, AA, …`. The answer key maps term numbers to labels.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionPair, WordConnectionModel};
use crate::shuffle::{derange, DerangeMethod};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Term {
    pub number: usize,
    pub text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(skip)]
    definition: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Definition {
    pub label: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchingExercise {
    pub terms: Vec<Term>,
    pub definitions: Vec<Definition>,
    pub answer_key: BTreeMap<usize, String>,
    pub arrangement: DerangeMethod,
}

/// What a matching view should show.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchingState {
    /// No payload has arrived yet.
    Awaiting,
    /// A payload arrived but produced zero usable pairs.
    NoValidPairs,
    Ready { exercise: MatchingExercise },
}

impl MatchingState {
    pub fn from_model<R: Rng + ?Sized>(model: Option<&WordConnectionModel>, max_attempts: usize, rng: &mut R) -> Self {
        match model {
            None => MatchingState::Awaiting,
            Some(m) if m.items.is_empty() => MatchingState::NoValidPairs,
            Some(m) => MatchingState::Ready { exercise: MatchingExercise::build(&m.items, max_attempts, rng) },
        }
    }
}

/// A definition slot. Compares by text only, so two pairs sharing a definition
/// count as the same value for the derangement check.
#[derive(Clone, Debug)]
struct Slot {
    pair: usize,
    text: String,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl MatchingExercise {
    pub fn build<R: Rng + ?Sized>(pairs: &[ConnectionPair], max_attempts: usize, rng: &mut R) -> Self {
        let terms: Vec<Term> = pairs
            .iter()
            .enumerate()
            .map(|(i, p)| Term { number: i + 1, text: p.left.clone(), note: p.note.clone(), definition: p.right.clone() })
            .collect();

        let slots: Vec<Slot> = pairs.iter().enumerate().map(|(i, p)| Slot { pair: i, text: p.right.clone() }).collect();
        let arranged = derange(&slots, max_attempts, rng);

        let mut answer_key = BTreeMap::new();
        let definitions = arranged
            .items
            .into_iter()
            .enumerate()
            .map(|(j, slot)| {
                let label = column_label(j);
                answer_key.insert(slot.pair + 1, label.clone());
                Definition { label, text: slot.text }
            })
            .collect();

        Self { terms, definitions, answer_key, arrangement: arranged.method }
    }

    /// Grade `(term number, definition label)` choices. A choice is right when
    /// the chosen definition's text is the term's definition, so duplicates
    /// accept either label. Later choices for the same term replace earlier ones.
    pub fn grade(&self, answers: &[(usize, String)]) -> MatchScore {
        let chosen: BTreeMap<usize, &str> = answers.iter().map(|(n, l)| (*n, l.as_str())).collect();
        let mut wrong = vec![];
        for term in &self.terms {
            let ok = chosen
                .get(&term.number)
                .and_then(|label| self.definitions.iter().find(|d| d.label.eq_ignore_ascii_case(label)))
                .is_some_and(|d| d.text == term.definition);
            if !ok {
                wrong.push(term.number);
            }
        }
        MatchScore { correct: self.terms.len() - wrong.len(), total: self.terms.len(), wrong }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MatchScore {
    pub correct: usize,
    pub total: usize,
    /// Term numbers (or pair indices for text grading) answered wrong or left blank.
    pub wrong: Vec<usize>,
}

/// A submitted match given by texts rather than labels.
#[derive(Clone, Debug, Deserialize)]
pub struct TextMatch {
    pub left: String,
    pub right: String,
}

/// Grade text matches directly against the model. Comparison trims and
/// ignores case. `wrong` holds zero-based pair indices.
pub fn grade_texts(model: &WordConnectionModel, answers: &[TextMatch]) -> MatchScore {
    let same = |a: &str, b: &str| a.trim().to_lowercase() == b.trim().to_lowercase();
    let mut wrong = vec![];
    for (i, pair) in model.items.iter().enumerate() {
        let ok = answers
            .iter()
            .rev()
            .find(|a| same(&a.left, &pair.left))
            .is_some_and(|a| same(&a.right, &pair.right));
        if !ok {
            wrong.push(i);
        }
    }
    MatchScore { correct: model.items.len() - wrong.len(), total: model.items.len(), wrong }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`, spreadsheet style.
pub fn column_label(mut index: usize) -> String {
    let mut out = vec![];
    loop {
        out.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pairs(raw: &[(&str, &str)]) -> Vec<ConnectionPair> {
        raw.iter()
            .map(|(l, r)| ConnectionPair { left: l.to_string(), right: r.to_string(), note: String::new() })
            .collect()
    }

    #[test]
    fn labels_follow_spreadsheet_columns() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(701), "ZZ");
        assert_eq!(column_label(702), "AAA");
    }

    #[test]
    fn no_definition_sits_next_to_its_own_term() {
        let ps = pairs(&[("Sol", "Estrella"), ("Luna", "Satélite"), ("Marte", "Planeta"), ("Agua", "Líquido")]);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ex = MatchingExercise::build(&ps, 64, &mut rng);
            for (term, def) in ex.terms.iter().zip(&ex.definitions) {
                assert_ne!(term.definition, def.text);
            }
            assert_eq!(ex.answer_key.len(), 4);
        }
    }

    #[test]
    fn terms_keep_pair_order() {
        let ps = pairs(&[("uno", "1"), ("dos", "2"), ("tres", "3")]);
        let mut rng = StdRng::seed_from_u64(11);
        let ex = MatchingExercise::build(&ps, 64, &mut rng);
        let numbered: Vec<(usize, &str)> = ex.terms.iter().map(|t| (t.number, t.text.as_str())).collect();
        assert_eq!(numbered, vec![(1, "uno"), (2, "dos"), (3, "tres")]);
    }

    #[test]
    fn answer_key_grades_perfectly() {
        let ps = pairs(&[("uno", "1"), ("dos", "2"), ("tres", "3")]);
        let mut rng = StdRng::seed_from_u64(5);
        let ex = MatchingExercise::build(&ps, 64, &mut rng);
        let answers: Vec<(usize, String)> = ex.answer_key.iter().map(|(n, l)| (*n, l.to_lowercase())).collect();
        let score = ex.grade(&answers);
        assert_eq!(score, MatchScore { correct: 3, total: 3, wrong: vec![] });

        let partial = ex.grade(&answers[..1]);
        assert_eq!((partial.correct, partial.total), (1, 3));
        assert_eq!(partial.wrong.len(), 2);
    }

    #[test]
    fn shared_definitions_accept_either_label() {
        let ps = pairs(&[("perro", "animal"), ("gato", "animal"), ("rosa", "flor"), ("pino", "árbol")]);
        let mut rng = StdRng::seed_from_u64(9);
        let ex = MatchingExercise::build(&ps, 64, &mut rng);
        let labels_for_animal: Vec<String> =
            ex.definitions.iter().filter(|d| d.text == "animal").map(|d| d.label.clone()).collect();
        let perro = ex.terms.iter().find(|t| t.text == "perro").unwrap().number;
        for label in labels_for_animal {
            assert_eq!(ex.grade(&[(perro, label)]).correct, 1);
        }
    }

    #[test]
    fn state_distinguishes_awaiting_from_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(MatchingState::from_model(None, 64, &mut rng), MatchingState::Awaiting));
        let empty = WordConnectionModel::default();
        assert!(matches!(MatchingState::from_model(Some(&empty), 64, &mut rng), MatchingState::NoValidPairs));
        let one = WordConnectionModel { items: pairs(&[("a", "b")]) };
        match MatchingState::from_model(Some(&one), 64, &mut rng) {
            MatchingState::Ready { exercise } => {
                assert_eq!(exercise.terms.len(), 1);
                assert_eq!(exercise.arrangement, DerangeMethod::Unchanged);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn text_grading_is_case_and_space_insensitive() {
        let model = WordConnectionModel { items: pairs(&[("Sol", "Estrella"), ("Luna", "Satélite")]) };
        let answers = vec![
            TextMatch { left: " sol".into(), right: "ESTRELLA ".into() },
            TextMatch { left: "Luna".into(), right: "Estrella".into() },
        ];
        assert_eq!(grade_texts(&model, &answers), MatchScore { correct: 1, total: 2, wrong: vec![1] });
    }
}
