//! Rule-based headline scoring with a financial word list
//!
//! Valences use a -4..4 scale. Scores of a headline are summed and squashed
//! to [-1, 1] with `s / sqrt(s² + 15)`.

use std::collections::HashMap;

/// Squashing constant of the compound score
const NORMALIZATION_ALPHA: f64 = 15.0;
/// Multiplier applied to a word preceded by a negation
const NEGATION_SCALAR: f64 = -0.74;
/// Tokens before a sentiment word searched for a negation
const NEGATION_WINDOW: usize = 3;

/// Word valences, negations and intensifiers
pub struct FinancialLexicon {
    words: HashMap<String, f64>,
    negations: Vec<String>,
    intensifiers: HashMap<String, f64>,
}

impl Default for FinancialLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl FinancialLexicon {
    pub fn new() -> Self {
        let positive = [
            ("bullish", 2.9),
            ("surge", 2.2),
            ("surges", 2.2),
            ("rally", 2.0),
            ("rallies", 2.0),
            ("soar", 2.5),
            ("soars", 2.5),
            ("gain", 1.8),
            ("gains", 1.8),
            ("profit", 1.9),
            ("profits", 1.9),
            ("growth", 1.7),
            ("rise", 1.3),
            ("rises", 1.3),
            ("jump", 1.5),
            ("jumps", 1.5),
            ("beat", 1.6),
            ("beats", 1.6),
            ("record", 1.2),
            ("strong", 2.3),
            ("upgrade", 1.9),
            ("upgraded", 1.9),
            ("outperform", 2.0),
            ("optimistic", 2.1),
            ("recovery", 1.6),
            ("rebound", 1.5),
            ("win", 2.8),
            ("wins", 2.7),
            ("boost", 1.7),
            ("positive", 2.6),
            ("good", 1.9),
            ("success", 2.7),
            ("dividend", 0.9),
        ];
        let negative = [
            ("bearish", -2.9),
            ("crash", -2.8),
            ("crashes", -2.8),
            ("plunge", -2.4),
            ("plunges", -2.4),
            ("drop", -1.3),
            ("drops", -1.3),
            ("fall", -1.2),
            ("falls", -1.2),
            ("decline", -1.5),
            ("declines", -1.5),
            ("loss", -1.3),
            ("losses", -1.7),
            ("slump", -2.0),
            ("weak", -1.9),
            ("miss", -1.3),
            ("misses", -1.3),
            ("downgrade", -1.8),
            ("downgraded", -1.8),
            ("fear", -2.2),
            ("fears", -2.2),
            ("concern", -1.4),
            ("concerns", -1.4),
            ("risk", -1.1),
            ("uncertainty", -1.4),
            ("crisis", -3.1),
            ("fraud", -3.2),
            ("lawsuit", -1.7),
            ("investigation", -1.2),
            ("warning", -1.4),
            ("cut", -1.1),
            ("cuts", -1.1),
            ("layoffs", -2.0),
            ("negative", -2.7),
            ("bad", -2.5),
        ];

        let words = positive
            .iter()
            .chain(negative.iter())
            .map(|&(w, s)| (w.to_string(), s))
            .collect();

        let negations = [
            "not", "no", "never", "none", "nothing", "neither", "cannot", "without",
            "don't", "dont", "doesn't", "doesnt", "didn't", "didnt", "isn't", "isnt",
            "aren't", "arent", "wasn't", "wasnt", "won't", "wont", "hardly", "barely",
        ]
        .iter()
        .map(|w| w.to_string())
        .collect();

        let intensifiers = [
            ("very", 1.3),
            ("extremely", 1.5),
            ("highly", 1.3),
            ("sharply", 1.4),
            ("significantly", 1.3),
            ("hugely", 1.4),
            ("slightly", 0.7),
            ("somewhat", 0.8),
            ("marginally", 0.7),
        ]
        .iter()
        .map(|&(w, m)| (w.to_string(), m))
        .collect();

        Self {
            words,
            negations,
            intensifiers,
        }
    }

    pub fn get_score(&self, word: &str) -> Option<f64> {
        self.words.get(&word.to_lowercase()).copied()
    }

    pub fn is_negation(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.negations.iter().any(|n| *n == word)
    }

    pub fn get_intensifier(&self, word: &str) -> Option<f64> {
        self.intensifiers.get(&word.to_lowercase()).copied()
    }

    pub fn add_word(&mut self, word: &str, valence: f64) {
        self.words.insert(word.to_lowercase(), valence);
    }

    /// Scores `text`; the compound lies in [-1, 1]
    pub fn analyze(&self, text: &str) -> LexiconResult {
        let tokens = tokenize(text);
        let mut matched_words = Vec::new();
        let mut total = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(mut valence) = self.get_score(token) else {
                continue;
            };

            if let Some(mult) = i.checked_sub(1).and_then(|p| self.get_intensifier(&tokens[p])) {
                valence *= mult;
            }

            let window_start = i.saturating_sub(NEGATION_WINDOW);
            if tokens[window_start..i].iter().any(|t| self.is_negation(t)) {
                valence *= NEGATION_SCALAR;
            }

            total += valence;
            matched_words.push((token.clone(), valence));
        }

        LexiconResult {
            compound: normalize(total),
            raw_score: total,
            matched_words,
        }
    }
}

/// Lower-cased words with surrounding punctuation stripped; inner
/// apostrophes are kept so contractions stay intact.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .trim_matches('\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn normalize(score: f64) -> f64 {
    if score == 0.0 {
        return 0.0;
    }
    (score / (score * score + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct LexiconResult {
    /// Normalized score in [-1, 1]
    pub compound: f64,
    /// Sum of matched valences before normalization
    pub raw_score: f64,
    pub matched_words: Vec<(String, f64)>,
}
