//! Headline sources and per-symbol sentiment summaries

use super::lexicon::FinancialLexicon;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    /// Symbol the headline is about; `None` matches every symbol
    #[serde(default)]
    pub symbol: Option<String>,
}

impl Headline {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
            published: None,
            symbol: None,
        }
    }

    pub fn for_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }
}

/// Source of recent headlines for a symbol
pub trait NewsFeed {
    fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>>;
}

/// Headlines stored as a JSON array on disk
#[derive(Debug, Clone)]
pub struct HeadlineFile {
    path: PathBuf,
}

impl HeadlineFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NewsFeed for HeadlineFile {
    fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening headline file {}", self.path.display()))?;
        let all: Vec<Headline> = serde_json::from_reader(file)
            .with_context(|| format!("parsing headline file {}", self.path.display()))?;

        let selected: Vec<Headline> = all
            .into_iter()
            .filter(|h| {
                h.symbol
                    .as_deref()
                    .map_or(true, |s| s.eq_ignore_ascii_case(symbol))
            })
            .take(limit)
            .collect();
        debug!("{} headlines for {} from {}", selected.len(), symbol, self.path.display());
        Ok(selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Sign of the compound score
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub headline: Headline,
    pub compound: f64,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub symbol: String,
    pub headlines: Vec<ScoredHeadline>,
    /// Mean compound score, 0 without headlines
    pub average: f64,
    pub overall: SentimentLabel,
}

impl SentimentSummary {
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.headlines.iter().filter(|h| h.label == label).count()
    }
}

/// Scores every headline and labels the average
pub fn summarize(symbol: &str, headlines: Vec<Headline>, lexicon: &FinancialLexicon) -> SentimentSummary {
    let scored: Vec<ScoredHeadline> = headlines
        .into_iter()
        .map(|headline| {
            let compound = lexicon.analyze(&headline.title).compound;
            ScoredHeadline {
                headline,
                compound,
                label: SentimentLabel::from_score(compound),
            }
        })
        .collect();

    let average = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|h| h.compound).sum::<f64>() / scored.len() as f64
    };

    SentimentSummary {
        symbol: symbol.to_string(),
        headlines: scored,
        average,
        overall: SentimentLabel::from_score(average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_labels() {
        assert_eq!(SentimentLabel::from_score(0.2), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.01), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::Positive.to_string(), "Positive");
    }

    #[test]
    fn test_summarize() {
        let lexicon = FinancialLexicon::new();
        let summary = summarize(
            "TCS.NS",
            vec![
                Headline::new("Profits surge on strong demand"),
                Headline::new("Shares slump as outlook cut"),
                Headline::new("Board meets on Friday"),
            ],
            &lexicon,
        );

        assert_eq!(summary.headlines.len(), 3);
        assert_eq!(summary.count(SentimentLabel::Positive), 1);
        assert_eq!(summary.count(SentimentLabel::Negative), 1);
        assert_eq!(summary.count(SentimentLabel::Neutral), 1);
        let mean = summary.headlines.iter().map(|h| h.compound).sum::<f64>() / 3.0;
        assert!((summary.average - mean).abs() < 1e-12);
        assert_eq!(summary.overall, SentimentLabel::from_score(mean));
    }

    #[test]
    fn test_empty_summary_is_neutral() {
        let summary = summarize("X", Vec::new(), &FinancialLexicon::new());
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.overall, SentimentLabel::Neutral);
    }

    #[test]
    fn test_headline_file_filters_by_symbol() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"title": "Infosys wins large deal", "symbol": "INFY.NS"}},
                {{"title": "Markets rally", "source": "Wire"}},
                {{"title": "TCS misses estimates", "symbol": "TCS.NS"}}
            ]"#
        )
        .unwrap();

        let feed = HeadlineFile::new(file.path());
        let headlines = feed.headlines("infy.ns", 10).unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[1].source.as_deref(), Some("Wire"));

        assert_eq!(feed.headlines("TCS.NS", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(HeadlineFile::new("/nonexistent/headlines.json").headlines("X", 5).is_err());
    }
}
