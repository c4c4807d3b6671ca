//! # News sentiment
//!
//! Lexicon scoring of recent headlines, labelled by the sign of the
//! compound score.

mod google_news;
mod lexicon;
mod news;

pub use google_news::{GoogleNewsFeed, GOOGLE_NEWS_URL};
pub use lexicon::{FinancialLexicon, LexiconResult};
pub use news::{summarize, Headline, HeadlineFile, NewsFeed, ScoredHeadline, SentimentLabel, SentimentSummary};
