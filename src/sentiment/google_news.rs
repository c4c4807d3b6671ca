//! Google News RSS search as a headline source

use super::news::{Headline, NewsFeed};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Base URL of Google News
pub const GOOGLE_NEWS_URL: &str = "https://news.google.com";

/// Blocking client for `/rss/search`, localized to Indian English
#[derive(Debug, Clone)]
pub struct GoogleNewsFeed {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GoogleNewsFeed {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GOOGLE_NEWS_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()
            .context("building news client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, symbol: &str) -> Result<reqwest::Url> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/rss/search", self.base_url),
            &[("q", symbol), ("hl", "en-IN"), ("gl", "IN"), ("ceid", "IN:en")],
        )?;
        Ok(url)
    }
}

impl NewsFeed for GoogleNewsFeed {
    fn headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>> {
        let url = self.search_url(symbol)?;
        debug!("News request: {}", url);

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("fetching news for {}", symbol))?;

        let headlines = parse_rss(&body).with_context(|| format!("parsing news feed for {}", symbol))?;
        debug!("{} headlines for {} from Google News", headlines.len(), symbol);
        Ok(select(headlines, symbol, limit))
    }
}

fn select(headlines: Vec<Headline>, symbol: &str, limit: usize) -> Vec<Headline> {
    headlines
        .into_iter()
        .take(limit)
        .map(|h| h.for_symbol(symbol))
        .collect()
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Source,
    Published,
}

/// Headlines of every `<item>` with a non-empty title, in feed order
fn parse_rss(body: &str) -> Result<Vec<Headline>> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut headlines = Vec::new();
    let mut item: Option<(String, String, String)> = None;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => item = Some(Default::default()),
                b"title" if item.is_some() => field = Some(Field::Title),
                b"source" if item.is_some() => field = Some(Field::Source),
                b"pubDate" if item.is_some() => field = Some(Field::Published),
                _ => field = None,
            },
            Event::Text(t) => append(&mut item, field, &t.unescape()?),
            Event::CData(c) => append(&mut item, field, &String::from_utf8_lossy(&c.into_inner())),
            Event::End(e) => {
                field = None;
                if e.name().as_ref() == b"item" {
                    if let Some((title, source, published)) = item.take() {
                        if !title.trim().is_empty() {
                            headlines.push(Headline {
                                title: title.trim().to_string(),
                                source: Some(source.trim().to_string()).filter(|s| !s.is_empty()),
                                published: parse_pub_date(&published),
                                symbol: None,
                            });
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(headlines)
}

fn append(item: &mut Option<(String, String, String)>, field: Option<Field>, text: &str) {
    if let (Some((title, source, published)), Some(field)) = (item.as_mut(), field) {
        match field {
            Field::Title => title.push_str(text),
            Field::Source => source.push_str(text),
            Field::Published => published.push_str(text),
        }
    }
}

/// RFC 2822 date, e.g. `Mon, 17 Jun 2024 07:00:00 GMT`
fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>"TCS.NS" - Google News</title>
    <link>https://news.google.com/search?q=TCS.NS</link>
    <item>
      <title>TCS Q1 profit beats estimates &amp; shares rally - Mint</title>
      <link>https://news.google.com/articles/1</link>
      <pubDate>Mon, 17 Jun 2024 07:00:00 GMT</pubDate>
      <source url="https://www.livemint.com">Mint</source>
    </item>
    <item>
      <title><![CDATA[TCS shares slip after weak guidance]]></title>
      <pubDate>not a date</pubDate>
      <source url="https://economictimes.indiatimes.com">The Economic Times</source>
    </item>
    <item>
      <title></title>
      <source url="https://example.com">Nobody</source>
    </item>
    <item>
      <title>IT stocks trade flat</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_items() {
        let headlines = parse_rss(SAMPLE).unwrap();
        assert_eq!(headlines.len(), 3);

        assert_eq!(headlines[0].title, "TCS Q1 profit beats estimates & shares rally - Mint");
        assert_eq!(headlines[0].source.as_deref(), Some("Mint"));
        assert_eq!(
            headlines[0].published,
            Some(Utc.with_ymd_and_hms(2024, 6, 17, 7, 0, 0).unwrap())
        );

        assert_eq!(headlines[1].title, "TCS shares slip after weak guidance");
        assert_eq!(headlines[1].source.as_deref(), Some("The Economic Times"));
        assert_eq!(headlines[1].published, None);

        assert_eq!(headlines[2].title, "IT stocks trade flat");
        assert_eq!(headlines[2].source, None);
        assert!(headlines.iter().all(|h| h.symbol.is_none()));
    }

    #[test]
    fn test_limit_and_symbol() {
        let selected = select(parse_rss(SAMPLE).unwrap(), "TCS.NS", 2);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|h| h.symbol.as_deref() == Some("TCS.NS")));
        assert!(select(Vec::new(), "TCS.NS", 10).is_empty());
    }

    #[test]
    fn test_empty_channel() {
        let body = r#"<rss version="2.0"><channel><title>"NOPE" - Google News</title></channel></rss>"#;
        assert!(parse_rss(body).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        assert!(parse_rss("<rss><channel><item><title>x</item></channel></rss>").is_err());
    }

    #[test]
    fn test_search_url() {
        let feed = GoogleNewsFeed::with_base_url("http://localhost:9999/").unwrap();
        assert_eq!(
            feed.search_url("TCS.NS").unwrap().as_str(),
            "http://localhost:9999/rss/search?q=TCS.NS&hl=en-IN&gl=IN&ceid=IN%3Aen"
        );
    }

    #[test]
    #[ignore] // requires network access
    fn test_fetch_live() {
        let feed = GoogleNewsFeed::new().unwrap();
        let headlines = feed.headlines("RELIANCE.NS", 10).unwrap();
        assert!(headlines.len() <= 10);
        assert!(headlines.iter().all(|h| h.symbol.as_deref() == Some("RELIANCE.NS")));
    }
}
