//! A best-effort article source for the keyword corpus. The scraper walks a
//! sitemap index, assumes its last `<loc>` entry is the most recent nested
//! sitemap, and fetches every article URL in it that hasn't been processed
//! before. Each article's title and description are appended to a keyword
//! file. This depends on the structure of the target site's sitemaps and is
//! not a general sitemap client.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches a document by URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// A [`Fetch`] implementation over HTTP.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher that sends `user_agent` and gives up on a request
    /// after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<HttpFetcher> {
        Ok(HttpFetcher {
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()?,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        Ok(self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .text()?)
    }
}

/// An article extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub description: String,
}

static RE_LOC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("valid <loc> pattern"));

/// Extracts the `<loc>` entries from a sitemap document, in document order.
pub fn extract_locs(xml: &str) -> Vec<String> {
    RE_LOC
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Parses an article out of an HTML page. The title is the text of the first
/// `<h1>`; pages without a non-empty `<h1>` produce no article. The
/// description is the page's meta description, falling back to the first
/// non-empty paragraph, falling back to the empty string.
pub fn parse_article(url: &str, html: &str) -> Option<Article> {
    let doc = Html::parse_document(html);
    let title = first_text(&doc, "h1")?;
    let description = meta_description(&doc)
        .or_else(|| first_text(&doc, "p"))
        .unwrap_or_default();
    Some(Article {
        url: url.to_owned(),
        title,
        description,
    })
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn meta_description(doc: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description']").ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|text| !text.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The set of previously processed URLs, backed by an append-only file with
/// one URL per line.
pub struct DedupLog {
    path: PathBuf,
    seen: HashSet<String>,
}

impl DedupLog {
    /// Reads the log at `path`. A missing file is an empty log.
    pub fn open(path: &Path) -> Result<DedupLog> {
        let seen = match std::fs::read_to_string(path) {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(err) => {
                return Err(Error::Io {
                    path: path.to_owned(),
                    err,
                })
            }
        };
        Ok(DedupLog {
            path: path.to_owned(),
            seen,
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Adds `url` to the log, appending it to the file. Returns `false` if
    /// the URL was already present.
    pub fn insert(&mut self, url: &str) -> Result<bool> {
        if self.seen.contains(url) {
            return Ok(false);
        }
        append_lines(&self.path, std::iter::once(url))?;
        self.seen.insert(url.to_owned());
        Ok(true)
    }
}

/// Appends each article's title and description to the corpus file at
/// `path`, one phrase per line. Empty descriptions are skipped.
pub fn append_corpus(path: &Path, articles: &[Article]) -> Result<()> {
    append_lines(
        path,
        articles
            .iter()
            .flat_map(|a| [a.title.as_str(), a.description.as_str()])
            .filter(|line| !line.is_empty()),
    )
}

/// Adds each article to the corpus file at `corpus` and then marks its URL as
/// processed in `seen`, one article at a time. If writing the corpus fails,
/// the article's URL stays out of the log and is fetched again next run.
pub fn record_articles(corpus: &Path, seen: &mut DedupLog, articles: &[Article]) -> Result<()> {
    for article in articles {
        append_corpus(corpus, std::slice::from_ref(article))?;
        seen.insert(&article.url)?;
    }
    Ok(())
}

fn append_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<()> {
    let io_err = |err| Error::Io {
        path: path.to_owned(),
        err,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    for line in lines {
        writeln!(file, "{}", line).map_err(io_err)?;
    }
    Ok(())
}

/// Walks a sitemap index and collects unseen articles.
pub struct Scraper<'a, F: Fetch> {
    pub fetcher: &'a F,
    pub sitemap_index: &'a str,

    /// The most articles to collect in one run.
    pub limit: Option<usize>,
}

impl<F: Fetch> Scraper<'_, F> {
    /// Fetches the sitemap index and its last nested sitemap, then fetches
    /// and parses each URL not already in `seen`. Failures for individual
    /// articles are logged and skipped. `seen` is not updated; pass the
    /// result to [`record_articles`] for that. Failing to fetch either
    /// sitemap is an error.
    pub fn run(&self, seen: &DedupLog) -> Result<Vec<Article>> {
        let index = self.fetcher.fetch(self.sitemap_index)?;
        let nested = match extract_locs(&index).pop() {
            Some(loc) => loc,
            None => {
                log::warn!("No <loc> entries in sitemap index `{}`", self.sitemap_index);
                return Ok(Vec::new());
            }
        };
        log::info!("Following nested sitemap `{}`", nested);
        let urls = extract_locs(&self.fetcher.fetch(&nested)?);

        let limit = self.limit.unwrap_or(usize::MAX);
        let mut articles = Vec::new();
        for url in urls {
            if articles.len() >= limit {
                break;
            }
            if seen.contains(&url) || articles.iter().any(|a: &Article| a.url == url) {
                continue;
            }
            let html = match self.fetcher.fetch(&url) {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("Skipping `{}`: {}", url, e);
                    continue;
                }
            };
            match parse_article(&url, &html) {
                Some(article) => {
                    log::info!("Scraped `{}`", article.title);
                    articles.push(article);
                }
                None => log::warn!("Skipping `{}`: no <h1> title", url),
            }
        }
        Ok(articles)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem scraping articles.
#[derive(Debug)]
pub enum Error {
    /// Returned when an HTTP request fails.
    Http(reqwest::Error),

    /// Returned when the dedup log or corpus file can't be read or written.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned by [`Fetch`] implementations for other failures.
    Fetch(String),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "{}", err),
            Error::Io { path, err } => write!(f, "'{}': {}", path.display(), err),
            Error::Fetch(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Io { err, .. } => Some(err),
            Error::Fetch(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts [`reqwest::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator on HTTP requests.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}
