//! Exports the [`run_cycle`] function which stitches together the steps of a
//! generation cycle: allocating folders ([`crate::folders`]), synthesizing
//! records ([`crate::record`]), selecting internal links
//! ([`crate::links`]), and rendering pages to disk ([`crate::write`]).

use crate::config::Config;
use crate::folders::allocate_folders;
use crate::links::{related_links, render_links};
use crate::record::{synthesize_records, PageRecord, Synthesis};
use crate::store::Store;
use crate::write::{render, write_page, Error as WriteError, Substitutions};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::path::PathBuf;

/// What a cycle produced.
#[derive(Debug)]
pub struct CycleSummary {
    /// The allocated folders, relative to the output directory.
    pub folders: Vec<String>,

    /// Every synthesized record, in index order.
    pub records: Vec<PageRecord>,

    /// The path of every written file, in index order. A path appears more
    /// than once when two records share a slug.
    pub written: Vec<PathBuf>,
}

/// Runs one generation cycle: `config.page_count` pages are synthesized from
/// the store's corpus, linked to one another, and written beneath
/// `config.output_directory`. All random choices are drawn from `rng`, and
/// `now` is the cycle's clock, so a seeded RNG and a fixed `now` reproduce a
/// cycle exactly.
///
/// If the store's corpus is empty (only possible when the project requires
/// keywords), the cycle is skipped and an empty summary is returned.
pub fn run_cycle<R: Rng + ?Sized>(
    config: &Config,
    store: &Store,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<CycleSummary> {
    if store.corpus.is_empty() {
        log::warn!("No keywords available; skipping generation");
        return Ok(CycleSummary {
            folders: Vec::new(),
            records: Vec::new(),
            written: Vec::new(),
        });
    }

    let folders = allocate_folders(
        &config.output_directory,
        config.page_count,
        config.max_files_per_folder,
        &config.folders,
        rng,
    )
    .map_err(|err| Error::CreateFolder {
        path: config.output_directory.clone(),
        err,
    })?;

    let synthesis = Synthesis {
        corpus: &store.corpus,
        emojis: &config.emojis,
        title_words: config.title_words,
        description_words: config.description_words,
        text_mode: config.text_mode,
        template_count: store.templates.len(),
        now,
        backdate_days: config.backdate_days,
    };
    let records = synthesize_records(
        &folders,
        config.page_count,
        config.max_files_per_folder,
        &synthesis,
        rng,
    );

    let mut written = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let canonical_url = record.url(&config.domain);
        let links = related_links(&records, i, &config.links, &config.domain, rng);
        let internal_links = render_links(&links, &config.links);
        let content = render(
            store.template(record.template_id),
            &Substitutions {
                title: Some(&record.display_title),
                description: Some(&record.description),
                canonical_url: Some(&canonical_url),
                internal_links: Some(&internal_links),
                domain_name: Some(&config.domain),
                date: Some(&record.timestamp),
            },
        );
        let path = write_page(&config.output_directory, record, &content)?;
        log::debug!("Wrote `{}` with {} internal links", path.display(), links.len());
        written.push(path);
    }

    log::info!(
        "Generated {} pages in {} folders with internal linking.",
        records.len(),
        folders.len()
    );
    Ok(CycleSummary {
        folders,
        records,
        written,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for a generation cycle.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while creating output folders.
    CreateFolder { path: PathBuf, err: std::io::Error },

    /// Returned for errors writing pages to disk.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CreateFolder { path, err } => {
                write!(f, "Creating folders in '{}': {}", path.display(), err)
            }
            Error::Write(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CreateFolder { path: _, err } => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
