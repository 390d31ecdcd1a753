//! Renders pages by literal placeholder substitution and writes them to disk.
//! There is no templating language: no loops, no conditionals, no escaping.

use crate::record::PageRecord;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A placeholder token recognized in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    Description,
    CanonicalUrl,
    InternalLinks,
    DomainName,
    Date,
}

impl Placeholder {
    /// Every placeholder, in substitution order.
    pub const ALL: [Placeholder; 6] = [
        Placeholder::Title,
        Placeholder::Description,
        Placeholder::CanonicalUrl,
        Placeholder::InternalLinks,
        Placeholder::DomainName,
        Placeholder::Date,
    ];

    /// The literal token, e.g., `{{TITLE}}`.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Title => "{{TITLE}}",
            Placeholder::Description => "{{DESCRIPTION}}",
            Placeholder::CanonicalUrl => "{{CANONICAL_URL}}",
            Placeholder::InternalLinks => "{{INTERNAL_LINKS}}",
            Placeholder::DomainName => "{{DOMAIN_NAME}}",
            Placeholder::Date => "{{DATE}}",
        }
    }
}

/// The values substituted into a template. A `None` leaves its placeholder
/// in the output verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct Substitutions<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub canonical_url: Option<&'a str>,
    pub internal_links: Option<&'a str>,
    pub domain_name: Option<&'a str>,
    pub date: Option<&'a str>,
}

impl<'a> Substitutions<'a> {
    /// The value for `placeholder`, if any.
    pub fn get(&self, placeholder: Placeholder) -> Option<&'a str> {
        match placeholder {
            Placeholder::Title => self.title,
            Placeholder::Description => self.description,
            Placeholder::CanonicalUrl => self.canonical_url,
            Placeholder::InternalLinks => self.internal_links,
            Placeholder::DomainName => self.domain_name,
            Placeholder::Date => self.date,
        }
    }
}

/// Replaces every occurrence of each placeholder in `template` with its
/// value. Placeholders are replaced one after another in
/// [`Placeholder::ALL`] order.
pub fn render(template: &str, substitutions: &Substitutions) -> String {
    let mut content = template.to_owned();
    for placeholder in Placeholder::ALL.iter() {
        if let Some(value) = substitutions.get(*placeholder) {
            content = content.replace(placeholder.token(), value);
        }
    }
    content
}

/// Writes `content` to `{output_directory}/{folder}/{filename}`, replacing
/// any existing file. The folder must already exist. Returns the path of the
/// written file.
pub fn write_page(output_directory: &Path, record: &PageRecord, content: &str) -> Result<PathBuf> {
    let path = output_directory.join(&record.folder).join(&record.filename);
    std::fs::write(&path, content).map_err(|err| Error::Write {
        path: path.clone(),
        err,
    })?;
    Ok(path)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing a page.
#[derive(Debug)]
pub enum Error {
    /// An error writing an output file.
    Write { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Write { path, err } => {
                write!(f, "Writing page `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Write { err, .. } => Some(err),
        }
    }
}
