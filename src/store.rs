//! Loads the templates and the keyword corpus used by a generation cycle.
//! Missing files are not errors: templates fall back to [`FALLBACK_TEMPLATE`]
//! and the corpus falls back to [`FALLBACK_CORPUS`] unless the project
//! requires keywords.

use crate::config::Config;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Used in place of any template file that can't be found.
pub const FALLBACK_TEMPLATE: &str = "<html><head>\
    <title>{{TITLE}}</title>\
    <link rel='canonical' href='{{CANONICAL_URL}}'>\
    </head><body>\
    <h1>{{TITLE}}</h1>\
    <p>{{DESCRIPTION}}</p>\
    {{INTERNAL_LINKS}}\
    </body></html>";

/// Used when no keyword file yields any phrases.
pub const FALLBACK_CORPUS: &[&str] = &["محتوى", "تقني", "تحديث"];

const TEMPLATE_EXTENSION: &str = "html";

/// A loaded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// The template's file name, or its path relative to the templates
    /// directory.
    pub name: String,
    pub content: String,
}

/// Holds the templates and keyword phrases for a project. Records refer to
/// templates by their index in [`Store::templates`].
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub templates: Vec<Template>,
    pub corpus: Vec<String>,
}

impl Store {
    /// Loads the templates and corpus named by `config`.
    pub fn load(config: &Config) -> Result<Store> {
        let mut templates = load_templates(&config.templates)?;
        if let Some(dir) = &config.templates_directory {
            templates.extend(walk_templates(dir)?);
        }
        if templates.is_empty() {
            log::warn!("No templates configured. Using fallback template.");
            templates.push(Template {
                name: "fallback".to_owned(),
                content: FALLBACK_TEMPLATE.to_owned(),
            });
        }

        let mut corpus = load_corpus(&config.keywords)?;
        if corpus.is_empty() {
            if config.require_keywords {
                log::warn!("No keywords loaded and keywords are required");
            } else {
                log::info!("No keywords loaded. Using fallback keywords.");
                corpus = FALLBACK_CORPUS.iter().map(|k| k.to_string()).collect();
            }
        }

        Ok(Store { templates, corpus })
    }

    /// The content of template `id`, or the empty string if there is no such
    /// template.
    pub fn template(&self, id: usize) -> &str {
        self.templates
            .get(id)
            .map(|t| t.content.as_str())
            .unwrap_or_default()
    }
}

/// Loads each template file, substituting [`FALLBACK_TEMPLATE`] for files
/// that don't exist.
pub fn load_templates(paths: &[PathBuf]) -> Result<Vec<Template>> {
    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content = match read_optional(path, "template")? {
            Some(content) => {
                log::info!("Template {} loaded.", name);
                content
            }
            None => {
                log::warn!("{} not found. Using fallback template.", name);
                FALLBACK_TEMPLATE.to_owned()
            }
        };
        templates.push(Template { name, content });
    }
    Ok(templates)
}

/// Loads every `.html` file under `dir`, sorted by path. A missing directory
/// yields no templates.
pub fn walk_templates(dir: &Path) -> Result<Vec<Template>> {
    if !dir.exists() {
        log::warn!("Templates directory `{}` not found", dir.display());
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for result in WalkDir::new(dir).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        let is_template = entry.file_type().is_file()
            && entry.path().extension().map_or(false, |e| e == TEMPLATE_EXTENSION);
        if !is_template {
            continue;
        }
        let content = std::fs::read_to_string(entry.path()).map_err(|err| Error::Read {
            path: entry.path().to_owned(),
            kind: "template",
            err,
        })?;
        let name = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or_else(|_| entry.path())
            .display()
            .to_string();
        log::info!("Template {} loaded.", name);
        templates.push(Template { name, content });
    }
    Ok(templates)
}

/// Loads keyword phrases, one per line, from each file in `paths`. Lines are
/// trimmed and blank lines are dropped. Missing files are skipped.
pub fn load_corpus(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut corpus = Vec::new();
    for path in paths {
        match read_optional(path, "keywords")? {
            Some(contents) => {
                let before = corpus.len();
                corpus.extend(parse_corpus(&contents));
                log::info!(
                    "Loaded {} keywords from `{}`",
                    corpus.len() - before,
                    path.display()
                );
            }
            None => log::info!("Keywords file `{}` not found", path.display()),
        }
    }
    Ok(corpus)
}

/// Splits corpus text into trimmed, non-empty lines.
pub fn parse_corpus(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
}

fn read_optional(path: &Path, kind: &'static str) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::Read {
            path: path.to_owned(),
            kind,
            err,
        }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading templates or keywords. Missing files are not
/// errors; these are for files that exist but can't be read.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template or keyword file can't be read.
    Read {
        path: PathBuf,
        kind: &'static str,
        err: std::io::Error,
    },

    /// Returned when the templates directory can't be walked.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, kind, err } => {
                write!(f, "Reading {} file `{}`: {}", kind, path.display(), err)
            }
            Error::WalkDir(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { err, .. } => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the templates directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn testdata_config() -> Config {
        Config::from_directory(Path::new("./testdata/project/")).expect("load config")
    }

    #[test]
    fn test_parse_corpus() {
        let got: Vec<String> = parse_corpus("  one  \n\n two three\r\n   \n").collect();
        assert_eq!(vec!["one".to_owned(), "two three".to_owned()], got);
    }

    #[test]
    fn test_load_store() -> Result<()> {
        let store = Store::load(&testdata_config())?;
        let names: Vec<&str> = store.templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(vec!["main.html", "missing.html", "extra.html"], names);
        assert!(store.templates[0].content.contains("{{INTERNAL_LINKS}}"));
        assert_eq!(FALLBACK_TEMPLATE, store.templates[1].content);
        assert!(store.template(2).contains("{{DATE}}"));
        assert_eq!("", store.template(99));
        assert_eq!(
            vec!["breaking news", "فيديو رائع", "weekly roundup"],
            store.corpus
        );
        Ok(())
    }

    #[test]
    fn test_fallbacks() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::from_directory(dir.path()).expect("default config");
        let store = Store::load(&config)?;
        assert_eq!(3, store.templates.len());
        assert!(store.templates.iter().all(|t| t.content == FALLBACK_TEMPLATE));
        assert_eq!(FALLBACK_CORPUS.len(), store.corpus.len());

        config.templates.clear();
        config.require_keywords = true;
        let store = Store::load(&config)?;
        assert_eq!(1, store.templates.len());
        assert!(store.corpus.is_empty());
        Ok(())
    }

    #[test]
    fn test_walk_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(walk_templates(&dir.path().join("nope"))?.is_empty());
        Ok(())
    }
}
