//! Loads the project configuration. A project is a directory containing a
//! `pagemill.yaml` file (or any descendant of such a directory). Every key in
//! the project file is optional; a directory with no project file anywhere
//! above it is built with the defaults.

use crate::folders::FolderNaming;
use crate::links::{LinkPolicy, LinkStrategy};
use crate::text::{TextMode, WordRange};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "pagemill.yaml";

/// The domain used when neither the project file nor a `CNAME` file names
/// one.
pub const DEFAULT_DOMAIN: &str = "example.com";

/// The furthest back, in days, that `backdate_days` may reach.
pub const MAX_BACKDATE_DAYS: u32 = 36_500;

const DEFAULT_EMOJIS: &[&str] = &[
    "🔥", "🎥", "🔞", "😱", "✅", "🌟", "📺", "🎬", "✨", "💎", "⚡",
];

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Project {
    domain: Option<String>,
    output_directory: Option<PathBuf>,
    templates: Option<Vec<PathBuf>>,
    templates_directory: Option<PathBuf>,
    keywords: Option<Vec<PathBuf>>,
    require_keywords: bool,
    page_count: Option<usize>,
    max_files_per_folder: Option<usize>,
    folders: Option<FolderNaming>,
    title_words: Option<WordRange>,
    description_words: Option<WordRange>,
    text_mode: Option<TextMode>,
    emojis: Option<Vec<String>>,
    links: Option<Links>,
    backdate_days: u32,
    scrape: Option<Scrape>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Links {
    #[serde(default)]
    policy: LinkStrategy,
    same_folder: Option<usize>,
    other_folders: Option<usize>,
    heading: Option<String>,
    #[serde(default)]
    decorate: bool,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Scrape {
    sitemap_index: Option<String>,
    dedup_log: Option<PathBuf>,
    corpus_output: Option<PathBuf>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    limit: Option<usize>,
}

/// Settings for the sitemap scraper. Paths are resolved against the project
/// root.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub sitemap_index: Option<String>,
    pub dedup_log: PathBuf,
    pub corpus_output: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub limit: Option<usize>,
}

/// The resolved configuration for a project. All paths are absolute or
/// relative to the working directory (i.e., already joined onto the project
/// root).
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub domain: String,
    pub output_directory: PathBuf,
    pub templates: Vec<PathBuf>,
    pub templates_directory: Option<PathBuf>,
    pub keywords: Vec<PathBuf>,
    pub require_keywords: bool,
    pub page_count: usize,
    pub max_files_per_folder: usize,
    pub folders: FolderNaming,
    pub title_words: WordRange,
    pub description_words: WordRange,
    pub text_mode: TextMode,
    pub emojis: Vec<String>,
    pub links: LinkPolicy,
    pub backdate_days: u32,
    pub scrape: ScrapeConfig,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `pagemill.yaml`
    /// file. `dir` is resolved against the working directory first, so a
    /// relative path like `.` still reaches the real parent directories. If
    /// no project file is found, the defaults are used with `dir` as the
    /// project root.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let dir = dir.canonicalize().map_err(|err| Error::Open {
            path: dir.to_owned(),
            kind: "project directory",
            err,
        })?;
        let mut current = Some(dir.as_path());
        while let Some(d) = current {
            let path = d.join(PROJECT_FILE);
            if path.exists() {
                return Config::from_project_file(&path);
            }
            current = d.parent();
        }
        log::info!(
            "No `{}` found in `{}` or its parents; using defaults",
            PROJECT_FILE,
            dir.display()
        );
        Config::from_project(&dir, Project::default())
    }

    /// Loads the configuration from a specific project file. The file's
    /// parent directory becomes the project root.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = std::fs::File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            kind: "project file",
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)
            .map_err(|err| Error::Yaml {
                path: path.to_owned(),
                err,
            })?;
        match path.parent() {
            None => Err(Error::Invalid(format!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            ))),
            Some(root) => Config::from_project(root, project),
        }
    }

    fn from_project(root: &Path, project: Project) -> Result<Config> {
        let domain = match project.domain {
            Some(domain) => normalize_domain(&domain),
            None => load_domain(&root.join("CNAME"))?,
        };

        let links = match project.links {
            None => LinkPolicy::default(),
            Some(links) => {
                let defaults = LinkPolicy::for_strategy(links.policy);
                LinkPolicy {
                    strategy: links.policy,
                    same_folder: links.same_folder.unwrap_or(defaults.same_folder),
                    other_folders: links.other_folders.unwrap_or(defaults.other_folders),
                    heading: links.heading.unwrap_or(defaults.heading),
                    decorate: links.decorate,
                }
            }
        };

        let keywords: Vec<PathBuf> = project
            .keywords
            .unwrap_or_else(|| vec![PathBuf::from("keywords_ar.txt")])
            .iter()
            .map(|relpath| root.join(relpath))
            .collect();

        let scrape = project.scrape.unwrap_or_default();
        let scrape = ScrapeConfig {
            sitemap_index: scrape.sitemap_index,
            dedup_log: root.join(
                scrape
                    .dedup_log
                    .unwrap_or_else(|| PathBuf::from("processed_urls.txt")),
            ),
            corpus_output: match scrape.corpus_output {
                Some(relpath) => root.join(relpath),
                None => keywords
                    .first()
                    .cloned()
                    .unwrap_or_else(|| root.join("keywords_ar.txt")),
            },
            user_agent: scrape
                .user_agent
                .unwrap_or_else(|| format!("pagemill/{}", env!("CARGO_PKG_VERSION"))),
            timeout_secs: scrape.timeout_secs.unwrap_or(20),
            limit: scrape.limit,
        };

        let config = Config {
            project_root: root.to_owned(),
            domain,
            output_directory: match project.output_directory {
                Some(relpath) => root.join(relpath),
                None => root.to_owned(),
            },
            templates: project
                .templates
                .unwrap_or_else(|| {
                    ["test.html", "test1.html", "test2.html"]
                        .iter()
                        .map(PathBuf::from)
                        .collect()
                })
                .iter()
                .map(|relpath| root.join(relpath))
                .collect(),
            templates_directory: project.templates_directory.map(|d| root.join(d)),
            keywords,
            require_keywords: project.require_keywords,
            page_count: project.page_count.unwrap_or(100),
            max_files_per_folder: project.max_files_per_folder.unwrap_or(500),
            folders: project.folders.unwrap_or(FolderNaming::Random),
            title_words: project.title_words.unwrap_or(WordRange { min: 5, max: 10 }),
            description_words: project
                .description_words
                .unwrap_or(WordRange { min: 120, max: 220 }),
            text_mode: project.text_mode.unwrap_or_default(),
            emojis: project
                .emojis
                .unwrap_or_else(|| DEFAULT_EMOJIS.iter().map(|e| e.to_string()).collect()),
            links,
            backdate_days: project.backdate_days,
            scrape,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_files_per_folder == 0 {
            return Err(Error::Invalid(
                "`max_files_per_folder` must be greater than zero".to_owned(),
            ));
        }
        for (name, range) in [
            ("title_words", self.title_words),
            ("description_words", self.description_words),
        ] {
            if range.min > range.max {
                return Err(Error::Invalid(format!(
                    "`{}`: min ({}) is greater than max ({})",
                    name, range.min, range.max
                )));
            }
        }
        if self.backdate_days > MAX_BACKDATE_DAYS {
            return Err(Error::Invalid(format!(
                "`backdate_days` ({}) must be at most {}",
                self.backdate_days, MAX_BACKDATE_DAYS
            )));
        }
        if let FolderNaming::Vocabulary { words } = &self.folders {
            if words.iter().all(|w| slug::slugify(w).is_empty()) {
                return Err(Error::Invalid(
                    "`folders.words` must contain at least one usable word".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Reduces a domain marker (e.g., the contents of a `CNAME` file) to a bare
/// host name. Schemes, paths, and surrounding whitespace are dropped.
pub fn normalize_domain(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        if let Ok(url) = url::Url::parse(raw) {
            if let Some(host) = url.host_str() {
                return match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_owned(),
                };
            }
        }
    }
    raw.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_owned()
}

/// Reads the domain from a `CNAME`-style file. A missing or blank file
/// yields [`DEFAULT_DOMAIN`].
pub fn load_domain(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let domain = normalize_domain(&contents);
            if domain.is_empty() {
                Ok(DEFAULT_DOMAIN.to_owned())
            } else {
                Ok(domain)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DEFAULT_DOMAIN.to_owned()),
        Err(err) => Err(Error::Open {
            path: path.to_owned(),
            kind: "domain file",
            err,
        }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when a configuration file can't be opened.
    Open {
        path: PathBuf,
        kind: &'static str,
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid YAML or doesn't match the
    /// expected schema.
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when a configuration value is out of range.
    Invalid(String),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, kind, err } => {
                write!(f, "Opening {} `{}`: {}", kind, path.display(), err)
            }
            Error::Yaml { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
            Error::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { err, .. } => Some(err),
            Error::Yaml { err, .. } => Some(err),
            Error::Invalid(_) => None,
        }
    }
}
