//! Defines [`PageRecord`], the in-memory description of one generated page,
//! and the logic for synthesizing a cycle's worth of records.

use crate::text::{build_text, display_title, random_letters, slugify, TextMode, WordRange};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// The extension appended to every slug to make a filename.
pub const HTML_EXTENSION: &str = ".html";

/// The format of [`PageRecord::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

const FALLBACK_SLUG_LEN: usize = 10;

/// One generated page. Records are created once per cycle and are not
/// modified afterwards; only the rendered files outlive the cycle.
///
/// Filenames are derived from titles and are not checked for uniqueness. Two
/// records in the same folder with the same slug resolve to the same file,
/// and the later record overwrites the earlier one.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// The human-facing title, usually wrapped in decorative symbols.
    pub display_title: String,

    /// The slug plus [`HTML_EXTENSION`].
    pub filename: String,

    /// The body text.
    pub description: String,

    /// The `/`-separated folder, relative to the output directory.
    pub folder: String,

    /// An ISO-8601 timestamp (see [`TIMESTAMP_FORMAT`]).
    pub timestamp: String,

    /// An index into the template store.
    pub template_id: usize,
}

impl PageRecord {
    /// The path of the page relative to the output directory and to the
    /// site root.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.folder, self.filename)
    }

    /// The fully qualified URL for the page on `domain`.
    pub fn url(&self, domain: &str) -> String {
        canonical_url(domain, &self.folder, &self.filename)
    }
}

/// Builds `https://{domain}/{folder}/{filename}`.
pub fn canonical_url(domain: &str, folder: &str, filename: &str) -> String {
    format!("https://{}/{}/{}", domain, folder, filename)
}

/// The inputs to [`synthesize_records`] other than the folders.
pub struct Synthesis<'a> {
    pub corpus: &'a [String],
    pub emojis: &'a [String],
    pub title_words: WordRange,
    pub description_words: WordRange,
    pub text_mode: TextMode,
    pub template_count: usize,

    /// Records are stamped with `now`, or with a uniformly random time up to
    /// `backdate_days` before it.
    pub now: DateTime<Utc>,
    pub backdate_days: u32,
}

impl Synthesis<'_> {
    /// Synthesizes a single record in `folder`.
    pub fn record<R: Rng + ?Sized>(&self, folder: &str, rng: &mut R) -> PageRecord {
        let title = build_text(self.corpus, self.title_words, self.text_mode, rng);
        let display_title = display_title(&title, self.emojis, rng);
        let mut slug = slugify(&title);
        if slug.is_empty() {
            slug = random_letters(FALLBACK_SLUG_LEN, rng);
        }

        PageRecord {
            display_title,
            filename: format!("{}{}", slug, HTML_EXTENSION),
            description: build_text(self.corpus, self.description_words, self.text_mode, rng),
            folder: folder.to_owned(),
            timestamp: self.timestamp(rng),
            template_id: match self.template_count {
                0 => 0,
                n => rng.random_range(0..n),
            },
        }
    }

    fn timestamp<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let time = match self.backdate_days {
            0 => self.now,
            // Out of chrono's range, the earliest representable time is
            // used instead.
            days => {
                let max_seconds = i64::from(days) * 24 * 60 * 60;
                let back = Duration::seconds(rng.random_range(0..=max_seconds));
                self.now
                    .checked_sub_signed(back)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
            }
        };
        time.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Synthesizes `total` records, filling each folder in order with up to
/// `capacity` records before moving to the next. Records beyond the
/// capacity of the last folder are placed in the last folder.
pub fn synthesize_records<R: Rng + ?Sized>(
    folders: &[String],
    total: usize,
    capacity: usize,
    synthesis: &Synthesis,
    rng: &mut R,
) -> Vec<PageRecord> {
    let capacity = capacity.max(1);
    let mut records = Vec::with_capacity(total);
    if folders.is_empty() {
        return records;
    }
    for i in 0..total {
        let folder = &folders[(i / capacity).min(folders.len() - 1)];
        records.push(synthesis.record(folder, rng));
    }
    records
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn synthesis<'a>(corpus: &'a [String], emojis: &'a [String]) -> Synthesis<'a> {
        Synthesis {
            corpus,
            emojis,
            title_words: WordRange { min: 2, max: 4 },
            description_words: WordRange { min: 10, max: 20 },
            text_mode: TextMode::Truncate,
            template_count: 3,
            now: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            backdate_days: 0,
        }
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(
            "https://example.com/abc/def/hello.html",
            canonical_url("example.com", "abc/def", "hello.html")
        );
    }

    #[test]
    fn test_record() {
        let corpus = vec!["Breaking News".to_owned(), "today".to_owned()];
        let emojis = vec!["✨".to_owned()];
        let mut rng = StdRng::seed_from_u64(3);
        let record = synthesis(&corpus, &emojis).record("abc/def", &mut rng);

        assert_eq!("abc/def", record.folder);
        assert_eq!("2024-03-01T12:30:00+00:00", record.timestamp);
        assert!(record.template_id < 3);
        assert!(record.display_title.starts_with("✨ "));
        assert!(record.display_title.ends_with(" ✨"));
        assert!(record.filename.ends_with(HTML_EXTENSION));
        let title = record.display_title.trim_matches(|c| c == '✨' || c == ' ');
        assert_eq!(format!("{}{}", slugify(title), HTML_EXTENSION), record.filename);
        let words = record.description.split_whitespace().count();
        assert!((10..=20).contains(&words));
    }

    #[test]
    fn test_record_fallback_slug() {
        let corpus = vec!["!!!".to_owned()];
        let mut rng = StdRng::seed_from_u64(3);
        let record = synthesis(&corpus, &[]).record("abc/def", &mut rng);
        let stem = record.filename.trim_end_matches(HTML_EXTENSION);
        assert_eq!(FALLBACK_SLUG_LEN, stem.len());
        assert!(stem.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_backdated_timestamp() {
        let corpus = vec!["a b c".to_owned()];
        let emojis: Vec<String> = Vec::new();
        let mut s = synthesis(&corpus, &emojis);
        s.backdate_days = 2;
        let mut rng = StdRng::seed_from_u64(8);
        let earliest = s.now - Duration::days(2);
        for _ in 0..50 {
            let record = s.record("x/y", &mut rng);
            let time = DateTime::parse_from_rfc3339(&record.timestamp)
                .unwrap()
                .with_timezone(&Utc);
            assert!(time <= s.now && time >= earliest, "{}", record.timestamp);
        }
    }

    #[test]
    fn test_backdate_past_calendar_range() {
        let corpus = vec!["a b c".to_owned()];
        let emojis: Vec<String> = Vec::new();
        let mut s = synthesis(&corpus, &emojis);
        s.backdate_days = u32::MAX;
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            assert!(!s.record("x/y", &mut rng).timestamp.is_empty());
        }
    }

    #[test]
    fn test_synthesize_records_fills_folders_in_order() {
        let corpus = vec!["one two".to_owned()];
        let folders = vec!["a/a".to_owned(), "b/b".to_owned(), "c/c".to_owned()];
        let mut rng = StdRng::seed_from_u64(0);
        let records = synthesize_records(&folders, 7, 3, &synthesis(&corpus, &[]), &mut rng);
        let got: Vec<&str> = records.iter().map(|r| r.folder.as_str()).collect();
        assert_eq!(vec!["a/a", "a/a", "a/a", "b/b", "b/b", "b/b", "c/c"], got);
    }

    #[test]
    fn test_synthesize_no_records() {
        let corpus = vec!["one two".to_owned()];
        let folders = vec!["a/a".to_owned()];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(synthesize_records(&folders, 0, 3, &synthesis(&corpus, &[]), &mut rng).is_empty());
        assert!(synthesize_records(&[], 4, 3, &synthesis(&corpus, &[]), &mut rng).is_empty());
    }
}
