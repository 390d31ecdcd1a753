//! Synthesizes page text from a keyword corpus: titles, descriptions, and the
//! slugs derived from titles.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;

/// Returned by [`build_text`] when the corpus has nothing to draw from.
pub const EMPTY_CORPUS_TEXT: &str = "untitled";

/// The maximum length of a slug, in characters.
pub const MAX_SLUG_LEN: usize = 80;

/// An inclusive range of word counts.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

/// Controls how [`build_text`] reaches its target word count.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Words are cut at exactly the target count.
    Truncate,

    /// Whole corpus phrases are appended until the target count is reached,
    /// so the result may run past the target (and past `max`).
    WholePhrases,
}

impl Default for TextMode {
    fn default() -> Self {
        TextMode::Truncate
    }
}

/// Builds a string of random corpus phrases. A target length is drawn
/// uniformly from `range`, and phrases are appended until the target is met.
/// In [`TextMode::Truncate`] the result has exactly the target number of
/// words; in [`TextMode::WholePhrases`] it has at least that many.
///
/// Phrases without any words are ignored. If no phrase has words,
/// [`EMPTY_CORPUS_TEXT`] is returned.
pub fn build_text<R: Rng + ?Sized, S: AsRef<str>>(
    corpus: &[S],
    range: WordRange,
    mode: TextMode,
    rng: &mut R,
) -> String {
    let phrases: Vec<&str> = corpus
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| p.split_whitespace().next().is_some())
        .collect();
    if phrases.is_empty() {
        return EMPTY_CORPUS_TEXT.to_owned();
    }

    let target = rng.random_range(range.min..=range.max.max(range.min));
    let mut words: Vec<&str> = Vec::with_capacity(target + 16);
    while words.len() < target {
        if let Some(&phrase) = phrases.choose(rng) {
            words.extend(phrase.split_whitespace());
        }
    }

    if mode == TextMode::Truncate {
        words.truncate(target);
    }
    words.join(" ")
}

/// Converts title text into a URL-safe filename stem: lowercased, stripped of
/// everything but word characters, whitespace, and hyphens, with runs of
/// whitespace and hyphens collapsed into a single hyphen. Non-ASCII letters
/// (e.g., Arabic) are kept. The result is at most [`MAX_SLUG_LEN`]
/// characters and may be empty.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }
    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    slug.trim_end_matches('-').to_owned()
}

/// Returns `len` random lowercase ASCII letters.
pub fn random_letters<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

/// Wraps a title in two randomly chosen decorative symbols. With no symbols,
/// the title is returned as-is.
pub fn display_title<R: Rng + ?Sized, S: AsRef<str>>(
    title: &str,
    emojis: &[S],
    rng: &mut R,
) -> String {
    match (emojis.choose(rng), emojis.choose(rng)) {
        (Some(left), Some(right)) => format!("{} {} {}", left.as_ref(), title, right.as_ref()),
        _ => title.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn word_count(s: &str) -> usize {
        s.split_whitespace().count()
    }

    #[test]
    fn test_build_text_truncates_within_range() {
        let corpus = ["one two three", "four", "five six seven eight nine"];
        let range = WordRange { min: 4, max: 11 };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let text = build_text(&corpus, range, TextMode::Truncate, &mut rng);
            let n = word_count(&text);
            assert!(n >= range.min && n <= range.max, "{} words: {}", n, text);
        }
    }

    #[test]
    fn test_build_text_exact_length() {
        let corpus = ["فيديو رائع"];
        let mut rng = StdRng::seed_from_u64(1);
        let text = build_text(
            &corpus,
            WordRange { min: 5, max: 5 },
            TextMode::Truncate,
            &mut rng,
        );
        assert_eq!("فيديو رائع فيديو رائع فيديو", text);
    }

    #[test]
    fn test_build_text_whole_phrases() {
        let corpus = ["a b c d e f g"];
        let mut rng = StdRng::seed_from_u64(3);
        let text = build_text(
            &corpus,
            WordRange { min: 2, max: 3 },
            TextMode::WholePhrases,
            &mut rng,
        );
        assert_eq!("a b c d e f g", text);
    }

    #[test]
    fn test_build_text_whole_phrases_at_least_min() {
        let corpus = ["alpha beta", "gamma"];
        let range = WordRange { min: 6, max: 9 };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let text = build_text(&corpus, range, TextMode::WholePhrases, &mut rng);
            assert!(word_count(&text) >= range.min);
        }
    }

    #[test]
    fn test_build_text_empty_corpus() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty: [&str; 0] = [];
        assert_eq!(
            EMPTY_CORPUS_TEXT,
            build_text(&empty, WordRange { min: 1, max: 3 }, TextMode::Truncate, &mut rng)
        );
        assert_eq!(
            EMPTY_CORPUS_TEXT,
            build_text(&["   ", ""], WordRange { min: 1, max: 3 }, TextMode::Truncate, &mut rng)
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!("hello-world", slugify("Hello, World!"));
        assert_eq!("a-b-c", slugify("  a -- b\t\tc  "));
        assert_eq!("snake_case-ok", slugify("snake_case ok"));
        assert_eq!("فيديو-رائع", slugify("فيديو رائع"));
        assert_eq!("", slugify("!!! ???"));
    }

    #[test]
    fn test_slugify_truncates() {
        let title = "word ".repeat(40);
        let slug = slugify(&title);
        assert!(slug.chars().count() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("word-word"));
    }

    #[test]
    fn test_random_letters() {
        let mut rng = StdRng::seed_from_u64(5);
        let s = random_letters(10, &mut rng);
        assert_eq!(10, s.len());
        assert!(s.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_display_title() {
        let mut rng = StdRng::seed_from_u64(9);
        let title = display_title("news", &["🔥"], &mut rng);
        assert_eq!("🔥 news 🔥", title);
        let none: [&str; 0] = [];
        assert_eq!("news", display_title("news", &none, &mut rng));
    }
}
