//! Allocates the output folders for a generation cycle. Each folder holds at
//! most `capacity` pages, and the pages sharing a folder form a cluster for
//! internal linking.

use crate::text::random_letters;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const SEGMENT_LEN: usize = 3;

/// Controls how folder names are chosen.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "naming")]
pub enum FolderNaming {
    /// Two random lowercase segments, e.g., `qwe/rty`.
    Random,

    /// A word from `words` (slugified) followed by one random segment, e.g.,
    /// `movies/rty`.
    Vocabulary { words: Vec<String> },
}

/// Returns the number of folders needed for `total` pages at `capacity` pages
/// per folder. This is never less than one.
pub fn folder_count(total: usize, capacity: usize) -> usize {
    let capacity = capacity.max(1);
    ((total + capacity - 1) / capacity).max(1)
}

/// Chooses [`folder_count`] distinct folder names and creates each of them
/// under `root`. Folder names are relative, `/`-separated paths. Folders that
/// already exist are left alone.
pub fn allocate_folders<R: Rng + ?Sized>(
    root: &Path,
    total: usize,
    capacity: usize,
    naming: &FolderNaming,
    rng: &mut R,
) -> std::io::Result<Vec<String>> {
    let count = folder_count(total, capacity);
    let vocabulary: Vec<String> = match naming {
        FolderNaming::Random => Vec::new(),
        FolderNaming::Vocabulary { words } => words
            .iter()
            .map(|w| slug::slugify(w))
            .filter(|w| !w.is_empty())
            .collect(),
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(count);
    let mut folders: Vec<String> = Vec::with_capacity(count);
    while folders.len() < count {
        let head = match vocabulary.choose(rng) {
            Some(word) => word.clone(),
            None => random_letters(SEGMENT_LEN, rng),
        };
        let mut folder = format!("{}/{}", head, random_letters(SEGMENT_LEN, rng));
        if seen.contains(&folder) {
            folder = format!("{}-{}", folder, folders.len());
        }
        std::fs::create_dir_all(root.join(&folder))?;
        log::debug!("Allocated folder `{}`", folder);
        seen.insert(folder.clone());
        folders.push(folder);
    }
    Ok(folders)
}
