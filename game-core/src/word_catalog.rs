use crate::CatalogError;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// On-disk layout of `<data_dir>/<code>.json`.
#[derive(Debug, Deserialize)]
struct LanguageFile {
    wordlist: Vec<String>,
    solutions: Vec<String>,
    letters: Vec<String>,
}

/// SHA-256 hex digest of a language document.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hex digest of the file at `path`.
pub fn file_checksum(path: &Path) -> Result<String, CatalogError> {
    let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(checksum(&bytes))
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Words, solutions and alphabet for one language. Immutable once built.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    code: String,
    word_length: usize,
    wordlist: HashSet<String>,
    solutions: Vec<String>,
    letters: BTreeSet<char>,
    checksum: String,
}

impl LanguageCatalog {
    /// Parse a language document. Only words of `word_length` characters are
    /// kept; every remaining solution must also be a valid guess.
    pub fn from_json(code: &str, bytes: &[u8], word_length: usize) -> Result<Self, CatalogError> {
        let file: LanguageFile =
            serde_json::from_slice(bytes).map_err(|source| CatalogError::Parse {
                language: code.to_string(),
                source,
            })?;

        let mut catalog = Self::build(
            code,
            file.wordlist.iter().map(String::as_str),
            file.solutions.iter().map(String::as_str),
            file.letters.iter().map(String::as_str),
            word_length,
        )?;
        catalog.checksum = checksum(bytes);
        Ok(catalog)
    }

    /// Build a catalog from newline separated word lists. Lines starting with
    /// `#` are ignored.
    pub fn from_word_lists(
        code: &str,
        wordlist: &str,
        solutions: &str,
        letters: &str,
        word_length: usize,
    ) -> Result<Self, CatalogError> {
        let usable = |line: &&str| !line.trim().is_empty() && !line.trim_start().starts_with('#');

        let mut catalog = Self::build(
            code,
            wordlist.lines().filter(usable),
            solutions.lines().filter(usable),
            letters.split_whitespace(),
            word_length,
        )?;
        catalog.checksum = checksum(format!("{wordlist}\n{solutions}\n{letters}").as_bytes());
        Ok(catalog)
    }

    fn build<'a>(
        code: &str,
        wordlist: impl Iterator<Item = &'a str>,
        solutions: impl Iterator<Item = &'a str>,
        letters: impl Iterator<Item = &'a str>,
        word_length: usize,
    ) -> Result<Self, CatalogError> {
        let has_length = |word: &String| word.chars().count() == word_length;

        let wordlist: HashSet<String> = wordlist.map(normalize).filter(has_length).collect();

        let mut seen = HashSet::new();
        let solutions: Vec<String> = solutions
            .map(normalize)
            .filter(has_length)
            .filter(|word| seen.insert(word.clone()))
            .collect();

        if solutions.is_empty() {
            return Err(CatalogError::NoSolutions {
                language: code.to_string(),
                length: word_length,
            });
        }

        if let Some(word) = solutions.iter().find(|word| !wordlist.contains(*word)) {
            return Err(CatalogError::SolutionNotInWordlist {
                language: code.to_string(),
                word: word.clone(),
            });
        }

        let letters = letters
            .flat_map(|entry| normalize(entry).chars().collect::<Vec<_>>())
            .filter(|c| c.is_alphabetic())
            .collect();

        Ok(Self {
            code: code.to_string(),
            word_length,
            wordlist,
            solutions,
            letters,
            checksum: String::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    /// Exact membership test. Callers are expected to pass normalized input.
    pub fn contains(&self, word: &str) -> bool {
        self.wordlist.contains(word)
    }

    pub fn is_solution(&self, word: &str) -> bool {
        self.solutions.iter().any(|solution| solution == word)
    }

    pub fn solutions(&self) -> &[String] {
        &self.solutions
    }

    pub fn wordlist_len(&self) -> usize {
        self.wordlist.len()
    }

    /// Full alphabet; the starting value of a session's remaining letters.
    pub fn letters(&self) -> &BTreeSet<char> {
        &self.letters
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn random_solution(&self) -> Result<String, CatalogError> {
        self.random_solution_with(&mut rand::rng())
    }

    pub fn random_solution_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, CatalogError> {
        self.solutions
            .choose(rng)
            .cloned()
            .ok_or_else(|| CatalogError::NoSolutions {
                language: self.code.clone(),
                length: self.word_length,
            })
    }
}

/// Every loaded language, keyed by its short code.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    languages: BTreeMap<String, Arc<LanguageCatalog>>,
}

impl WordCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<code>.json` document in `dir`. Documents that fail to
    /// parse are skipped with a warning; an empty result is an error.
    pub fn load_dir<P: AsRef<Path>>(dir: P, word_length: usize) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut catalog = Self::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();

            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            match Self::load_file(code, &path, word_length) {
                Ok(language) => {
                    info!(
                        "Loaded language '{}': {} words, {} solutions",
                        code,
                        language.wordlist_len(),
                        language.solutions().len()
                    );
                    catalog.insert(language);
                }
                Err(e) => warn!("Skipping language file {}: {}", path.display(), e),
            }
        }

        if catalog.languages.is_empty() {
            return Err(CatalogError::UnknownLanguage(format!(
                "no usable language files in {}",
                dir.display()
            )));
        }

        Ok(catalog)
    }

    pub fn load_file(code: &str, path: &Path, word_length: usize) -> Result<LanguageCatalog, CatalogError> {
        debug!("Reading language file {}", path.display());
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        LanguageCatalog::from_json(code, &bytes, word_length)
    }

    /// Add or replace a language.
    pub fn insert(&mut self, language: LanguageCatalog) {
        self.languages
            .insert(language.code().to_string(), Arc::new(language));
    }

    pub fn get(&self, code: &str) -> Result<Arc<LanguageCatalog>, CatalogError> {
        self.languages
            .get(code)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownLanguage(code.to_string()))
    }

    pub fn contains_language(&self, code: &str) -> bool {
        self.languages.contains_key(code)
    }

    /// Language codes in sorted order.
    pub fn languages(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }

    pub fn checksum(&self, code: &str) -> Result<String, CatalogError> {
        Ok(self.get(code)?.checksum().to_string())
    }
}
