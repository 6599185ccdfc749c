use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{Language, SnippetFile};

/// The languages found by one discovery pass, sorted for display.
#[derive(Debug, Default)]
pub struct LanguageIndex {
    pub generation: u64,
    languages: Vec<Arc<Language>>,
    positions: HashMap<Arc<str>, usize>,
}

impl LanguageIndex {
    pub fn languages(&self) -> &[Arc<Language>] {
        &self.languages
    }

    pub fn language(&self, language: &str) -> Option<&Arc<Language>> {
        self.positions
            .get(language)
            .map(|&position| &self.languages[position])
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Accumulates snippet files into languages while a discovery pass runs.
/// Files for the same language identifier land in one `Language`, whichever
/// source contributed them.
pub(crate) struct LanguageIndexBuilder {
    generation: u64,
    languages: Vec<Language>,
    positions: HashMap<Arc<str>, usize>,
}

impl LanguageIndexBuilder {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            languages: Vec::new(),
            positions: HashMap::default(),
        }
    }

    pub(crate) fn add_file(&mut self, snippet_file: SnippetFile) {
        let position = *self
            .positions
            .entry(snippet_file.language.clone())
            .or_insert_with(|| {
                self.languages
                    .push(Language::new(snippet_file.language.clone()));
                self.languages.len() - 1
            });
        self.languages[position]
            .snippet_files
            .push(Arc::new(snippet_file));
    }

    pub(crate) fn build(self) -> LanguageIndex {
        let mut languages = self.languages;
        languages.sort_by(|a, b| util::compare_locale_aware(&a.language, &b.language));
        let positions = languages
            .iter()
            .enumerate()
            .map(|(position, language)| (language.language.clone(), position))
            .collect();
        LanguageIndex {
            generation: self.generation,
            languages: languages.into_iter().map(Arc::new).collect(),
            positions,
        }
    }
}

/// Holds the most recently completed language index.
///
/// An index is only installed when its generation is newer than the current
/// one, so a slow pass that finishes after a later pass cannot overwrite it.
#[derive(Default)]
pub struct SnippetRegistry {
    index: RwLock<Arc<LanguageIndex>>,
}

impl SnippetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<LanguageIndex> {
        self.index.read().clone()
    }

    /// Returns whether `index` replaced the current one.
    pub fn install(&self, index: Arc<LanguageIndex>) -> bool {
        let mut current = self.index.write();
        if index.generation <= current.generation {
            log::debug!(
                "discarding snippet index generation {} (current is {})",
                index.generation,
                current.generation
            );
            return false;
        }
        *current = index;
        true
    }
}
