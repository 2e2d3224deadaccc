//! String translation between a source and an active language.
//!
//! Languages are static parallel string tables: entry `i` of the active
//! language translates entry `i` of the source language. Lookup is a
//! linear scan over the source table; any miss (no tables set, string not
//! found, active table shorter than the source) falls through to the
//! input string, so untranslated UIs keep working.

/// A static string table for one language.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    pub name: &'static str,
    pub entries: &'static [&'static str],
}

/// Translation state: one source language and one active language.
#[derive(Debug, Default)]
pub struct Translator {
    source: Option<&'static Language>,
    active: Option<&'static Language>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language widget labels are written in.
    pub fn set_source(&mut self, language: &'static Language) {
        self.source = Some(language);
    }

    /// Set the language to display.
    pub fn set_active(&mut self, language: &'static Language) {
        self.active = Some(language);
    }

    pub fn active(&self) -> Option<&'static Language> {
        self.active
    }

    /// Translate `text`, or return it unchanged when no translation
    /// applies.
    pub fn get<'a>(&self, text: &'a str) -> &'a str {
        let (Some(source), Some(active)) = (self.source, self.active) else {
            return text;
        };
        for (i, entry) in source.entries.iter().enumerate() {
            if *entry == text {
                return active.entries.get(i).copied().unwrap_or(text);
            }
        }
        text
    }
}
