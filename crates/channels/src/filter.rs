//! Device (talker) and sentence id filters.
//!
//! An entry starting with `~` excludes; plain entries include. When a list
//! has any plain entry, a sentence must match one of them.

use nmea_codec::split;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FilterList {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FilterList {
    fn new(entries: &[String]) -> Self {
        let mut list = Self::default();
        for entry in entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
            match entry.strip_prefix('~') {
                Some(negated) => list.exclude.push(negated.trim().to_ascii_uppercase()),
                None => list.include.push(entry.to_ascii_uppercase()),
            }
        }
        list
    }

    fn accepts(&self, value: &str) -> bool {
        if self.exclude.iter().any(|e| e.eq_ignore_ascii_case(value)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|i| i.eq_ignore_ascii_case(value))
    }

    fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Talker and sentence id filter of one channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceFilter {
    devices: FilterList,
    sentences: FilterList,
}

impl SentenceFilter {
    pub fn new(device_filters: &[String], sentence_filters: &[String]) -> Self {
        Self {
            devices: FilterList::new(device_filters),
            sentences: FilterList::new(sentence_filters),
        }
    }

    /// Whether `sentence` passes both lists.
    ///
    /// Lines that cannot be split only pass an empty filter.
    pub fn accepts(&self, sentence: &str) -> bool {
        if self.devices.is_empty() && self.sentences.is_empty() {
            return true;
        }
        match split(sentence) {
            Ok(raw) => self.devices.accepts(raw.talker) && self.sentences.accepts(raw.id),
            Err(_) => false,
        }
    }
}
