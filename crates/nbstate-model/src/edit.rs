#![forbid(unsafe_code)]

//! Local edits awaiting acknowledgement.

use serde::{Deserialize, Serialize};

/// One text edit against a cell's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEdit {
    Insert { pos: usize, content: String },
    Delete { pos: usize, length: usize },
}

impl ContentEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Insert { content, .. } => content.is_empty(),
            Self::Delete { length, .. } => *length == 0,
        }
    }
}

/// Edits made locally, tagged with the local version they produced.
///
/// Versions are pushed in increasing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBuffer {
    versions: Vec<(u32, Vec<ContentEdit>)>,
}

impl EditBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, version: u32, edits: Vec<ContentEdit>) {
        self.versions.push((version, edits));
    }

    /// Drop every version up to and including `until`.
    pub fn discard_until(&mut self, until: u32) {
        self.versions.retain(|(version, _)| *version > until);
    }

    /// Edits made after version `from`, up to and including `until`.
    #[must_use]
    pub fn range(&self, from: u32, until: u32) -> Vec<ContentEdit> {
        self.versions
            .iter()
            .filter(|(version, _)| *version > from && *version <= until)
            .flat_map(|(_, edits)| edits.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn latest_version(&self) -> Option<u32> {
        self.versions.last().map(|(version, _)| *version)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(pos: usize, s: &str) -> ContentEdit {
        ContentEdit::Insert {
            pos,
            content: s.into(),
        }
    }

    #[test]
    fn range_is_exclusive_then_inclusive() {
        let mut buf = EditBuffer::new();
        buf.push(1, vec![ins(0, "a")]);
        buf.push(2, vec![ins(1, "b"), ins(2, "c")]);
        buf.push(3, vec![ContentEdit::Delete { pos: 0, length: 1 }]);

        assert_eq!(buf.range(1, 2), vec![ins(1, "b"), ins(2, "c")]);
        assert_eq!(buf.range(0, 3).len(), 4);
        assert!(buf.range(3, 3).is_empty());
        assert_eq!(buf.latest_version(), Some(3));
    }

    #[test]
    fn discard_until_drops_acknowledged() {
        let mut buf = EditBuffer::new();
        for v in 1..=4 {
            buf.push(v, vec![ins(0, "x")]);
        }
        buf.discard_until(2);
        assert_eq!(buf.len(), 2);
        assert!(buf.range(0, 2).is_empty());
        buf.discard_until(10);
        assert!(buf.is_empty());
        assert_eq!(buf.latest_version(), None);
    }

    #[test]
    fn empty_edits() {
        assert!(ins(3, "").is_empty());
        assert!(!ContentEdit::Delete { pos: 0, length: 2 }.is_empty());
    }
}
