use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Bidirectional subject <-> row table
///
/// Rows are handed out in order of first appearance and never reassigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceIndex {
    rows: AHashMap<String, usize>,
    subjects: Vec<String>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the row for `subject`, allocating the next row on first sight.
    /// The flag is `true` when a new row was allocated.
    pub fn get_or_insert(&mut self, subject: &str) -> (usize, bool) {
        if let Some(&row) = self.rows.get(subject) {
            return (row, false);
        }
        let row = self.subjects.len();
        self.rows.insert(subject.to_string(), row);
        self.subjects.push(subject.to_string());
        (row, true)
    }

    #[inline]
    pub fn row(&self, subject: &str) -> Option<usize> {
        self.rows.get(subject).copied()
    }

    #[inline]
    pub fn subject(&self, row: usize) -> Option<&str> {
        self.subjects.get(row).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Subjects in row order
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// (row, subject) pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.subjects.iter().enumerate().map(|(row, s)| (row, s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_first_appearance() {
        let mut index = ResourceIndex::new();
        assert_eq!(index.get_or_insert("b"), (0, true));
        assert_eq!(index.get_or_insert("a"), (1, true));
        assert_eq!(index.get_or_insert("b"), (0, false));
        assert_eq!(index.len(), 2);
        assert_eq!(index.subjects(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_bidirectional_lookup() {
        let mut index = ResourceIndex::new();
        index.get_or_insert("x");
        index.get_or_insert("y");

        assert_eq!(index.row("y"), Some(1));
        assert_eq!(index.subject(1), Some("y"));
        assert_eq!(index.row("z"), None);
        assert_eq!(index.subject(2), None);
    }
}
