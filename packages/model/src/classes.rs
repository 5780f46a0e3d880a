use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::ModelError;

pub const DEFAULT_CLASSES: [&str; 4] = ["help", "cannot", "speak", "hello"];

/// The closed, ordered set of gesture labels a model scores.
///
/// Order is the model's output order; it also decides ties and display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassSet(Vec<String>);

impl ClassSet {
    pub fn new<I, S>(labels: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ModelError::EmptyClasses);
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(ModelError::DuplicateClass(label.clone()));
            }
        }

        Ok(Self(labels))
    }

    /// Parses a comma separated list such as `help,cannot,speak,hello`.
    pub fn parse_list(list: &str) -> Result<Self, ModelError> {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty()),
        )
    }

    /// Reads a JSON array of label strings.
    pub fn from_labels_file(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read(path).map_err(|source| ModelError::LabelsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let labels: Vec<String> =
            serde_json::from_slice(&raw).map_err(|source| ModelError::LabelsFormat {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.iter().any(|l| l == label)
    }
}

impl Default for ClassSet {
    fn default() -> Self {
        Self(DEFAULT_CLASSES.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_set_keeps_order() {
        let classes = ClassSet::default();
        assert_eq!(classes.iter().collect::<Vec<_>>(), DEFAULT_CLASSES);
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(matches!(
            ClassSet::new(Vec::<String>::new()),
            Err(ModelError::EmptyClasses)
        ));
        assert!(matches!(
            ClassSet::new(["help", "hello", "help"]),
            Err(ModelError::DuplicateClass(label)) if label == "help"
        ));
    }

    #[test]
    fn parses_comma_lists() {
        let classes = ClassSet::parse_list(" help, cannot ,,speak,hello ").unwrap();
        assert_eq!(classes, ClassSet::default());
        assert!(matches!(ClassSet::parse_list(" , "), Err(ModelError::EmptyClasses)));
    }

    #[test]
    fn reads_labels_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["thanks", "water"]"#).unwrap();

        let classes = ClassSet::from_labels_file(file.path()).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes.get(1), Some("water"));
    }

    #[test]
    fn malformed_labels_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"labels": ["thanks"]}}"#).unwrap();

        assert!(matches!(
            ClassSet::from_labels_file(file.path()),
            Err(ModelError::LabelsFormat { .. })
        ));
    }
}
