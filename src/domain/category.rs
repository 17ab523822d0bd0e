// ============================================================
// Layer 3 - Category Set
// ============================================================
// The classifier's labelled corpus: an ordered list of category
// labels, each with the names that belong to it.
//
//   categories = ["japanese", "korean"]
//   examples   = [["Abe", "Araki"], ["Kim"]]
//
// The order is fixed once the loader has built the set, because
// the model's output unit `i` means `categories[i]`.

use serde::{Deserialize, Serialize};

use crate::domain::error::NlpError;
use crate::domain::traits::TrainingExample;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySet {
    categories: Vec<String>,
    examples:   Vec<Vec<String>>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category with its examples. Re-inserting an existing
    /// label extends its examples and keeps its original position.
    pub fn insert(&mut self, category: impl Into<String>, lines: Vec<String>) {
        let category = category.into();
        match self.categories.iter().position(|c| *c == category) {
            Some(i) => self.examples[i].extend(lines),
            None => {
                self.categories.push(category);
                self.examples.push(lines);
            }
        }
    }

    /// All labels in enumeration order.
    pub fn all_categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Examples for a label, or `None` if the label is unknown.
    pub fn lines(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.examples[i].as_slice())
    }

    pub fn lines_at(&self, index: usize) -> &[String] {
        self.examples.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Label → output index.
    pub fn index_of(&self, category: &str) -> Result<usize, NlpError> {
        self.categories
            .iter()
            .position(|c| c == category)
            .ok_or_else(|| NlpError::UnknownCategory(category.to_string()))
    }

    /// Output index → label.
    pub fn category(&self, index: usize) -> Result<&str, NlpError> {
        self.categories
            .get(index)
            .map(String::as_str)
            .ok_or(NlpError::CategoryIndexOutOfRange { index, len: self.categories.len() })
    }

    /// Total number of examples across every category.
    pub fn example_count(&self) -> usize {
        self.examples.iter().map(Vec::len).sum()
    }

    /// Flatten into one `NameExample` per line, category-major order.
    pub fn to_examples(&self) -> Vec<NameExample> {
        self.categories
            .iter()
            .zip(&self.examples)
            .enumerate()
            .flat_map(|(index, (category, lines))| {
                lines.iter().map(move |name| NameExample::new(index, category.clone(), name.clone()))
            })
            .collect()
    }
}

/// One labelled name, ready to be sampled by the training loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExample {
    pub category_index: usize,
    pub category:       String,
    pub name:           String,
}

impl NameExample {
    pub fn new(category_index: usize, category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category_index,
            category: category.into(),
            name:     name.into(),
        }
    }
}

impl TrainingExample for NameExample {
    fn input_text(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> &str {
        &self.category
    }
}
