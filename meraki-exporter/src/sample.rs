//! The flat, labeled observation produced by transformers.

use crate::registry::Family;

/// One labeled value of a metric family.
///
/// Label values are positionally aligned with the family's label names.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub family: Family,
    pub value: f64,
    pub labels: Vec<String>,
}

impl Sample {
    /// Create a sample. The label count must match the family's label names.
    pub fn new<I, S>(family: Family, value: f64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            labels.len(),
            family.descriptor().labels.len(),
            "label arity mismatch for {}",
            family
        );
        Self {
            family,
            value,
            labels,
        }
    }

    /// Value of the label called `name`, if the family has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        let index = self
            .family
            .descriptor()
            .labels
            .iter()
            .position(|l| *l == name)?;
        self.labels.get(index).map(String::as_str)
    }
}
