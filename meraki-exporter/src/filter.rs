//! Family selection from include/exclude glob lists.

use crate::config::FilterConfig;
use crate::registry::Family;

/// Decides which metric families are described and collected.
#[derive(Debug, Clone)]
pub struct FamilyFilter {
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl FamilyFilter {
    /// Create a new filter from configuration. Invalid patterns are ignored;
    /// `ExporterConfig::validate` rejects them before this point.
    pub fn new(config: &FilterConfig) -> Self {
        let include = config
            .include_families
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        let exclude = config
            .exclude_families
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        Self { include, exclude }
    }

    pub fn is_enabled(&self, family: Family) -> bool {
        let name = family.name();

        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }
        if self.exclude.iter().any(|p| p.matches(name)) {
            return false;
        }

        true
    }

    /// Enabled families in exposition order.
    pub fn enabled_families(&self) -> Vec<Family> {
        Family::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }

    /// Whether at least one of `families` is enabled.
    pub fn any_enabled(&self, families: &[Family]) -> bool {
        families.iter().any(|f| self.is_enabled(*f))
    }
}

impl Default for FamilyFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
