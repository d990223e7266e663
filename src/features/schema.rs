//! Ordered feature names and their resolution against source columns.

use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of each schema feature among `columns`, in schema order.
    ///
    /// Names are compared trimmed. Every absent name is reported in one
    /// `Schema` error.
    pub fn resolve<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(self.names.len());
        let mut missing = Vec::new();
        for name in &self.names {
            let wanted = name.trim();
            match columns.iter().position(|c| c.as_ref().trim() == wanted) {
                Some(i) => indices.push(i),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(DetectError::Schema { missing });
        }
        Ok(indices)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(super::FLOW_FEATURES)
    }
}

impl From<&crate::config::FeaturesConfig> for FeatureSchema {
    fn from(config: &crate::config::FeaturesConfig) -> Self {
        Self::new(config.columns.iter().cloned())
    }
}
