// SPDX-License-Identifier: GPL-3.0-only

//! Table of known names and their feature vectors
//!
//! Classification is plain nearest neighbour by Euclidean distance. There is
//! no rejection threshold: whenever at least one comparable reference exists,
//! the closest one names the detection, however far away it is. When two
//! references are equally close, the one listed first wins.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use super::Label;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSet {
    names: Vec<String>,
    encodings: Vec<Vec<f32>>,
}

impl ReferenceSet {
    /// Build from parallel name and encoding lists
    pub fn new(names: Vec<String>, encodings: Vec<Vec<f32>>) -> AppResult<Self> {
        let set = Self { names, encodings };
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> AppResult<()> {
        if self.names.len() != self.encodings.len() {
            return Err(AppError::Reference(format!(
                "{} names but {} encodings",
                self.names.len(),
                self.encodings.len()
            )));
        }
        Ok(())
    }

    /// Load a reference set saved with [`ReferenceSet::save`]
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Reference(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let set: Self = serde_json::from_str(&content).map_err(|e| {
            AppError::Reference(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        set.validate()?;
        info!(path = %path.display(), count = set.len(), "Reference set loaded");
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Reference(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index and distance of the closest reference.
    ///
    /// References whose dimension differs from `features` are not comparable
    /// and are skipped.
    pub fn nearest(&self, features: &[f32]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (index, encoding) in self.encodings.iter().enumerate() {
            if encoding.len() != features.len() {
                trace!(index, expected = features.len(), got = encoding.len(), "Skipping reference");
                continue;
            }
            let distance = euclidean_distance(encoding, features);
            // Strictly closer only, so the first of equals is kept
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best
    }

    /// Name of the nearest reference, or `Unknown` if nothing is comparable
    pub fn classify(&self, features: &[f32]) -> Label {
        match self.nearest(features) {
            Some((index, _)) => Label::Named(self.names[index].clone()),
            None => Label::Unknown,
        }
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReferenceSet {
        ReferenceSet::new(
            vec!["Ada".into(), "Grace".into()],
            vec![vec![0.0, 0.0], vec![10.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_name_wins() {
        let set = sample();
        assert_eq!(set.classify(&[1.0, 0.0]), Label::Named("Ada".into()));
        assert_eq!(set.classify(&[9.0, 0.0]), Label::Named("Grace".into()));
    }

    #[test]
    fn test_far_away_still_classified() {
        let set = sample();
        assert_eq!(set.classify(&[1.0e6, 1.0e6]), Label::Named("Grace".into()));
        assert_eq!(set.classify(&[-1.0e6, 0.0]), Label::Named("Ada".into()));
    }

    #[test]
    fn test_tie_keeps_first() {
        let set = sample();
        assert_eq!(set.classify(&[5.0, 0.0]), Label::Named("Ada".into()));
    }

    #[test]
    fn test_mismatched_dimension_is_unknown() {
        let set = sample();
        assert_eq!(set.classify(&[1.0, 2.0, 3.0]), Label::Unknown);
    }

    #[test]
    fn test_rejects_unequal_lengths() {
        assert!(ReferenceSet::new(vec!["Ada".into()], vec![]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.json");
        let set = sample();
        set.save(&path).unwrap();
        assert_eq!(ReferenceSet::load(&path).unwrap(), set);
    }
}
