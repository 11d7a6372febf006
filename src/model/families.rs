// Mutually exclusive groups of candidate regressors
//
// A candidate model picks exactly one member from every non-empty family.

use crate::error::{EngineError, Result};
use crate::samples::SampleSeries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named set of alternative regressors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub name: String,
    pub members: Vec<String>,
}

impl Family {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Ordered list of families for one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyAssignment {
    families: Vec<Family>,
}

impl FamilyAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, family: Family) -> Self {
        self.families.push(family);
        self
    }

    /// One family per metric group of `series`, excluding the dependent
    ///
    /// Families come out in group order; members keep their column order.
    pub fn from_groups(series: &SampleSeries, dependent: &str) -> Self {
        let mut groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for metric in series.metrics.iter().filter(|m| m.name != dependent) {
            groups
                .entry(metric.group)
                .or_default()
                .push(metric.name.clone());
        }
        Self {
            families: groups
                .into_iter()
                .map(|(group, members)| Family::new(format!("group{}", group), members))
                .collect(),
        }
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Size of the biggest family (0 when there are none)
    pub fn largest_family(&self) -> usize {
        self.families.iter().map(Family::len).max().unwrap_or(0)
    }

    /// Number of candidate models, ignoring empty families
    pub fn combinations(&self) -> u128 {
        self.families
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| f.len() as u128)
            .product()
    }

    /// Check the assignment against the variables available to a search
    ///
    /// Returns each non-empty family as indices into `available`.
    pub(crate) fn resolve(
        &self,
        label: &str,
        available: &[String],
        dependent: &str,
    ) -> Result<Vec<Vec<usize>>> {
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::with_capacity(self.families.len());
        for family in self.families.iter().filter(|f| !f.is_empty()) {
            let mut indices = Vec::with_capacity(family.len());
            for member in &family.members {
                if member == dependent {
                    return Err(EngineError::DependentInFamily {
                        metric: member.clone(),
                    });
                }
                let index = available.iter().position(|name| name == member).ok_or_else(|| {
                    EngineError::UnknownFamilyMember {
                        label: label.to_string(),
                        family: family.name.clone(),
                        metric: member.clone(),
                    }
                })?;
                if !seen.insert(member.as_str()) {
                    return Err(EngineError::DuplicateFamilyMember {
                        metric: member.clone(),
                    });
                }
                indices.push(index);
            }
            resolved.push(indices);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::SampleTable;

    fn series() -> SampleSeries {
        let mut table = SampleTable::new();
        let raw = BTreeMap::from([
            ("cycles".to_string(), 10.0),
            ("misses".to_string(), 1.0),
        ]);
        table.record("sort", 8, &raw).unwrap();
        table.series("sort").unwrap().clone()
    }

    fn names(series: &SampleSeries) -> Vec<String> {
        series.metric_names()
    }

    #[test]
    fn test_from_groups() {
        let assignment = FamilyAssignment::from_groups(&series(), "cycles");
        let families = assignment.families();
        assert_eq!(families.len(), 3);
        assert_eq!(families[0].members, vec!["Constant"]);
        assert_eq!(families[1].members, vec!["N", "N2", "log(N)", "NlogN"]);
        assert_eq!(families[2].members, vec!["misses"]);
        assert_eq!(assignment.largest_family(), 4);
        assert_eq!(assignment.combinations(), 4);
    }

    #[test]
    fn test_resolve_indices() {
        let series = series();
        let assignment = FamilyAssignment::new()
            .with(Family::new("size", ["N", "N2"]))
            .with(Family::new("empty", Vec::<String>::new()))
            .with(Family::new("constant", ["Constant"]));
        let resolved = assignment.resolve("sort", &names(&series), "cycles").unwrap();
        assert_eq!(resolved, vec![vec![1, 2], vec![0]]);
    }

    #[test]
    fn test_resolve_unknown_member() {
        let series = series();
        let assignment = FamilyAssignment::new().with(Family::new("size", ["N3"]));
        let err = assignment.resolve("sort", &names(&series), "cycles");
        assert!(matches!(err, Err(EngineError::UnknownFamilyMember { .. })));
    }

    #[test]
    fn test_resolve_dependent_in_family() {
        let series = series();
        let assignment = FamilyAssignment::new().with(Family::new("size", ["N", "cycles"]));
        let err = assignment.resolve("sort", &names(&series), "cycles");
        assert!(matches!(err, Err(EngineError::DependentInFamily { .. })));
    }

    #[test]
    fn test_resolve_duplicate_member() {
        let series = series();
        let assignment = FamilyAssignment::new()
            .with(Family::new("a", ["N"]))
            .with(Family::new("b", ["N", "N2"]));
        let err = assignment.resolve("sort", &names(&series), "cycles");
        assert!(matches!(err, Err(EngineError::DuplicateFamilyMember { .. })));
    }
}
