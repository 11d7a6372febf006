// Declarative table of explanatory variables
//
// Each descriptor says how one column of a series is derived from an
// observation: a constant, a transform of the problem size, or a raw counter
// passed through. The model search reads only the resulting columns, so it
// never needs to know how they were computed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the intercept column recorded by the standard catalog
pub const CONSTANT: &str = "Constant";

/// Group shared by the problem-size transforms in the standard catalog
pub const SIZE_GROUP: u32 = 1;

/// Function of the problem size N
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeTransform {
    /// N
    Linear,
    /// N²
    Square,
    /// log10(N)
    Log10,
    /// N·log10(N)
    NLog10,
}

impl SizeTransform {
    pub fn apply(&self, n: u64) -> f64 {
        let n = n as f64;
        match self {
            SizeTransform::Linear => n,
            SizeTransform::Square => n * n,
            SizeTransform::Log10 => n.log10(),
            SizeTransform::NLog10 => n * n.log10(),
        }
    }
}

/// Where a variable's value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableSource {
    Constant,
    ProblemSize(SizeTransform),
    /// A metric supplied by the caller, under this name
    Raw(String),
}

/// One derived column of a sample series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    /// Variables sharing a group are mutually exclusive in a fitted model
    pub group: u32,
    /// Shared identity across labels (otherwise scoped to its label)
    pub is_global: bool,
    pub source: VariableSource,
}

impl VariableDescriptor {
    pub fn new(name: impl Into<String>, group: u32, source: VariableSource) -> Self {
        Self {
            name: name.into(),
            group,
            is_global: false,
            source,
        }
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    /// Value for one observation, or `None` when a raw input is missing
    pub fn evaluate(&self, problem_size: u64, raw: &BTreeMap<String, f64>) -> Option<f64> {
        match &self.source {
            VariableSource::Constant => Some(1.0),
            VariableSource::ProblemSize(transform) => Some(transform.apply(problem_size)),
            VariableSource::Raw(name) => raw.get(name).copied(),
        }
    }
}

/// A column produced for one observation
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedValue {
    pub name: String,
    pub group: u32,
    pub is_global: bool,
    pub value: f64,
}

/// Ordered set of variable descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCatalog {
    descriptors: Vec<VariableDescriptor>,
}

impl Default for VariableCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl VariableCatalog {
    /// Catalog with no derived variables; raw metrics still pass through
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Intercept plus the N, N², log(N), N·log(N) size family
    pub fn standard() -> Self {
        Self::empty()
            .with(VariableDescriptor::new(CONSTANT, 0, VariableSource::Constant))
            .with(VariableDescriptor::new(
                "N",
                SIZE_GROUP,
                VariableSource::ProblemSize(SizeTransform::Linear),
            ))
            .with(VariableDescriptor::new(
                "N2",
                SIZE_GROUP,
                VariableSource::ProblemSize(SizeTransform::Square),
            ))
            .with(VariableDescriptor::new(
                "log(N)",
                SIZE_GROUP,
                VariableSource::ProblemSize(SizeTransform::Log10),
            ))
            .with(VariableDescriptor::new(
                "NlogN",
                SIZE_GROUP,
                VariableSource::ProblemSize(SizeTransform::NLog10),
            ))
    }

    pub fn with(mut self, descriptor: VariableDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    /// Lowest group id not used by any descriptor
    pub fn first_free_group(&self) -> u32 {
        self.descriptors
            .iter()
            .map(|d| d.group + 1)
            .max()
            .unwrap_or(0)
    }

    fn claims(&self, raw_name: &str) -> bool {
        self.descriptors
            .iter()
            .any(|d| matches!(&d.source, VariableSource::Raw(name) if name == raw_name))
    }

    /// A raw metric that would land next to a catalog column of the same name
    pub fn shadows(&self, raw_name: &str) -> bool {
        !self.claims(raw_name) && self.descriptors.iter().any(|d| d.name == raw_name)
    }

    /// Columns for one observation
    ///
    /// Catalog variables come first, in catalog order. Raw metrics the catalog
    /// does not claim follow in name order, each in its own fresh group, so
    /// every counter is an independent alternative for the model search.
    pub fn evaluate(&self, problem_size: u64, raw: &BTreeMap<String, f64>) -> Vec<DerivedValue> {
        let mut row: Vec<DerivedValue> = self
            .descriptors
            .iter()
            .filter_map(|d| {
                d.evaluate(problem_size, raw).map(|value| DerivedValue {
                    name: d.name.clone(),
                    group: d.group,
                    is_global: d.is_global,
                    value,
                })
            })
            .collect();

        let mut group = self.first_free_group();
        for (name, &value) in raw {
            if self.claims(name) {
                continue;
            }
            row.push(DerivedValue {
                name: name.clone(),
                group,
                is_global: false,
                value,
            });
            group += 1;
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_size_transforms() {
        assert_eq!(SizeTransform::Linear.apply(100), 100.0);
        assert_eq!(SizeTransform::Square.apply(100), 10_000.0);
        assert!((SizeTransform::Log10.apply(100) - 2.0).abs() < 1e-12);
        assert!((SizeTransform::NLog10.apply(100) - 200.0).abs() < 1e-9);
        assert_eq!(SizeTransform::Log10.apply(1), 0.0);
    }

    #[test]
    fn test_standard_catalog_row() {
        let catalog = VariableCatalog::standard();
        let row = catalog.evaluate(1000, &raw(&[("cycles", 5.0), ("branch-misses", 0.5)]));
        let names: Vec<&str> = row.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Constant", "N", "N2", "log(N)", "NlogN", "branch-misses", "cycles"]
        );
        assert_eq!(row[0].value, 1.0);
        assert!((row[3].value - 3.0).abs() < 1e-12);
        // Each raw counter gets its own group after the catalog's groups
        assert_eq!(row[5].group, 2);
        assert_eq!(row[6].group, 3);
    }

    #[test]
    fn test_claimed_raw_metric_is_not_duplicated() {
        let catalog = VariableCatalog::empty().with(
            VariableDescriptor::new("misses", 4, VariableSource::Raw("cache-misses".into()))
                .global(),
        );
        let row = catalog.evaluate(10, &raw(&[("cache-misses", 3.0), ("cycles", 9.0)]));
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].name, "misses");
        assert!(row[0].is_global);
        assert_eq!(row[1].name, "cycles");
        assert_eq!(row[1].group, 5);
    }

    #[test]
    fn test_catalog_names_shadow_raw_metrics() {
        let catalog = VariableCatalog::standard();
        assert!(catalog.shadows("N"));
        assert!(catalog.shadows(CONSTANT));
        assert!(!catalog.shadows("cycles"));

        let passthrough = VariableCatalog::empty().with(VariableDescriptor::new(
            "cycles",
            0,
            VariableSource::Raw("cycles".into()),
        ));
        assert!(!passthrough.shadows("cycles"));
    }

    #[test]
    fn test_missing_raw_input_is_skipped() {
        let catalog = VariableCatalog::empty().with(VariableDescriptor::new(
            "instr",
            0,
            VariableSource::Raw("instructions".into()),
        ));
        let row = catalog.evaluate(10, &raw(&[("cycles", 9.0)]));
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].name, "cycles");
    }

    #[test]
    fn test_first_free_group() {
        assert_eq!(VariableCatalog::empty().first_free_group(), 0);
        assert_eq!(VariableCatalog::standard().first_free_group(), 2);
    }
}
