//! Tolerance comparison of two result sets.
//!
//! A canonical value `a` and an alternate value `b` agree when
//! `|a - b| <= rtol * |a| + atol`. Both values missing (`NaN`) also counts as
//! agreement. Tolerances are either one number for every field or a map from
//! field name (optionally `category.field`) to tolerance with a `default`
//! entry, the same shape `params.json` uses.

use crate::result::ResultSet;
use crate::{ComponentId, ComponentType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Relative or absolute tolerance, uniform or per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tolerance {
    Uniform(f64),
    PerField(BTreeMap<String, f64>),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Uniform(1e-5)
    }
}

impl Tolerance {
    /// Tolerance for one field; lookup order is `category.field`, `field`, `default`.
    pub fn for_field(&self, category: ComponentType, field: &str) -> f64 {
        match self {
            Tolerance::Uniform(value) => *value,
            Tolerance::PerField(map) => map
                .get(&format!("{}.{}", category, field))
                .or_else(|| map.get(field))
                .or_else(|| map.get("default"))
                .copied()
                .unwrap_or(0.0),
        }
    }

    /// The tolerance applied to fields without an explicit entry.
    pub fn default_value(&self) -> f64 {
        match self {
            Tolerance::Uniform(value) => *value,
            Tolerance::PerField(map) => map.get("default").copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTolerance {
    pub rtol: Tolerance,
    pub atol: Tolerance,
}

impl Default for ComparisonTolerance {
    fn default() -> Self {
        Self {
            rtol: Tolerance::Uniform(1e-5),
            atol: Tolerance::Uniform(1e-5),
        }
    }
}

impl ComparisonTolerance {
    pub fn uniform(rtol: f64, atol: f64) -> Self {
        Self {
            rtol: Tolerance::Uniform(rtol),
            atol: Tolerance::Uniform(atol),
        }
    }
}

/// `|a - b| <= rtol * |a| + atol`, with matching `NaN`s treated as equal.
pub fn within_tolerance(canonical: f64, alternate: f64, rtol: f64, atol: f64) -> bool {
    if canonical.is_nan() || alternate.is_nan() {
        return canonical.is_nan() && alternate.is_nan();
    }
    (canonical - alternate).abs() <= rtol * canonical.abs() + atol
}

/// One field value outside tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMismatch {
    pub category: ComponentType,
    pub id: ComponentId,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<usize>,
    pub canonical: f64,
    pub alternate: f64,
    /// Allowed deviation `rtol * |canonical| + atol`
    pub allowed: f64,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.category, self.id, self.field)?;
        if let Some(phase) = self.phase {
            write!(f, "[{}]", phase)?;
        }
        write!(
            f,
            ": canonical {:e} vs alternate {:e} (allowed deviation {:e})",
            self.canonical, self.alternate, self.allowed
        )
    }
}

/// Outcome of comparing a canonical and an alternate result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub compared_values: usize,
    pub mismatches: Vec<FieldMismatch>,
    /// Category or id set differences; values are not compared for those
    pub structural: Vec<String>,
}

impl ComparisonReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty() && self.structural.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_match() {
            format!("{} values within tolerance", self.compared_values)
        } else {
            format!(
                "{} of {} values outside tolerance, {} structural difference{}",
                self.mismatches.len(),
                self.compared_values,
                self.structural.len(),
                if self.structural.len() == 1 { "" } else { "s" }
            )
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comparison: {}", self.summary())?;
        for issue in &self.structural {
            writeln!(f, "  structure: {}", issue)?;
        }
        for mismatch in &self.mismatches {
            writeln!(f, "  {}", mismatch)?;
        }
        Ok(())
    }
}

/// Compare every category, id and field of two result sets.
pub fn compare_result_sets(
    canonical: &ResultSet,
    alternate: &ResultSet,
    tolerance: &ComparisonTolerance,
) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    if canonical.symmetry != alternate.symmetry {
        report.structural.push(format!(
            "calculation modes differ: {} vs {}",
            canonical.symmetry, alternate.symmetry
        ));
        return report;
    }

    for category in alternate.categories() {
        if canonical.get(category).is_none() {
            report
                .structural
                .push(format!("{} only present in alternate result", category));
        }
    }

    for (category, records) in &canonical.components {
        let Some(other_records) = alternate.get(*category) else {
            report
                .structural
                .push(format!("{} missing from alternate result", category));
            continue;
        };

        let ids = canonical.ids(*category);
        let other_ids = alternate.ids(*category);
        if ids != other_ids {
            let ours: BTreeSet<_> = ids.iter().copied().collect();
            let theirs: BTreeSet<_> = other_ids.iter().copied().collect();
            if ours == theirs {
                report
                    .structural
                    .push(format!("{} records are ordered differently", category));
            } else {
                let missing: Vec<String> = ours.difference(&theirs).map(|id| id.to_string()).collect();
                let extra: Vec<String> = theirs.difference(&ours).map(|id| id.to_string()).collect();
                report.structural.push(format!(
                    "{} id sets differ (missing: [{}], extra: [{}])",
                    category,
                    missing.join(", "),
                    extra.join(", ")
                ));
            }
        }

        for record in records {
            let Some(other) = other_records.iter().find(|r| r.id() == record.id()) else {
                continue;
            };

            report.compared_values += 1;
            if record.energized() != other.energized() {
                report.mismatches.push(FieldMismatch {
                    category: *category,
                    id: record.id(),
                    field: "energized".to_string(),
                    phase: None,
                    canonical: f64::from(record.energized()),
                    alternate: f64::from(other.energized()),
                    allowed: 0.0,
                });
            }

            for ((field, ours), (_, theirs)) in record.fields().into_iter().zip(other.fields()) {
                let rtol = tolerance.rtol.for_field(*category, field);
                let atol = tolerance.atol.for_field(*category, field);
                let a = ours.values();
                let b = theirs.values();
                if a.len() != b.len() {
                    report.structural.push(format!(
                        "{} {} {} has {} phase(s) vs {}",
                        category,
                        record.id(),
                        field,
                        a.len(),
                        b.len()
                    ));
                    continue;
                }
                let per_phase = a.len() > 1;
                for (phase, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                    report.compared_values += 1;
                    if !within_tolerance(*x, *y, rtol, atol) {
                        report.mismatches.push(FieldMismatch {
                            category: *category,
                            id: record.id(),
                            field: field.to_string(),
                            phase: per_phase.then_some(phase),
                            canonical: *x,
                            alternate: *y,
                            allowed: rtol * x.abs() + atol,
                        });
                    }
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ApplianceOutput, CalculationSymmetry, NodeOutput, OutputRecord, PhaseValue};

    fn node(id: i32, u: f64) -> OutputRecord {
        OutputRecord::Node(NodeOutput {
            id: ComponentId::new(id),
            energized: 1,
            u_pu: PhaseValue::Scalar(u / 400.0),
            u: PhaseValue::Scalar(u),
            u_angle: PhaseValue::Scalar(0.0),
            p: PhaseValue::Scalar(0.0),
            q: PhaseValue::Scalar(0.0),
        })
    }

    fn result(nodes: Vec<OutputRecord>) -> ResultSet {
        let mut set = ResultSet::new(CalculationSymmetry::Symmetric);
        set.insert(ComponentType::Node, nodes);
        set
    }

    #[test]
    fn tolerance_formula() {
        assert!(within_tolerance(100.0, 100.0005, 1e-5, 0.0));
        assert!(!within_tolerance(100.0, 100.01, 1e-5, 0.0));
        assert!(within_tolerance(0.0, 1e-6, 0.0, 1e-5));
        assert!(within_tolerance(f64::NAN, f64::NAN, 0.0, 0.0));
        assert!(!within_tolerance(1.0, f64::NAN, 1.0, 1.0));
    }

    #[test]
    fn per_field_tolerance_lookup() {
        let tol: Tolerance = serde_json::from_str(
            r#"{"default": 1e-5, "loading": 1e-2, "line.p_from": 1e-3}"#,
        )
        .unwrap();
        assert_eq!(tol.for_field(ComponentType::Line, "p_from"), 1e-3);
        assert_eq!(tol.for_field(ComponentType::Transformer, "p_from"), 1e-5);
        assert_eq!(tol.for_field(ComponentType::Line, "loading"), 1e-2);
        assert_eq!(tol.default_value(), 1e-5);

        let uniform: Tolerance = serde_json::from_str("1e-8").unwrap();
        assert_eq!(uniform, Tolerance::Uniform(1e-8));
    }

    #[test]
    fn identical_results_match() {
        let a = result(vec![node(1, 400.0), node(2, 398.0)]);
        let report = compare_result_sets(&a, &a.clone(), &ComparisonTolerance::uniform(1e-8, 0.0));
        assert!(report.is_match(), "{}", report);
        assert_eq!(report.compared_values, 2 * (1 + 5));
    }

    #[test]
    fn value_outside_tolerance_is_reported() {
        let a = result(vec![node(1, 400.0)]);
        let b = result(vec![node(1, 401.0)]);
        let report = compare_result_sets(&a, &b, &ComparisonTolerance::uniform(1e-5, 1e-5));
        assert!(!report.is_match());
        let fields: Vec<&str> = report.mismatches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["u_pu", "u"]);
        assert!(report.mismatches[1].to_string().starts_with("node 1 u:"));
    }

    #[test]
    fn structural_differences_are_reported() {
        let a = result(vec![node(1, 400.0), node(2, 400.0)]);
        let b = result(vec![node(2, 400.0), node(1, 400.0)]);
        let report = compare_result_sets(&a, &b, &ComparisonTolerance::default());
        assert_eq!(report.structural, vec!["node records are ordered differently"]);
        assert!(report.mismatches.is_empty());

        let c = result(vec![node(1, 400.0)]);
        let report = compare_result_sets(&a, &c, &ComparisonTolerance::default());
        assert_eq!(
            report.structural,
            vec!["node id sets differ (missing: [2], extra: [])"]
        );

        let mut d = c.clone();
        d.insert(
            ComponentType::SymLoad,
            vec![OutputRecord::Appliance(ApplianceOutput {
                id: ComponentId::new(3),
                energized: 1,
                p: PhaseValue::Scalar(1.0),
                q: PhaseValue::Scalar(0.0),
                i: PhaseValue::Scalar(0.0),
                s: PhaseValue::Scalar(1.0),
                pf: PhaseValue::Scalar(1.0),
            })],
        );
        let report = compare_result_sets(&c, &d, &ComparisonTolerance::default());
        assert_eq!(report.structural, vec!["sym_load only present in alternate result"]);
    }

    #[test]
    fn per_phase_mismatch_names_the_phase() {
        let mut a = ResultSet::new(CalculationSymmetry::Asymmetric);
        let record = |p_b: f64| {
            OutputRecord::Appliance(ApplianceOutput {
                id: ComponentId::new(5),
                energized: 1,
                p: PhaseValue::PerPhase([1e3, p_b, 1e3]),
                q: PhaseValue::PerPhase([0.0; 3]),
                i: PhaseValue::PerPhase([1.0; 3]),
                s: PhaseValue::PerPhase([1e3; 3]),
                pf: PhaseValue::PerPhase([1.0; 3]),
            })
        };
        a.insert(ComponentType::AsymLoad, vec![record(1e3)]);
        let mut b = ResultSet::new(CalculationSymmetry::Asymmetric);
        b.insert(ComponentType::AsymLoad, vec![record(2e3)]);

        let report = compare_result_sets(&a, &b, &ComparisonTolerance::uniform(1e-5, 1e-5));
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].phase, Some(1));
        assert_eq!(report.mismatches[0].field, "p");
    }
}
