//! Canonical result sets.
//!
//! A [`ResultSet`] maps each category to the per-component output records a
//! power-flow calculation produced, in the order of the canonical input.
//! Symmetric calculations yield scalar quantities, asymmetric ones yield one
//! value per phase; [`PhaseValue`] covers both so the same record types serve
//! either mode.
//!
//! Missing values are `NaN` in memory and `null` on the wire.

use crate::error::PfxError;
use crate::{ComponentId, ComponentKind, ComponentType};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Calculation mode of a power-flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationSymmetry {
    Symmetric,
    Asymmetric,
}

impl CalculationSymmetry {
    pub const ALL: [CalculationSymmetry; 2] =
        [CalculationSymmetry::Symmetric, CalculationSymmetry::Asymmetric];

    /// Short tag used in file and directory names (`sym` / `asym`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationSymmetry::Symmetric => "sym",
            CalculationSymmetry::Asymmetric => "asym",
        }
    }

    /// Dataset `type` of a result file in this mode.
    pub fn output_type(&self) -> &'static str {
        match self {
            CalculationSymmetry::Symmetric => "sym_output",
            CalculationSymmetry::Asymmetric => "asym_output",
        }
    }

    pub fn from_output_type(kind: &str) -> Option<Self> {
        match kind {
            "sym_output" => Some(CalculationSymmetry::Symmetric),
            "asym_output" => Some(CalculationSymmetry::Asymmetric),
            _ => None,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, CalculationSymmetry::Symmetric)
    }

    pub fn phases(&self) -> usize {
        match self {
            CalculationSymmetry::Symmetric => 1,
            CalculationSymmetry::Asymmetric => 3,
        }
    }

    pub fn from_str(input: &str) -> Result<Self, PfxError> {
        match input.to_ascii_lowercase().as_str() {
            "sym" | "symmetric" => Ok(CalculationSymmetry::Symmetric),
            "asym" | "asymmetric" => Ok(CalculationSymmetry::Asymmetric),
            other => Err(PfxError::Config(format!(
                "unknown calculation mode '{}'; supported values: sym, asym",
                other
            ))),
        }
    }
}

impl fmt::Display for CalculationSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity that is scalar in symmetric mode and per-phase in asymmetric mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseValue {
    Scalar(f64),
    PerPhase([f64; 3]),
}

impl PhaseValue {
    /// All-NaN value shaped for the given mode.
    pub fn nan(symmetry: CalculationSymmetry) -> Self {
        Self::splat(symmetry, f64::NAN)
    }

    pub fn zero(symmetry: CalculationSymmetry) -> Self {
        Self::splat(symmetry, 0.0)
    }

    pub fn splat(symmetry: CalculationSymmetry, value: f64) -> Self {
        match symmetry {
            CalculationSymmetry::Symmetric => PhaseValue::Scalar(value),
            CalculationSymmetry::Asymmetric => PhaseValue::PerPhase([value; 3]),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            PhaseValue::Scalar(v) => vec![*v],
            PhaseValue::PerPhase(v) => v.to_vec(),
        }
    }

    pub fn phases(&self) -> usize {
        match self {
            PhaseValue::Scalar(_) => 1,
            PhaseValue::PerPhase(_) => 3,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            PhaseValue::Scalar(v) => PhaseValue::Scalar(f(v)),
            PhaseValue::PerPhase([a, b, c]) => PhaseValue::PerPhase([f(a), f(b), f(c)]),
        }
    }

    /// Combine two values of the same shape element-wise.
    ///
    /// A scalar combined with a per-phase value is broadcast to all phases.
    pub fn zip_with(self, other: PhaseValue, f: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (PhaseValue::Scalar(a), PhaseValue::Scalar(b)) => PhaseValue::Scalar(f(a, b)),
            (PhaseValue::PerPhase(a), PhaseValue::PerPhase(b)) => {
                PhaseValue::PerPhase([f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2])])
            }
            (PhaseValue::Scalar(a), PhaseValue::PerPhase(b)) => {
                PhaseValue::PerPhase([f(a, b[0]), f(a, b[1]), f(a, b[2])])
            }
            (PhaseValue::PerPhase(a), PhaseValue::Scalar(b)) => {
                PhaseValue::PerPhase([f(a[0], b), f(a[1], b), f(a[2], b)])
            }
        }
    }

    /// Sum over phases (the value itself for scalars).
    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PhaseValue::Scalar(v) => Some(*v),
            PhaseValue::PerPhase(_) => None,
        }
    }
}

fn nan_to_none(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

impl Serialize for PhaseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhaseValue::Scalar(v) => nan_to_none(*v).serialize(serializer),
            PhaseValue::PerPhase(v) => v.map(nan_to_none).serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPhaseValue {
    Scalar(Option<f64>),
    PerPhase([Option<f64>; 3]),
}

impl<'de> Deserialize<'de> for PhaseValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPhaseValue::deserialize(deserializer)? {
            RawPhaseValue::Scalar(v) => PhaseValue::Scalar(v.unwrap_or(f64::NAN)),
            RawPhaseValue::PerPhase(v) => {
                PhaseValue::PerPhase(v.map(|x| x.unwrap_or(f64::NAN)))
            }
        })
    }
}

/// `f64` fields that travel as `null` when not available.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        super::nan_to_none(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

fn nan_value() -> f64 {
    f64::NAN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub id: ComponentId,
    pub energized: i8,
    pub u_pu: PhaseValue,
    /// Voltage magnitude (V): line-to-line in symmetric mode, line-to-neutral per phase otherwise
    pub u: PhaseValue,
    /// Voltage angle (rad)
    pub u_angle: PhaseValue,
    /// Active power injection (W)
    pub p: PhaseValue,
    /// Reactive power injection (var)
    pub q: PhaseValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchOutput {
    pub id: ComponentId,
    pub energized: i8,
    #[serde(with = "nan_as_null", default = "nan_value")]
    pub loading: f64,
    pub p_from: PhaseValue,
    pub q_from: PhaseValue,
    pub i_from: PhaseValue,
    pub s_from: PhaseValue,
    pub p_to: PhaseValue,
    pub q_to: PhaseValue,
    pub i_to: PhaseValue,
    pub s_to: PhaseValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceOutput {
    pub id: ComponentId,
    pub energized: i8,
    pub p: PhaseValue,
    pub q: PhaseValue,
    pub i: PhaseValue,
    pub s: PhaseValue,
    pub pf: PhaseValue,
}

/// One component's output record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Node(NodeOutput),
    Branch(BranchOutput),
    Appliance(ApplianceOutput),
}

impl OutputRecord {
    pub fn id(&self) -> ComponentId {
        match self {
            OutputRecord::Node(r) => r.id,
            OutputRecord::Branch(r) => r.id,
            OutputRecord::Appliance(r) => r.id,
        }
    }

    pub fn energized(&self) -> i8 {
        match self {
            OutputRecord::Node(r) => r.energized,
            OutputRecord::Branch(r) => r.energized,
            OutputRecord::Appliance(r) => r.energized,
        }
    }

    /// Numeric output fields other than `id` and `energized`, in record order.
    pub fn fields(&self) -> Vec<(&'static str, PhaseValue)> {
        match self {
            OutputRecord::Node(r) => vec![
                ("u_pu", r.u_pu),
                ("u", r.u),
                ("u_angle", r.u_angle),
                ("p", r.p),
                ("q", r.q),
            ],
            OutputRecord::Branch(r) => vec![
                ("loading", PhaseValue::Scalar(r.loading)),
                ("p_from", r.p_from),
                ("q_from", r.q_from),
                ("i_from", r.i_from),
                ("s_from", r.s_from),
                ("p_to", r.p_to),
                ("q_to", r.q_to),
                ("i_to", r.i_to),
                ("s_to", r.s_to),
            ],
            OutputRecord::Appliance(r) => vec![
                ("p", r.p),
                ("q", r.q),
                ("i", r.i),
                ("s", r.s),
                ("pf", r.pf),
            ],
        }
    }

    pub fn field(&self, name: &str) -> Option<PhaseValue> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Parse a record of a category with the given output shape.
    pub fn from_value(kind: ComponentKind, value: serde_json::Value) -> Result<Self, PfxError> {
        Ok(match kind {
            ComponentKind::Node => OutputRecord::Node(serde_json::from_value(value)?),
            ComponentKind::Branch => OutputRecord::Branch(serde_json::from_value(value)?),
            ComponentKind::Appliance => OutputRecord::Appliance(serde_json::from_value(value)?),
            other => {
                return Err(PfxError::Parse(format!(
                    "output records of kind {:?} are not supported",
                    other
                )))
            }
        })
    }
}

/// Per-category output records of one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub symmetry: CalculationSymmetry,
    pub components: BTreeMap<ComponentType, Vec<OutputRecord>>,
}

impl ResultSet {
    pub fn new(symmetry: CalculationSymmetry) -> Self {
        Self {
            symmetry,
            components: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, component: ComponentType, records: Vec<OutputRecord>) {
        self.components.insert(component, records);
    }

    pub fn get(&self, component: ComponentType) -> Option<&[OutputRecord]> {
        self.components.get(&component).map(Vec::as_slice)
    }

    pub fn categories(&self) -> Vec<ComponentType> {
        self.components.keys().copied().collect()
    }

    /// Identifiers of one category in record order.
    pub fn ids(&self, component: ComponentType) -> Vec<ComponentId> {
        self.get(component)
            .map(|records| records.iter().map(OutputRecord::id).collect())
            .unwrap_or_default()
    }

    pub fn record(&self, component: ComponentType, id: ComponentId) -> Option<&OutputRecord> {
        self.get(component)?.iter().find(|r| r.id() == id)
    }

    pub fn record_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }

    /// Build a result set from the `data` block of an output dataset.
    pub fn from_data(
        symmetry: CalculationSymmetry,
        data: BTreeMap<String, Vec<serde_json::Value>>,
    ) -> Result<Self, PfxError> {
        let mut result = ResultSet::new(symmetry);
        for (name, records) in data {
            let component = ComponentType::from_name(&name).ok_or_else(|| {
                PfxError::Parse(format!("unknown component category '{}' in output", name))
            })?;
            let parsed = records
                .into_iter()
                .map(|record| OutputRecord::from_value(component.kind(), record))
                .collect::<Result<Vec<_>, _>>()?;
            result.insert(component, parsed);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn symmetry_tags() {
        assert_eq!(CalculationSymmetry::Symmetric.as_str(), "sym");
        assert_eq!(CalculationSymmetry::Asymmetric.output_type(), "asym_output");
        assert_eq!(
            CalculationSymmetry::from_str("ASYM").unwrap(),
            CalculationSymmetry::Asymmetric
        );
        assert!(CalculationSymmetry::from_str("dc").is_err());
        assert_eq!(
            CalculationSymmetry::from_output_type("sym_output"),
            Some(CalculationSymmetry::Symmetric)
        );
    }

    #[test]
    fn phase_value_wire_format() {
        let scalar = PhaseValue::Scalar(1.5);
        assert_eq!(serde_json::to_value(scalar).unwrap(), json!(1.5));

        let per_phase = PhaseValue::PerPhase([1.0, f64::NAN, 3.0]);
        assert_eq!(
            serde_json::to_value(per_phase).unwrap(),
            json!([1.0, null, 3.0])
        );

        let parsed: PhaseValue = serde_json::from_value(json!([1.0, null, 3.0])).unwrap();
        match parsed {
            PhaseValue::PerPhase(v) => {
                assert_eq!(v[0], 1.0);
                assert!(v[1].is_nan());
            }
            other => panic!("expected per-phase value, got {:?}", other),
        }

        let parsed: PhaseValue = serde_json::from_value(json!(null)).unwrap();
        assert!(parsed.as_scalar().unwrap().is_nan());
    }

    #[test]
    fn phase_value_arithmetic() {
        let a = PhaseValue::PerPhase([1.0, 2.0, 3.0]);
        assert_eq!(a.total(), 6.0);
        assert_eq!(a.map(|v| -v), PhaseValue::PerPhase([-1.0, -2.0, -3.0]));
        assert_eq!(
            a.zip_with(PhaseValue::Scalar(2.0), |x, y| x * y),
            PhaseValue::PerPhase([2.0, 4.0, 6.0])
        );
        assert!(!PhaseValue::nan(CalculationSymmetry::Symmetric).is_finite());
        assert_eq!(
            PhaseValue::zero(CalculationSymmetry::Asymmetric).phases(),
            3
        );
    }

    #[test]
    fn result_set_from_output_data() {
        let mut data = BTreeMap::new();
        data.insert(
            "node".to_string(),
            vec![json!({"id": 1, "energized": 1, "u_pu": 1.0, "u": 400.0, "u_angle": 0.0, "p": 1e3, "q": 0.0})],
        );
        data.insert(
            "line".to_string(),
            vec![json!({
                "id": 2, "energized": 1, "loading": null,
                "p_from": 1.0, "q_from": 0.0, "i_from": 0.1, "s_from": 1.0,
                "p_to": -1.0, "q_to": 0.0, "i_to": 0.1, "s_to": 1.0
            })],
        );
        data.insert(
            "sym_load".to_string(),
            vec![json!({"id": 3, "energized": 1, "p": 1e3, "q": 0.0, "i": 1.4, "s": 1e3, "pf": 1.0})],
        );

        let result = ResultSet::from_data(CalculationSymmetry::Symmetric, data).unwrap();
        assert_eq!(result.record_count(), 3);
        assert_eq!(
            result.categories(),
            vec![ComponentType::Node, ComponentType::Line, ComponentType::SymLoad]
        );
        let line = result.record(ComponentType::Line, ComponentId::new(2)).unwrap();
        assert!(line.field("loading").unwrap().as_scalar().unwrap().is_nan());
        assert_eq!(line.field("p_to"), Some(PhaseValue::Scalar(-1.0)));
    }

    #[test]
    fn result_set_rejects_unknown_category() {
        let mut data = BTreeMap::new();
        data.insert("bus".to_string(), vec![json!({"id": 1})]);
        assert!(ResultSet::from_data(CalculationSymmetry::Symmetric, data).is_err());
    }

    #[test]
    fn record_serializes_flat() {
        let record = OutputRecord::Appliance(ApplianceOutput {
            id: ComponentId::new(9),
            energized: 0,
            p: PhaseValue::Scalar(0.0),
            q: PhaseValue::Scalar(0.0),
            i: PhaseValue::Scalar(0.0),
            s: PhaseValue::Scalar(0.0),
            pf: PhaseValue::Scalar(0.0),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 9);
        assert_eq!(value["energized"], 0);
        assert_eq!(value["pf"], 0.0);
    }
}
