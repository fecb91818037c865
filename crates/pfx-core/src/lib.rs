//! # pfx-core: Grid models for power-flow cross-validation
//!
//! Provides the data structures shared by every stage of the `pfx` harness:
//! the canonical row-based grid model, the alternate table-based model, result
//! sets, the error taxonomy and the solver contracts.
//!
//! ## Canonical model
//!
//! A [`Network`] maps each component category to an ordered list of records.
//! Records carry SI quantities (V, W, var, Ω, F, S, VA) and reference nodes by
//! [`ComponentId`]. Identifiers are unique across *all* categories.
//!
//! Missing values follow the dataset convention: floating point fields are
//! `NaN` and 8-bit integer fields hold [`NA_INT`]. The validator in `pfx-io`
//! turns missing required fields into errors naming the component.
//!
//! ```
//! use pfx_core::*;
//!
//! let mut network = Network::new();
//! network.node.push(Node::new(ComponentId::new(1), 10.5e3));
//! network.source.push(Source::new(ComponentId::new(2), ComponentId::new(1), 1.0));
//! network.sym_load.push(SymLoadGen::new(
//!     ComponentId::new(3),
//!     ComponentId::new(1),
//!     LoadGenType::ConstPq,
//!     1.0e6,
//!     0.2e6,
//! ));
//!
//! assert_eq!(network.stats().num_nodes, 1);
//! assert_eq!(network.present_types().len(), 3);
//! ```
//!
//! Categories the typed structs do not model (links, sensors, faults, ...)
//! are kept verbatim in [`Network::opaque`] so later stages can reject them
//! by name instead of dropping them.
//!
//! ## Modules
//!
//! - [`alternate`] - table-based network and raw row results
//! - [`comparison`] - tolerance comparison of result sets
//! - [`diagnostics`] - validation issue collection
//! - [`graph_utils`] - topology analysis (islands, energized nodes)
//! - [`result`] - canonical result sets
//! - [`solver`] - solver contracts and calculation parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod alternate;
pub mod comparison;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod result;
pub mod solver;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{
    PfxError, PfxResult, ReconciliationError, SolverError, SolverErrorKind, TranslationError,
    ValidationError, ValidationIssue,
};
pub use result::{
    ApplianceOutput, BranchOutput, CalculationSymmetry, NodeOutput, OutputRecord, PhaseValue,
    ResultSet,
};
pub use solver::{
    AltSolverOptions, AlternateSolver, CalculationMethod, CalculationParams, CanonicalSolver,
};

/// Missing value marker for 8-bit integer fields.
pub const NA_INT: i8 = i8::MIN;
/// Missing value marker for identifiers.
pub const NA_ID: i32 = i32::MIN;

fn nan() -> f64 {
    f64::NAN
}

fn nan3() -> [f64; 3] {
    [f64::NAN; 3]
}

fn na_int() -> i8 {
    NA_INT
}

fn na_id() -> ComponentId {
    ComponentId(NA_ID)
}

fn is_nan(value: &f64) -> bool {
    value.is_nan()
}

fn is_nan3(value: &[f64; 3]) -> bool {
    value.iter().all(|v| v.is_nan())
}

fn is_na_int(value: &i8) -> bool {
    *value == NA_INT
}

/// Identifier of a canonical component, unique across all categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(i32);

impl ComponentId {
    #[inline]
    pub fn new(value: i32) -> Self {
        ComponentId(value)
    }
    #[inline]
    pub fn value(&self) -> i32 {
        self.0
    }
    #[inline]
    pub fn is_na(&self) -> bool {
        self.0 == NA_ID
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_na() {
            write!(f, "<missing id>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Every component category of the canonical dataset format.
///
/// Only the categories listed by [`ComponentType::MODELED`] have typed
/// structs; the rest are carried as opaque JSON records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Node,
    Line,
    AsymLine,
    Link,
    GenericBranch,
    Transformer,
    ThreeWindingTransformer,
    TransformerTapRegulator,
    Source,
    SymLoad,
    SymGen,
    AsymLoad,
    AsymGen,
    Shunt,
    SymVoltageSensor,
    AsymVoltageSensor,
    SymPowerSensor,
    AsymPowerSensor,
    SymCurrentSensor,
    AsymCurrentSensor,
    Fault,
}

/// Shape of the result records a category produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Node,
    Branch,
    Branch3,
    Appliance,
    Sensor,
    Regulator,
    Fault,
}

impl ComponentType {
    pub const ALL: [ComponentType; 21] = [
        ComponentType::Node,
        ComponentType::Line,
        ComponentType::AsymLine,
        ComponentType::Link,
        ComponentType::GenericBranch,
        ComponentType::Transformer,
        ComponentType::ThreeWindingTransformer,
        ComponentType::TransformerTapRegulator,
        ComponentType::Source,
        ComponentType::SymLoad,
        ComponentType::SymGen,
        ComponentType::AsymLoad,
        ComponentType::AsymGen,
        ComponentType::Shunt,
        ComponentType::SymVoltageSensor,
        ComponentType::AsymVoltageSensor,
        ComponentType::SymPowerSensor,
        ComponentType::AsymPowerSensor,
        ComponentType::SymCurrentSensor,
        ComponentType::AsymCurrentSensor,
        ComponentType::Fault,
    ];

    /// Categories with typed structs on [`Network`].
    pub const MODELED: [ComponentType; 9] = [
        ComponentType::Node,
        ComponentType::Line,
        ComponentType::Transformer,
        ComponentType::Source,
        ComponentType::SymLoad,
        ComponentType::SymGen,
        ComponentType::AsymLoad,
        ComponentType::AsymGen,
        ComponentType::Shunt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Node => "node",
            ComponentType::Line => "line",
            ComponentType::AsymLine => "asym_line",
            ComponentType::Link => "link",
            ComponentType::GenericBranch => "generic_branch",
            ComponentType::Transformer => "transformer",
            ComponentType::ThreeWindingTransformer => "three_winding_transformer",
            ComponentType::TransformerTapRegulator => "transformer_tap_regulator",
            ComponentType::Source => "source",
            ComponentType::SymLoad => "sym_load",
            ComponentType::SymGen => "sym_gen",
            ComponentType::AsymLoad => "asym_load",
            ComponentType::AsymGen => "asym_gen",
            ComponentType::Shunt => "shunt",
            ComponentType::SymVoltageSensor => "sym_voltage_sensor",
            ComponentType::AsymVoltageSensor => "asym_voltage_sensor",
            ComponentType::SymPowerSensor => "sym_power_sensor",
            ComponentType::AsymPowerSensor => "asym_power_sensor",
            ComponentType::SymCurrentSensor => "sym_current_sensor",
            ComponentType::AsymCurrentSensor => "asym_current_sensor",
            ComponentType::Fault => "fault",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ct| ct.as_str() == name)
    }

    pub fn is_modeled(&self) -> bool {
        Self::MODELED.contains(self)
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentType::Node => ComponentKind::Node,
            ComponentType::Line
            | ComponentType::AsymLine
            | ComponentType::Link
            | ComponentType::GenericBranch
            | ComponentType::Transformer => ComponentKind::Branch,
            ComponentType::ThreeWindingTransformer => ComponentKind::Branch3,
            ComponentType::TransformerTapRegulator => ComponentKind::Regulator,
            ComponentType::Source
            | ComponentType::SymLoad
            | ComponentType::SymGen
            | ComponentType::AsymLoad
            | ComponentType::AsymGen
            | ComponentType::Shunt => ComponentKind::Appliance,
            ComponentType::SymVoltageSensor
            | ComponentType::AsymVoltageSensor
            | ComponentType::SymPowerSensor
            | ComponentType::AsymPowerSensor
            | ComponentType::SymCurrentSensor
            | ComponentType::AsymCurrentSensor => ComponentKind::Sensor,
            ComponentType::Fault => ComponentKind::Fault,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voltage dependency of a load or generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadGenType {
    /// Constant power
    ConstPq,
    /// Constant impedance
    ConstY,
    /// Constant current
    ConstI,
}

impl LoadGenType {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(LoadGenType::ConstPq),
            1 => Some(LoadGenType::ConstY),
            2 => Some(LoadGenType::ConstI),
            _ => None,
        }
    }

    pub fn code(&self) -> i8 {
        match self {
            LoadGenType::ConstPq => 0,
            LoadGenType::ConstY => 1,
            LoadGenType::ConstI => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadGenType::ConstPq => "const_pq",
            LoadGenType::ConstY => "const_y",
            LoadGenType::ConstI => "const_i",
        }
    }
}

/// Transformer winding connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindingType {
    Wye,
    WyeN,
    Delta,
    Zigzag,
    ZigzagN,
}

impl WindingType {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(WindingType::Wye),
            1 => Some(WindingType::WyeN),
            2 => Some(WindingType::Delta),
            3 => Some(WindingType::Zigzag),
            4 => Some(WindingType::ZigzagN),
            _ => None,
        }
    }

    pub fn code(&self) -> i8 {
        match self {
            WindingType::Wye => 0,
            WindingType::WyeN => 1,
            WindingType::Delta => 2,
            WindingType::Zigzag => 3,
            WindingType::ZigzagN => 4,
        }
    }

    /// Vector group letters for the high-voltage side (`Y`, `YN`, `D`, `Z`, `ZN`).
    pub fn hv_symbol(&self) -> &'static str {
        match self {
            WindingType::Wye => "Y",
            WindingType::WyeN => "YN",
            WindingType::Delta => "D",
            WindingType::Zigzag => "Z",
            WindingType::ZigzagN => "ZN",
        }
    }

    /// Vector group letters for the low-voltage side (`y`, `yn`, `d`, `z`, `zn`).
    pub fn lv_symbol(&self) -> &'static str {
        match self {
            WindingType::Wye => "y",
            WindingType::WyeN => "yn",
            WindingType::Delta => "d",
            WindingType::Zigzag => "z",
            WindingType::ZigzagN => "zn",
        }
    }
}

/// Side of a two-terminal branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSide {
    From,
    To,
}

impl BranchSide {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(BranchSide::From),
            1 => Some(BranchSide::To),
            _ => None,
        }
    }

    pub fn code(&self) -> i8 {
        match self {
            BranchSide::From => 0,
            BranchSide::To => 1,
        }
    }
}

/// Status codes are 0 (open / out of service) or 1 (closed / in service).
#[inline]
pub fn status_closed(status: i8) -> bool {
    status == 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    /// Rated line-to-line voltage (V)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub u_rated: f64,
    /// Attributes without a typed field, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: na_id(),
            u_rated: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl Node {
    pub fn new(id: ComponentId, u_rated: f64) -> Self {
        Self {
            id,
            u_rated,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub from_node: ComponentId,
    #[serde(default = "na_id")]
    pub to_node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub from_status: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub to_status: i8,
    /// Positive-sequence series resistance (Ω)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub r1: f64,
    /// Positive-sequence series reactance (Ω)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub x1: f64,
    /// Positive-sequence shunt capacitance (F)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub c1: f64,
    /// Positive-sequence shunt loss factor
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub tan1: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub r0: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub x0: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub c0: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub tan0: f64,
    /// Rated current (A), optional
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub i_n: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            id: na_id(),
            from_node: na_id(),
            to_node: na_id(),
            from_status: 1,
            to_status: 1,
            r1: f64::NAN,
            x1: f64::NAN,
            c1: f64::NAN,
            tan1: f64::NAN,
            r0: f64::NAN,
            x0: f64::NAN,
            c0: f64::NAN,
            tan0: f64::NAN,
            i_n: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl Line {
    pub fn has_zero_sequence(&self) -> bool {
        [self.r0, self.x0, self.c0, self.tan0]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub from_node: ComponentId,
    #[serde(default = "na_id")]
    pub to_node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub from_status: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub to_status: i8,
    /// Rated voltage at the from side (V)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub u1: f64,
    /// Rated voltage at the to side (V)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub u2: f64,
    /// Rated apparent power (VA)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub sn: f64,
    /// Relative short-circuit voltage
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub uk: f64,
    /// Short-circuit (copper) loss (W)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub pk: f64,
    /// Relative no-load current
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub i0: f64,
    /// No-load (iron) loss (W)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub p0: f64,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub winding_from: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub winding_to: i8,
    /// Clock number of the phase shift (0..=12)
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub clock: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub tap_side: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub tap_pos: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub tap_min: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub tap_max: i8,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub tap_nom: i8,
    /// Voltage step per tap (V)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub tap_size: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            id: na_id(),
            from_node: na_id(),
            to_node: na_id(),
            from_status: 1,
            to_status: 1,
            u1: f64::NAN,
            u2: f64::NAN,
            sn: f64::NAN,
            uk: f64::NAN,
            pk: f64::NAN,
            i0: f64::NAN,
            p0: f64::NAN,
            winding_from: NA_INT,
            winding_to: NA_INT,
            clock: NA_INT,
            tap_side: NA_INT,
            tap_pos: NA_INT,
            tap_min: NA_INT,
            tap_max: NA_INT,
            tap_nom: NA_INT,
            tap_size: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl Transformer {
    /// Nominal tap position; falls back to 0 when not given.
    pub fn effective_tap_nom(&self) -> i8 {
        if self.tap_nom == NA_INT {
            0
        } else {
            self.tap_nom
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub status: i8,
    /// Reference voltage magnitude (p.u.)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub u_ref: f64,
    /// Reference voltage angle (rad)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub u_ref_angle: f64,
    /// Short-circuit power (VA)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub sk: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub rx_ratio: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub z01_ratio: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            id: na_id(),
            node: na_id(),
            status: 1,
            u_ref: f64::NAN,
            u_ref_angle: f64::NAN,
            sk: f64::NAN,
            rx_ratio: f64::NAN,
            z01_ratio: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl Source {
    pub const DEFAULT_SK: f64 = 1e10;
    pub const DEFAULT_RX_RATIO: f64 = 0.1;
    pub const DEFAULT_Z01_RATIO: f64 = 1.0;

    pub fn new(id: ComponentId, node: ComponentId, u_ref: f64) -> Self {
        Self {
            id,
            node,
            u_ref,
            ..Self::default()
        }
    }

    pub fn effective_u_ref_angle(&self) -> f64 {
        if self.u_ref_angle.is_nan() {
            0.0
        } else {
            self.u_ref_angle
        }
    }

    pub fn effective_sk(&self) -> f64 {
        if self.sk.is_nan() {
            Self::DEFAULT_SK
        } else {
            self.sk
        }
    }

    pub fn effective_rx_ratio(&self) -> f64 {
        if self.rx_ratio.is_nan() {
            Self::DEFAULT_RX_RATIO
        } else {
            self.rx_ratio
        }
    }

    pub fn effective_z01_ratio(&self) -> f64 {
        if self.z01_ratio.is_nan() {
            Self::DEFAULT_Z01_RATIO
        } else {
            self.z01_ratio
        }
    }
}

/// Symmetric load or generator (`sym_load` / `sym_gen`).
///
/// Loads use the load reference direction, generators the generator reference
/// direction; the record layout is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymLoadGen {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub status: i8,
    #[serde(rename = "type", default = "na_int", skip_serializing_if = "is_na_int")]
    pub load_gen_type: i8,
    /// Specified active power (W)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub p_specified: f64,
    /// Specified reactive power (var)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub q_specified: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SymLoadGen {
    fn default() -> Self {
        Self {
            id: na_id(),
            node: na_id(),
            status: 1,
            load_gen_type: NA_INT,
            p_specified: f64::NAN,
            q_specified: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl SymLoadGen {
    pub fn new(
        id: ComponentId,
        node: ComponentId,
        load_gen_type: LoadGenType,
        p_specified: f64,
        q_specified: f64,
    ) -> Self {
        Self {
            id,
            node,
            status: 1,
            load_gen_type: load_gen_type.code(),
            p_specified,
            q_specified,
            extra: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> Option<LoadGenType> {
        LoadGenType::from_code(self.load_gen_type)
    }
}

/// Per-phase load or generator (`asym_load` / `asym_gen`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymLoadGen {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub status: i8,
    #[serde(rename = "type", default = "na_int", skip_serializing_if = "is_na_int")]
    pub load_gen_type: i8,
    #[serde(default = "nan3", skip_serializing_if = "is_nan3")]
    pub p_specified: [f64; 3],
    #[serde(default = "nan3", skip_serializing_if = "is_nan3")]
    pub q_specified: [f64; 3],
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for AsymLoadGen {
    fn default() -> Self {
        Self {
            id: na_id(),
            node: na_id(),
            status: 1,
            load_gen_type: NA_INT,
            p_specified: nan3(),
            q_specified: nan3(),
            extra: BTreeMap::new(),
        }
    }
}

impl AsymLoadGen {
    pub fn new(
        id: ComponentId,
        node: ComponentId,
        p_specified: [f64; 3],
        q_specified: [f64; 3],
    ) -> Self {
        Self {
            id,
            node,
            status: 1,
            load_gen_type: LoadGenType::ConstPq.code(),
            p_specified,
            q_specified,
            extra: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> Option<LoadGenType> {
        LoadGenType::from_code(self.load_gen_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shunt {
    #[serde(default = "na_id")]
    pub id: ComponentId,
    #[serde(default = "na_id")]
    pub node: ComponentId,
    #[serde(default = "na_int", skip_serializing_if = "is_na_int")]
    pub status: i8,
    /// Positive-sequence conductance (S)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub g1: f64,
    /// Positive-sequence susceptance (S)
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub b1: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub g0: f64,
    #[serde(default = "nan", skip_serializing_if = "is_nan")]
    pub b0: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Shunt {
    fn default() -> Self {
        Self {
            id: na_id(),
            node: na_id(),
            status: 1,
            g1: f64::NAN,
            b1: f64::NAN,
            g0: f64::NAN,
            b0: f64::NAN,
            extra: BTreeMap::new(),
        }
    }
}

impl Shunt {
    /// Zero-sequence admittance equals the positive-sequence one; an absent
    /// zero-sequence value counts as equal.
    pub fn sequences_match(&self) -> bool {
        let same = |zero: f64, positive: f64| zero.is_nan() || zero == positive;
        same(self.g0, self.g1) && same(self.b0, self.b1)
    }
}

/// Node references carried by one component, for integrity checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRef {
    pub category: String,
    pub id: ComponentId,
    pub nodes: Vec<(&'static str, ComponentId)>,
}

/// A set attribute of a typed record that no typed field carries.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmodeledAttribute {
    pub category: ComponentType,
    pub id: ComponentId,
    pub attribute: String,
    pub value: serde_json::Value,
}

const OPAQUE_NODE_FIELDS: [&str; 6] = ["node", "from_node", "to_node", "node_1", "node_2", "node_3"];

/// The canonical grid model: one ordered record list per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformer: Vec<Transformer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sym_load: Vec<SymLoadGen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sym_gen: Vec<SymLoadGen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asym_load: Vec<AsymLoadGen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asym_gen: Vec<AsymLoadGen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shunt: Vec<Shunt>,
    /// Categories without a typed struct, kept verbatim by name.
    #[serde(flatten)]
    pub opaque: BTreeMap<String, Vec<serde_json::Value>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a modeled category (0 for opaque categories).
    pub fn component_count(&self, component: ComponentType) -> usize {
        match component {
            ComponentType::Node => self.node.len(),
            ComponentType::Line => self.line.len(),
            ComponentType::Transformer => self.transformer.len(),
            ComponentType::Source => self.source.len(),
            ComponentType::SymLoad => self.sym_load.len(),
            ComponentType::SymGen => self.sym_gen.len(),
            ComponentType::AsymLoad => self.asym_load.len(),
            ComponentType::AsymGen => self.asym_gen.len(),
            ComponentType::Shunt => self.shunt.len(),
            _ => 0,
        }
    }

    /// Modeled categories holding at least one record, in canonical order.
    pub fn present_types(&self) -> Vec<ComponentType> {
        ComponentType::MODELED
            .iter()
            .copied()
            .filter(|ct| self.component_count(*ct) > 0)
            .collect()
    }

    /// Record counts for every non-empty category, opaque ones included.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = self
            .present_types()
            .into_iter()
            .map(|ct| (ct.as_str().to_string(), self.component_count(ct)))
            .collect();
        for (name, records) in &self.opaque {
            if !records.is_empty() {
                counts.insert(name.clone(), records.len());
            }
        }
        counts
    }

    /// Identifiers of a modeled category in input order.
    pub fn ids(&self, component: ComponentType) -> Vec<ComponentId> {
        match component {
            ComponentType::Node => self.node.iter().map(|c| c.id).collect(),
            ComponentType::Line => self.line.iter().map(|c| c.id).collect(),
            ComponentType::Transformer => self.transformer.iter().map(|c| c.id).collect(),
            ComponentType::Source => self.source.iter().map(|c| c.id).collect(),
            ComponentType::SymLoad => self.sym_load.iter().map(|c| c.id).collect(),
            ComponentType::SymGen => self.sym_gen.iter().map(|c| c.id).collect(),
            ComponentType::AsymLoad => self.asym_load.iter().map(|c| c.id).collect(),
            ComponentType::AsymGen => self.asym_gen.iter().map(|c| c.id).collect(),
            ComponentType::Shunt => self.shunt.iter().map(|c| c.id).collect(),
            _ => Vec::new(),
        }
    }

    pub fn find_node(&self, id: ComponentId) -> Option<&Node> {
        self.node.iter().find(|n| n.id == id)
    }

    /// Every component with the node ids it references, opaque categories included.
    pub fn references(&self) -> Vec<ComponentRef> {
        let mut refs = Vec::new();
        let mut push = |category: ComponentType, id: ComponentId, nodes: Vec<(&'static str, ComponentId)>| {
            refs.push(ComponentRef {
                category: category.as_str().to_string(),
                id,
                nodes,
            });
        };

        for n in &self.node {
            push(ComponentType::Node, n.id, Vec::new());
        }
        for l in &self.line {
            push(
                ComponentType::Line,
                l.id,
                vec![("from_node", l.from_node), ("to_node", l.to_node)],
            );
        }
        for t in &self.transformer {
            push(
                ComponentType::Transformer,
                t.id,
                vec![("from_node", t.from_node), ("to_node", t.to_node)],
            );
        }
        for s in &self.source {
            push(ComponentType::Source, s.id, vec![("node", s.node)]);
        }
        for (category, appliances) in [
            (ComponentType::SymLoad, &self.sym_load),
            (ComponentType::SymGen, &self.sym_gen),
        ] {
            for a in appliances {
                push(category, a.id, vec![("node", a.node)]);
            }
        }
        for (category, appliances) in [
            (ComponentType::AsymLoad, &self.asym_load),
            (ComponentType::AsymGen, &self.asym_gen),
        ] {
            for a in appliances {
                push(category, a.id, vec![("node", a.node)]);
            }
        }
        for s in &self.shunt {
            push(ComponentType::Shunt, s.id, vec![("node", s.node)]);
        }

        for (name, records) in &self.opaque {
            for record in records {
                let id = record
                    .get("id")
                    .and_then(|v| v.as_i64())
                    .and_then(|v| i32::try_from(v).ok())
                    .map(ComponentId::new)
                    .unwrap_or_else(na_id);
                let nodes = OPAQUE_NODE_FIELDS
                    .iter()
                    .filter_map(|field| {
                        record
                            .get(*field)
                            .and_then(|v| v.as_i64())
                            .and_then(|v| i32::try_from(v).ok())
                            .map(|v| (*field, ComponentId::new(v)))
                    })
                    .collect();
                refs.push(ComponentRef {
                    category: name.clone(),
                    id,
                    nodes,
                });
            }
        }
        refs
    }

    /// Extra attributes of typed records holding a value, in category and
    /// input order. `null` counts as unset.
    pub fn unmodeled_attributes(&self) -> Vec<UnmodeledAttribute> {
        let mut found = Vec::new();
        let mut collect = |category: ComponentType,
                           id: ComponentId,
                           extra: &BTreeMap<String, serde_json::Value>| {
            for (attribute, value) in extra {
                if !value.is_null() {
                    found.push(UnmodeledAttribute {
                        category,
                        id,
                        attribute: attribute.clone(),
                        value: value.clone(),
                    });
                }
            }
        };

        for n in &self.node {
            collect(ComponentType::Node, n.id, &n.extra);
        }
        for l in &self.line {
            collect(ComponentType::Line, l.id, &l.extra);
        }
        for t in &self.transformer {
            collect(ComponentType::Transformer, t.id, &t.extra);
        }
        for s in &self.source {
            collect(ComponentType::Source, s.id, &s.extra);
        }
        for (category, appliances) in [
            (ComponentType::SymLoad, &self.sym_load),
            (ComponentType::SymGen, &self.sym_gen),
        ] {
            for a in appliances {
                collect(category, a.id, &a.extra);
            }
        }
        for (category, appliances) in [
            (ComponentType::AsymLoad, &self.asym_load),
            (ComponentType::AsymGen, &self.asym_gen),
        ] {
            for a in appliances {
                collect(category, a.id, &a.extra);
            }
        }
        for s in &self.shunt {
            collect(ComponentType::Shunt, s.id, &s.extra);
        }
        found
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            num_nodes: self.node.len(),
            num_branches: self.line.len() + self.transformer.len(),
            num_sources: self.source.len(),
            num_appliances: self.sym_load.len()
                + self.sym_gen.len()
                + self.asym_load.len()
                + self.asym_gen.len()
                + self.shunt.len(),
            num_opaque: self.opaque.values().map(Vec::len).sum(),
            ..NetworkStats::default()
        };

        for load in &self.sym_load {
            stats.total_load_w += finite_or_zero(load.p_specified);
        }
        for load in &self.asym_load {
            stats.total_load_w += load.p_specified.iter().copied().map(finite_or_zero).sum::<f64>();
        }
        for gen in &self.sym_gen {
            stats.total_gen_w += finite_or_zero(gen.p_specified);
        }
        for gen in &self.asym_gen {
            stats.total_gen_w += gen.p_specified.iter().copied().map(finite_or_zero).sum::<f64>();
        }
        stats
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Statistics about a network's size and specified power
#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub num_nodes: usize,
    pub num_branches: usize,
    pub num_sources: usize,
    pub num_appliances: usize,
    pub num_opaque: usize,
    pub total_load_w: f64,
    pub total_gen_w: f64,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} branches, {} sources, {} appliances ({:.3} MW load, {:.3} MW gen)",
            self.num_nodes,
            self.num_branches,
            self.num_sources,
            self.num_appliances,
            self.total_load_w * 1e-6,
            self.total_gen_w * 1e-6
        )?;
        if self.num_opaque > 0 {
            write!(f, ", {} unmodeled records", self.num_opaque)?;
        }
        Ok(())
    }
}
