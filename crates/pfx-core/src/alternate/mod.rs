//! Table-based network model of the alternate engine.
//!
//! Every category is a table of rows addressed by position; topology is
//! expressed through bus row indices. Column names and units follow the
//! pandapower conventions (kV, MW, Mvar, Ω/km, nF/km, µS/km, percent,
//! degrees) so the tables can be dumped to pandapower JSON unchanged.

mod results;

pub use results::{RawResultSet, RawTable, RawTableView};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tables of the alternate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltTable {
    Bus,
    Line,
    Trafo,
    ExtGrid,
    Load,
    Sgen,
    AsymmetricLoad,
    AsymmetricSgen,
    Shunt,
    Switch,
}

impl AltTable {
    pub const ALL: [AltTable; 10] = [
        AltTable::Bus,
        AltTable::Line,
        AltTable::Trafo,
        AltTable::ExtGrid,
        AltTable::Load,
        AltTable::Sgen,
        AltTable::AsymmetricLoad,
        AltTable::AsymmetricSgen,
        AltTable::Shunt,
        AltTable::Switch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AltTable::Bus => "bus",
            AltTable::Line => "line",
            AltTable::Trafo => "trafo",
            AltTable::ExtGrid => "ext_grid",
            AltTable::Load => "load",
            AltTable::Sgen => "sgen",
            AltTable::AsymmetricLoad => "asymmetric_load",
            AltTable::AsymmetricSgen => "asymmetric_sgen",
            AltTable::Shunt => "shunt",
            AltTable::Switch => "switch",
        }
    }

    /// Auxiliary tables carry rows that never produce canonical results.
    pub fn is_auxiliary(&self) -> bool {
        matches!(self, AltTable::Switch)
    }

    /// Name of the result table for this table (`res_bus`, `res_bus_3ph`, ...).
    pub fn result_table(&self, symmetric: bool) -> String {
        if symmetric {
            format!("res_{}", self.as_str())
        } else {
            format!("res_{}_3ph", self.as_str())
        }
    }
}

impl fmt::Display for AltTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one row in the alternate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AltRow {
    pub table: AltTable,
    pub row: usize,
}

impl AltRow {
    pub fn new(table: AltTable, row: usize) -> Self {
        Self { table, row }
    }
}

impl fmt::Display for AltRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.table, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRow {
    pub name: String,
    pub vn_kv: f64,
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRow {
    pub name: String,
    pub from_bus: usize,
    pub to_bus: usize,
    pub length_km: f64,
    pub r_ohm_per_km: f64,
    pub x_ohm_per_km: f64,
    pub c_nf_per_km: f64,
    pub g_us_per_km: f64,
    pub r0_ohm_per_km: f64,
    pub x0_ohm_per_km: f64,
    pub c0_nf_per_km: f64,
    pub g0_us_per_km: f64,
    pub max_i_ka: f64,
    pub parallel: u32,
    pub df: f64,
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafoRow {
    pub name: String,
    pub hv_bus: usize,
    pub lv_bus: usize,
    pub sn_mva: f64,
    pub vn_hv_kv: f64,
    pub vn_lv_kv: f64,
    pub vk_percent: f64,
    pub vkr_percent: f64,
    pub pfe_kw: f64,
    pub i0_percent: f64,
    pub shift_degree: f64,
    /// `hv` or `lv`
    pub tap_side: String,
    pub tap_neutral: i32,
    pub tap_min: i32,
    pub tap_max: i32,
    pub tap_pos: i32,
    pub tap_step_percent: f64,
    pub tap_step_degree: f64,
    pub tap_phase_shifter: bool,
    pub vector_group: String,
    pub vk0_percent: f64,
    pub vkr0_percent: f64,
    pub mag0_percent: f64,
    pub mag0_rx: f64,
    pub si0_hv_partial: f64,
    pub parallel: u32,
    pub df: f64,
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtGridRow {
    pub name: String,
    pub bus: usize,
    pub vm_pu: f64,
    pub va_degree: f64,
    pub s_sc_max_mva: f64,
    pub rx_max: f64,
    pub r0x0_max: f64,
    pub x0x_max: f64,
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRow {
    pub name: String,
    pub bus: usize,
    pub p_mw: f64,
    pub q_mvar: f64,
    pub const_z_percent: f64,
    pub const_i_percent: f64,
    /// Rated power; unset rows are written as null
    pub sn_mva: Option<f64>,
    pub scaling: f64,
    pub in_service: bool,
    /// Connection type (`wye`)
    #[serde(rename = "type")]
    pub load_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgenRow {
    pub name: String,
    pub bus: usize,
    pub p_mw: f64,
    pub q_mvar: f64,
    pub sn_mva: Option<f64>,
    pub scaling: f64,
    pub in_service: bool,
    #[serde(rename = "type")]
    pub sgen_type: String,
}

/// Row of `asymmetric_load` or `asymmetric_sgen`; both share the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetricRow {
    pub name: String,
    pub bus: usize,
    pub p_a_mw: f64,
    pub p_b_mw: f64,
    pub p_c_mw: f64,
    pub q_a_mvar: f64,
    pub q_b_mvar: f64,
    pub q_c_mvar: f64,
    pub sn_mva: Option<f64>,
    pub scaling: f64,
    pub in_service: bool,
    #[serde(rename = "type")]
    pub connection: String,
}

impl AsymmetricRow {
    pub fn p_mw(&self) -> [f64; 3] {
        [self.p_a_mw, self.p_b_mw, self.p_c_mw]
    }

    pub fn q_mvar(&self) -> [f64; 3] {
        [self.q_a_mvar, self.q_b_mvar, self.q_c_mvar]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuntRow {
    pub name: String,
    pub bus: usize,
    /// Active power consumed at rated voltage (MW)
    pub p_mw: f64,
    /// Reactive power consumed at rated voltage (Mvar)
    pub q_mvar: f64,
    pub vn_kv: f64,
    pub step: u32,
    pub max_step: u32,
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchRow {
    pub name: String,
    pub bus: usize,
    /// Row index in the element table
    pub element: usize,
    /// Element table: `l` (line), `t` (trafo) or `b` (bus)
    pub et: String,
    pub closed: bool,
}

/// A complete alternate network, built fresh for every translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltNetwork {
    pub name: String,
    pub f_hz: f64,
    pub sn_mva: f64,
    pub bus: Vec<BusRow>,
    pub line: Vec<LineRow>,
    pub trafo: Vec<TrafoRow>,
    pub ext_grid: Vec<ExtGridRow>,
    pub load: Vec<LoadRow>,
    pub sgen: Vec<SgenRow>,
    pub asymmetric_load: Vec<AsymmetricRow>,
    pub asymmetric_sgen: Vec<AsymmetricRow>,
    pub shunt: Vec<ShuntRow>,
    pub switch: Vec<SwitchRow>,
}

impl Default for AltNetwork {
    fn default() -> Self {
        Self {
            name: String::new(),
            f_hz: 50.0,
            sn_mva: 1.0,
            bus: Vec::new(),
            line: Vec::new(),
            trafo: Vec::new(),
            ext_grid: Vec::new(),
            load: Vec::new(),
            sgen: Vec::new(),
            asymmetric_load: Vec::new(),
            asymmetric_sgen: Vec::new(),
            shunt: Vec::new(),
            switch: Vec::new(),
        }
    }
}

impl AltNetwork {
    pub fn new(name: impl Into<String>, f_hz: f64) -> Self {
        Self {
            name: name.into(),
            f_hz,
            ..Self::default()
        }
    }

    pub fn table_len(&self, table: AltTable) -> usize {
        match table {
            AltTable::Bus => self.bus.len(),
            AltTable::Line => self.line.len(),
            AltTable::Trafo => self.trafo.len(),
            AltTable::ExtGrid => self.ext_grid.len(),
            AltTable::Load => self.load.len(),
            AltTable::Sgen => self.sgen.len(),
            AltTable::AsymmetricLoad => self.asymmetric_load.len(),
            AltTable::AsymmetricSgen => self.asymmetric_sgen.len(),
            AltTable::Shunt => self.shunt.len(),
            AltTable::Switch => self.switch.len(),
        }
    }

    pub fn row_count(&self) -> usize {
        AltTable::ALL.iter().map(|t| self.table_len(*t)).sum()
    }

    pub fn add_bus(&mut self, row: BusRow) -> AltRow {
        self.bus.push(row);
        AltRow::new(AltTable::Bus, self.bus.len() - 1)
    }

    pub fn add_line(&mut self, row: LineRow) -> AltRow {
        self.line.push(row);
        AltRow::new(AltTable::Line, self.line.len() - 1)
    }

    pub fn add_trafo(&mut self, row: TrafoRow) -> AltRow {
        self.trafo.push(row);
        AltRow::new(AltTable::Trafo, self.trafo.len() - 1)
    }

    pub fn add_ext_grid(&mut self, row: ExtGridRow) -> AltRow {
        self.ext_grid.push(row);
        AltRow::new(AltTable::ExtGrid, self.ext_grid.len() - 1)
    }

    pub fn add_load(&mut self, row: LoadRow) -> AltRow {
        self.load.push(row);
        AltRow::new(AltTable::Load, self.load.len() - 1)
    }

    pub fn add_sgen(&mut self, row: SgenRow) -> AltRow {
        self.sgen.push(row);
        AltRow::new(AltTable::Sgen, self.sgen.len() - 1)
    }

    pub fn add_asymmetric_load(&mut self, row: AsymmetricRow) -> AltRow {
        self.asymmetric_load.push(row);
        AltRow::new(AltTable::AsymmetricLoad, self.asymmetric_load.len() - 1)
    }

    pub fn add_asymmetric_sgen(&mut self, row: AsymmetricRow) -> AltRow {
        self.asymmetric_sgen.push(row);
        AltRow::new(AltTable::AsymmetricSgen, self.asymmetric_sgen.len() - 1)
    }

    pub fn add_shunt(&mut self, row: ShuntRow) -> AltRow {
        self.shunt.push(row);
        AltRow::new(AltTable::Shunt, self.shunt.len() - 1)
    }

    pub fn add_switch(&mut self, row: SwitchRow) -> AltRow {
        self.switch.push(row);
        AltRow::new(AltTable::Switch, self.switch.len() - 1)
    }

    /// Bus row an appliance-like row is attached to.
    pub fn attached_bus(&self, row: AltRow) -> Option<usize> {
        match row.table {
            AltTable::ExtGrid => self.ext_grid.get(row.row).map(|r| r.bus),
            AltTable::Load => self.load.get(row.row).map(|r| r.bus),
            AltTable::Sgen => self.sgen.get(row.row).map(|r| r.bus),
            AltTable::AsymmetricLoad => self.asymmetric_load.get(row.row).map(|r| r.bus),
            AltTable::AsymmetricSgen => self.asymmetric_sgen.get(row.row).map(|r| r.bus),
            AltTable::Shunt => self.shunt.get(row.row).map(|r| r.bus),
            AltTable::Switch => self.switch.get(row.row).map(|r| r.bus),
            AltTable::Bus | AltTable::Line | AltTable::Trafo => None,
        }
    }

    /// In-service flag of any row; switches report their `closed` flag.
    pub fn in_service(&self, row: AltRow) -> Option<bool> {
        match row.table {
            AltTable::Bus => self.bus.get(row.row).map(|r| r.in_service),
            AltTable::Line => self.line.get(row.row).map(|r| r.in_service),
            AltTable::Trafo => self.trafo.get(row.row).map(|r| r.in_service),
            AltTable::ExtGrid => self.ext_grid.get(row.row).map(|r| r.in_service),
            AltTable::Load => self.load.get(row.row).map(|r| r.in_service),
            AltTable::Sgen => self.sgen.get(row.row).map(|r| r.in_service),
            AltTable::AsymmetricLoad => self.asymmetric_load.get(row.row).map(|r| r.in_service),
            AltTable::AsymmetricSgen => self.asymmetric_sgen.get(row.row).map(|r| r.in_service),
            AltTable::Shunt => self.shunt.get(row.row).map(|r| r.in_service),
            AltTable::Switch => self.switch.get(row.row).map(|r| r.closed),
        }
    }

    /// Whether the end of branch `element` (switch element type `et`) at
    /// `bus` is cut off by an open switch.
    pub fn branch_end_open(&self, et: &str, element: usize, bus: usize) -> bool {
        self.switch
            .iter()
            .any(|s| s.et == et && s.element == element && s.bus == bus && !s.closed)
    }

    pub fn line_end_open(&self, line: usize, bus: usize) -> bool {
        self.branch_end_open("l", line, bus)
    }

    pub fn trafo_end_open(&self, trafo: usize, bus: usize) -> bool {
        self.branch_end_open("t", trafo, bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(vn_kv: f64) -> BusRow {
        BusRow {
            name: String::new(),
            vn_kv,
            in_service: true,
        }
    }

    #[test]
    fn rows_are_addressed_by_position() {
        let mut net = AltNetwork::new("test", 50.0);
        assert_eq!(net.add_bus(bus(10.0)), AltRow::new(AltTable::Bus, 0));
        assert_eq!(net.add_bus(bus(0.4)), AltRow::new(AltTable::Bus, 1));
        let switch = net.add_switch(SwitchRow {
            name: String::new(),
            bus: 1,
            element: 0,
            et: "l".into(),
            closed: false,
        });
        assert_eq!(switch.to_string(), "switch[0]");
        assert_eq!(net.table_len(AltTable::Bus), 2);
        assert_eq!(net.row_count(), 3);
        assert!(net.line_end_open(0, 1));
        assert!(!net.line_end_open(0, 0));
        assert_eq!(net.in_service(switch), Some(false));
        assert_eq!(net.attached_bus(switch), Some(1));
    }

    #[test]
    fn result_table_names() {
        assert_eq!(AltTable::Bus.result_table(true), "res_bus");
        assert_eq!(AltTable::ExtGrid.result_table(false), "res_ext_grid_3ph");
        assert!(AltTable::Switch.is_auxiliary());
        assert!(!AltTable::Load.is_auxiliary());
    }
}
