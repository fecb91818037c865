//! Canonical network → alternate table network.
//!
//! Components are visited category by category (nodes first) and, within a
//! category, in ascending id order, so translating the same network twice
//! yields identical tables and maps. Each component appends exactly one
//! primary row and records it in the [`ComponentIndexMap`] immediately,
//! together with the [`ComponentMeta`] the reconciler needs to undo unit,
//! sign and orientation changes.

use super::index_map::ComponentIndexMap;
use pfx_core::alternate::{
    AltNetwork, AltRow, AsymmetricRow, BusRow, ExtGridRow, LineRow, LoadRow, SgenRow, ShuntRow,
    SwitchRow, TrafoRow,
};
use pfx_core::units::{
    Amperes, Farads, Fraction, Radians, Siemens, VoltAmperes, Vars, Volts, Watts,
};
use pfx_core::{
    status_closed, AsymLoadGen, BranchSide, CalculationSymmetry, ComponentId, ComponentType, Line,
    LoadGenType, Network, Shunt, Source, SymLoadGen, TranslationError, Transformer, WindingType,
    NA_INT,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use tracing::debug;

pub const DEFAULT_FREQUENCY_HZ: f64 = 50.0;

/// Current rating (kA) given to lines without a rated current.
pub const UNRATED_MAX_I_KA: f64 = 1e6;

/// Zero-sequence magnetizing impedance (%) of transformers without no-load
/// current.
pub const OPEN_CIRCUIT_MAG0_PERCENT: f64 = 1e6;

/// Vector groups the alternate engine can solve in asymmetric mode.
pub const SUPPORTED_ASYM_VECTOR_GROUPS: [&str; 5] = ["Dyn", "YNyn", "Yzn", "YNd", "Yyn"];

/// What the reconciler needs to know about one translated component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentMeta {
    /// Rated voltage (V) of the node itself, or of the node the component attaches to
    pub base_voltage: f64,
    /// Attachment node of appliances
    pub node: Option<ComponentId>,
    /// Transformer sides were swapped to put the high-voltage side first
    pub swapped: bool,
    /// Factor turning alternate powers into canonical ones (-1 for generators
    /// expressed as negative loads)
    pub sign: f64,
    /// Line loading is only meaningful with a rated current
    pub rated_current_known: bool,
    pub in_service: bool,
    /// Equal power on all phases, so totals may be split evenly
    pub balanced: bool,
}

impl ComponentMeta {
    fn new(base_voltage: f64, in_service: bool) -> Self {
        Self {
            base_voltage,
            node: None,
            swapped: false,
            sign: 1.0,
            rated_current_known: true,
            in_service,
            balanced: true,
        }
    }

    fn attached(mut self, node: ComponentId) -> Self {
        self.node = Some(node);
        self
    }
}

/// Result of one translation: the alternate network plus everything needed
/// to map its results back.
#[derive(Debug, Clone)]
pub struct Translation {
    pub symmetry: CalculationSymmetry,
    pub network: AltNetwork,
    pub index: ComponentIndexMap,
    pub meta: BTreeMap<(ComponentType, ComponentId), ComponentMeta>,
    /// Canonical input order per category
    pub order: Vec<(ComponentType, Vec<ComponentId>)>,
}

impl Translation {
    pub fn meta(&self, category: ComponentType, id: ComponentId) -> Option<&ComponentMeta> {
        self.meta.get(&(category, id))
    }
}

/// Translates canonical networks for one calculation mode.
#[derive(Debug, Clone)]
pub struct Translator {
    symmetry: CalculationSymmetry,
    frequency: f64,
    name: String,
}

impl Translator {
    pub fn new(symmetry: CalculationSymmetry) -> Self {
        Self {
            symmetry,
            frequency: DEFAULT_FREQUENCY_HZ,
            name: String::new(),
        }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Name stored on the alternate network.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn translate(&self, network: &Network) -> Result<Translation, TranslationError> {
        reject_opaque(network)?;
        reject_unmodeled_attributes(network)?;

        let mut builder = Builder {
            asymmetric: !self.symmetry.is_symmetric(),
            omega: 2.0 * PI * self.frequency,
            network: AltNetwork::new(self.name.clone(), self.frequency),
            index: ComponentIndexMap::new(),
            meta: BTreeMap::new(),
            buses: HashMap::new(),
        };

        for node in sorted_by_id(&network.node, |n| n.id) {
            let row = builder.network.add_bus(BusRow {
                name: row_name(ComponentType::Node, node.id),
                vn_kv: Volts(node.u_rated).to_kilovolts().value(),
                in_service: true,
            });
            builder.buses.insert(node.id, (row.row, node.u_rated));
            builder.record(ComponentType::Node, node.id, row, ComponentMeta::new(node.u_rated, true))?;
        }
        for line in sorted_by_id(&network.line, |l| l.id) {
            builder.line(line)?;
        }
        for transformer in sorted_by_id(&network.transformer, |t| t.id) {
            builder.transformer(transformer)?;
        }
        for source in sorted_by_id(&network.source, |s| s.id) {
            builder.source(source)?;
        }
        for load in sorted_by_id(&network.sym_load, |l| l.id) {
            builder.sym_appliance(ComponentType::SymLoad, load)?;
        }
        for gen in sorted_by_id(&network.sym_gen, |g| g.id) {
            builder.sym_appliance(ComponentType::SymGen, gen)?;
        }
        for load in sorted_by_id(&network.asym_load, |l| l.id) {
            builder.asym_appliance(ComponentType::AsymLoad, load)?;
        }
        for gen in sorted_by_id(&network.asym_gen, |g| g.id) {
            builder.asym_appliance(ComponentType::AsymGen, gen)?;
        }
        for shunt in sorted_by_id(&network.shunt, |s| s.id) {
            builder.shunt(shunt)?;
        }

        builder.index.verify_bijection(&builder.network)?;
        debug!(
            rows = builder.network.row_count(),
            auxiliary = builder.index.auxiliary_len(),
            mode = %self.symmetry,
            "translated canonical network"
        );

        let order = network
            .present_types()
            .into_iter()
            .map(|category| (category, network.ids(category)))
            .collect();
        Ok(Translation {
            symmetry: self.symmetry,
            network: builder.network,
            index: builder.index,
            meta: builder.meta,
            order,
        })
    }
}

/// Translate with the default frequency.
pub fn translate(
    network: &Network,
    symmetry: CalculationSymmetry,
) -> Result<Translation, TranslationError> {
    Translator::new(symmetry).translate(network)
}

fn reject_opaque(network: &Network) -> Result<(), TranslationError> {
    for (name, records) in &network.opaque {
        let Some(first) = records.first() else {
            continue;
        };
        let id = first
            .get("id")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
            .map(ComponentId::new);
        return Err(TranslationError::new(
            name.as_str(),
            id,
            "category has no alternate representation",
        ));
    }
    Ok(())
}

/// Set attributes without a typed field would be silently lost.
fn reject_unmodeled_attributes(network: &Network) -> Result<(), TranslationError> {
    match network.unmodeled_attributes().into_iter().next() {
        Some(found) => Err(TranslationError::new(
            found.category.as_str(),
            Some(found.id),
            format!(
                "attribute '{}' = {} has no alternate representation",
                found.attribute, found.value
            ),
        )),
        None => Ok(()),
    }
}

fn sorted_by_id<T>(items: &[T], id: impl Fn(&T) -> ComponentId) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| id(item));
    sorted
}

fn row_name(category: ComponentType, id: ComponentId) -> String {
    format!("{} {}", category, id)
}

fn load_gen_type(
    category: ComponentType,
    id: ComponentId,
    code: i8,
) -> Result<LoadGenType, TranslationError> {
    LoadGenType::from_code(code).ok_or_else(|| {
        TranslationError::new(category.as_str(), Some(id), format!("invalid load/gen type {}", code))
    })
}

struct Builder {
    asymmetric: bool,
    omega: f64,
    network: AltNetwork,
    index: ComponentIndexMap,
    meta: BTreeMap<(ComponentType, ComponentId), ComponentMeta>,
    /// Node id → (bus row, rated voltage in V)
    buses: HashMap<ComponentId, (usize, f64)>,
}

impl Builder {
    fn record(
        &mut self,
        category: ComponentType,
        id: ComponentId,
        row: AltRow,
        meta: ComponentMeta,
    ) -> Result<(), TranslationError> {
        self.index.insert(category, id, row)?;
        self.meta.insert((category, id), meta);
        debug!(%category, %id, %row, "mapped component");
        Ok(())
    }

    fn bus(
        &self,
        category: ComponentType,
        id: ComponentId,
        node: ComponentId,
    ) -> Result<(usize, f64), TranslationError> {
        self.buses.get(&node).copied().ok_or_else(|| {
            TranslationError::new(
                category.as_str(),
                Some(id),
                format!("refers to unknown node {}", node),
            )
        })
    }

    /// Shunt conductance (µS) from a loss tangent and a capacitance (F).
    fn conductance(&self, tan: f64, capacitance: f64) -> f64 {
        Siemens(tan * self.omega * capacitance).to_microsiemens().value()
    }

    /// Open switch on the open end of a branch closed on one side only.
    fn open_end_switch(
        &mut self,
        category: ComponentType,
        id: ComponentId,
        et: &str,
        element: usize,
        bus: usize,
    ) -> Result<(), TranslationError> {
        let row = self.network.add_switch(SwitchRow {
            name: format!("{} open end", row_name(category, id)),
            bus,
            element,
            et: et.to_string(),
            closed: false,
        });
        self.index.insert_auxiliary(category, id, row)
    }

    fn line(&mut self, line: &Line) -> Result<(), TranslationError> {
        let category = ComponentType::Line;
        let (from_bus, from_voltage) = self.bus(category, line.id, line.from_node)?;
        let (to_bus, _) = self.bus(category, line.id, line.to_node)?;
        let from_closed = status_closed(line.from_status);
        let to_closed = status_closed(line.to_status);

        let (r0, x0, c0, tan0) = if line.has_zero_sequence() {
            (line.r0, line.x0, line.c0, line.tan0)
        } else {
            (line.r1, line.x1, line.c1, line.tan1)
        };
        let rated_current_known = line.i_n.is_finite();

        let row = self.network.add_line(LineRow {
            name: row_name(category, line.id),
            from_bus,
            to_bus,
            length_km: 1.0,
            r_ohm_per_km: line.r1,
            x_ohm_per_km: line.x1,
            c_nf_per_km: Farads(line.c1).to_nanofarads().value(),
            g_us_per_km: self.conductance(line.tan1, line.c1),
            r0_ohm_per_km: r0,
            x0_ohm_per_km: x0,
            c0_nf_per_km: Farads(c0).to_nanofarads().value(),
            g0_us_per_km: self.conductance(tan0, c0),
            max_i_ka: if rated_current_known {
                Amperes(line.i_n).to_kiloamperes().value()
            } else {
                UNRATED_MAX_I_KA
            },
            parallel: 1,
            df: 1.0,
            in_service: from_closed || to_closed,
        });
        let meta = ComponentMeta {
            rated_current_known,
            ..ComponentMeta::new(from_voltage, from_closed || to_closed)
        };
        self.record(category, line.id, row, meta)?;

        match (from_closed, to_closed) {
            (true, false) => self.open_end_switch(category, line.id, "l", row.row, to_bus),
            (false, true) => self.open_end_switch(category, line.id, "l", row.row, from_bus),
            _ => Ok(()),
        }
    }

    fn transformer(&mut self, t: &Transformer) -> Result<(), TranslationError> {
        let category = ComponentType::Transformer;
        let invalid = |reason: String| TranslationError::new(category.as_str(), Some(t.id), reason);

        let (from_bus, _) = self.bus(category, t.id, t.from_node)?;
        let (to_bus, _) = self.bus(category, t.id, t.to_node)?;
        let swapped = t.u2 > t.u1;
        let (hv_bus, lv_bus, u_hv, u_lv, winding_hv, winding_lv) = if swapped {
            (to_bus, from_bus, t.u2, t.u1, t.winding_to, t.winding_from)
        } else {
            (from_bus, to_bus, t.u1, t.u2, t.winding_from, t.winding_to)
        };

        let winding_hv = WindingType::from_code(winding_hv)
            .ok_or_else(|| invalid(format!("invalid winding type {}", winding_hv)))?;
        let winding_lv = WindingType::from_code(winding_lv)
            .ok_or_else(|| invalid(format!("invalid winding type {}", winding_lv)))?;
        let vector_group = format!("{}{}", winding_hv.hv_symbol(), winding_lv.lv_symbol());
        if self.asymmetric && !SUPPORTED_ASYM_VECTOR_GROUPS.contains(&vector_group.as_str()) {
            return Err(invalid(format!(
                "vector group {} is not supported in asymmetric calculations",
                vector_group
            )));
        }

        if t.clock == NA_INT {
            return Err(invalid("clock is missing".to_string()));
        }
        let shift = f64::from(t.clock) * 30.0;

        let tap_side = BranchSide::from_code(t.tap_side)
            .ok_or_else(|| invalid(format!("invalid tap side {}", t.tap_side)))?;
        let (u_tap, tap_on_hv) = match tap_side {
            BranchSide::From => (t.u1, !swapped),
            BranchSide::To => (t.u2, swapped),
        };

        let vk_percent = Fraction(t.uk).to_percent().value();
        let vkr_percent = Fraction(t.pk / t.sn).to_percent().value();
        let mag0_percent = if t.i0 > 0.0 && t.uk > 0.0 {
            100.0 / (t.i0 * t.uk)
        } else {
            OPEN_CIRCUIT_MAG0_PERCENT
        };

        let from_closed = status_closed(t.from_status);
        let to_closed = status_closed(t.to_status);
        let row = self.network.add_trafo(TrafoRow {
            name: row_name(category, t.id),
            hv_bus,
            lv_bus,
            sn_mva: VoltAmperes(t.sn).to_megavolt_amperes().value(),
            vn_hv_kv: Volts(u_hv).to_kilovolts().value(),
            vn_lv_kv: Volts(u_lv).to_kilovolts().value(),
            vk_percent,
            vkr_percent,
            pfe_kw: Watts(t.p0).to_kilowatts().value(),
            i0_percent: Fraction(t.i0).to_percent().value(),
            shift_degree: if swapped { -shift } else { shift },
            tap_side: if tap_on_hv { "hv" } else { "lv" }.to_string(),
            tap_neutral: i32::from(t.effective_tap_nom()),
            tap_min: i32::from(t.tap_min),
            tap_max: i32::from(t.tap_max),
            tap_pos: i32::from(t.tap_pos),
            tap_step_percent: Fraction(t.tap_size / u_tap).to_percent().value(),
            tap_step_degree: 0.0,
            tap_phase_shifter: false,
            vector_group,
            vk0_percent: vk_percent,
            vkr0_percent: vkr_percent,
            mag0_percent,
            mag0_rx: 0.0,
            si0_hv_partial: 0.9,
            parallel: 1,
            df: 1.0,
            in_service: from_closed || to_closed,
        });
        let meta = ComponentMeta {
            swapped,
            ..ComponentMeta::new(t.u1, from_closed || to_closed)
        };
        self.record(category, t.id, row, meta)?;

        match (from_closed, to_closed) {
            (true, false) => self.open_end_switch(category, t.id, "t", row.row, to_bus),
            (false, true) => self.open_end_switch(category, t.id, "t", row.row, from_bus),
            _ => Ok(()),
        }
    }

    fn source(&mut self, source: &Source) -> Result<(), TranslationError> {
        let category = ComponentType::Source;
        let (bus, u_rated) = self.bus(category, source.id, source.node)?;
        let in_service = status_closed(source.status);
        let row = self.network.add_ext_grid(ExtGridRow {
            name: row_name(category, source.id),
            bus,
            vm_pu: source.u_ref,
            va_degree: Radians(source.effective_u_ref_angle()).to_degrees().value(),
            s_sc_max_mva: VoltAmperes(source.effective_sk()).to_megavolt_amperes().value(),
            rx_max: source.effective_rx_ratio(),
            r0x0_max: source.effective_rx_ratio(),
            x0x_max: source.effective_z01_ratio(),
            in_service,
        });
        let meta = ComponentMeta::new(u_rated, in_service).attached(source.node);
        self.record(category, source.id, row, meta)
    }

    fn sym_appliance(
        &mut self,
        category: ComponentType,
        appliance: &SymLoadGen,
    ) -> Result<(), TranslationError> {
        let (bus, u_rated) = self.bus(category, appliance.id, appliance.node)?;
        let kind = load_gen_type(category, appliance.id, appliance.load_gen_type)?;
        if self.asymmetric && kind != LoadGenType::ConstPq {
            return Err(TranslationError::new(
                category.as_str(),
                Some(appliance.id),
                format!(
                    "{} appliances are not supported in asymmetric calculations",
                    kind.as_str()
                ),
            ));
        }

        let in_service = status_closed(appliance.status);
        let name = row_name(category, appliance.id);
        let p_mw = Watts(appliance.p_specified).to_megawatts().value();
        let q_mvar = Vars(appliance.q_specified).to_megavars().value();
        let mut meta = ComponentMeta::new(u_rated, in_service).attached(appliance.node);

        let row = if category == ComponentType::SymGen && kind == LoadGenType::ConstPq {
            self.network.add_sgen(SgenRow {
                name,
                bus,
                p_mw,
                q_mvar,
                sn_mva: None,
                scaling: 1.0,
                in_service,
                sgen_type: "wye".to_string(),
            })
        } else {
            // generators with voltage dependence become negative loads
            if category == ComponentType::SymGen {
                meta.sign = -1.0;
            }
            self.network.add_load(LoadRow {
                name,
                bus,
                p_mw: meta.sign * p_mw,
                q_mvar: meta.sign * q_mvar,
                const_z_percent: if kind == LoadGenType::ConstY { 100.0 } else { 0.0 },
                const_i_percent: if kind == LoadGenType::ConstI { 100.0 } else { 0.0 },
                sn_mva: None,
                scaling: 1.0,
                in_service,
                load_type: "wye".to_string(),
            })
        };
        self.record(category, appliance.id, row, meta)
    }

    fn asym_appliance(
        &mut self,
        category: ComponentType,
        appliance: &AsymLoadGen,
    ) -> Result<(), TranslationError> {
        let (bus, u_rated) = self.bus(category, appliance.id, appliance.node)?;
        let kind = load_gen_type(category, appliance.id, appliance.load_gen_type)?;
        if kind != LoadGenType::ConstPq {
            return Err(TranslationError::new(
                category.as_str(),
                Some(appliance.id),
                format!("{} asymmetric appliances have no alternate analogue", kind.as_str()),
            ));
        }

        let [pa, pb, pc] = appliance.p_specified.map(|p| Watts(p).to_megawatts().value());
        let [qa, qb, qc] = appliance.q_specified.map(|q| Vars(q).to_megavars().value());
        let in_service = status_closed(appliance.status);
        let row = AsymmetricRow {
            name: row_name(category, appliance.id),
            bus,
            p_a_mw: pa,
            p_b_mw: pb,
            p_c_mw: pc,
            q_a_mvar: qa,
            q_b_mvar: qb,
            q_c_mvar: qc,
            sn_mva: None,
            scaling: 1.0,
            in_service,
            connection: "wye".to_string(),
        };
        let row = if category == ComponentType::AsymGen {
            self.network.add_asymmetric_sgen(row)
        } else {
            self.network.add_asymmetric_load(row)
        };

        let balanced = pa == pb && pb == pc && qa == qb && qb == qc;
        let meta = ComponentMeta {
            balanced,
            ..ComponentMeta::new(u_rated, in_service).attached(appliance.node)
        };
        self.record(category, appliance.id, row, meta)
    }

    fn shunt(&mut self, shunt: &Shunt) -> Result<(), TranslationError> {
        let category = ComponentType::Shunt;
        let (bus, u_rated) = self.bus(category, shunt.id, shunt.node)?;
        // the alternate shunt has a single admittance for all sequences
        if self.asymmetric && !shunt.sequences_match() {
            return Err(TranslationError::new(
                category.as_str(),
                Some(shunt.id),
                format!(
                    "zero-sequence admittance ({}, {}) differs from positive-sequence ({}, {})",
                    shunt.g0, shunt.b0, shunt.g1, shunt.b1
                ),
            ));
        }
        let vn_kv = Volts(u_rated).to_kilovolts().value();
        let in_service = status_closed(shunt.status);
        let row = self.network.add_shunt(ShuntRow {
            name: row_name(category, shunt.id),
            bus,
            p_mw: shunt.g1 * vn_kv * vn_kv,
            q_mvar: -shunt.b1 * vn_kv * vn_kv,
            vn_kv,
            step: 1,
            max_step: 1,
            in_service,
        });
        let meta = ComponentMeta::new(u_rated, in_service).attached(shunt.node);
        self.record(category, shunt.id, row, meta)
    }
}
