//! Alternate result tables → canonical result set.
//!
//! Every canonical record is looked up through the index map and read from
//! the result table of the mapped row, by element index and never by data
//! position. Records come out in the canonical input order. Nodes are
//! reconciled first because appliance currents are derived from the
//! voltage of the attachment node.

use super::translator::{ComponentMeta, Translation};
use pfx_core::alternate::{AltRow, AltTable, RawResultSet, RawTableView};
use pfx_core::units::{Degrees, Kiloamperes, Megavars, Megawatts, Percent, PerUnit, Volts};
use pfx_core::{
    ApplianceOutput, BranchOutput, CalculationSymmetry, ComponentId, ComponentType, NodeOutput,
    OutputRecord, PhaseValue, ReconciliationError, ResultSet,
};
use pfx_core::ComponentKind;
use std::collections::HashMap;
use tracing::debug;

const PHASES: [&str; 3] = ["a", "b", "c"];

/// Map raw alternate results back onto canonical ids and units.
pub fn reconcile(
    raw: &RawResultSet,
    translation: &Translation,
) -> Result<ResultSet, ReconciliationError> {
    let views = raw
        .tables
        .iter()
        .map(|(name, table)| (name.as_str(), table.view()))
        .collect();
    let mut reconciler = Reconciler {
        symmetry: translation.symmetry,
        translation,
        views,
        nodes: HashMap::new(),
    };

    let mut result = ResultSet::new(translation.symmetry);
    for (category, ids) in &translation.order {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let target = reconciler.target(*category, *id)?;
            let record = match category.kind() {
                ComponentKind::Node => OutputRecord::Node(reconciler.node(target)?),
                ComponentKind::Branch => OutputRecord::Branch(reconciler.branch(target)?),
                ComponentKind::Appliance => OutputRecord::Appliance(reconciler.appliance(target)?),
                other => {
                    return Err(target.error(format!("{:?} outputs cannot be reconciled", other)))
                }
            };
            records.push(record);
        }
        result.insert(*category, records);
    }

    debug!(
        records = result.record_count(),
        mode = %translation.symmetry,
        "reconciled alternate results"
    );
    Ok(result)
}

/// One canonical component and the alternate row it was mapped to.
#[derive(Debug, Clone, Copy)]
struct Target {
    category: ComponentType,
    id: ComponentId,
    row: AltRow,
}

impl Target {
    fn error(&self, reason: impl Into<String>) -> ReconciliationError {
        ReconciliationError::new(self.category.as_str(), Some(self.id), reason)
    }
}

/// Column reader bound to one result row.
struct RowReader<'r, 'a> {
    table: String,
    view: &'r RawTableView<'a>,
    target: Target,
    symmetry: CalculationSymmetry,
}

impl RowReader<'_, '_> {
    fn scalar(&self, column: &str) -> Result<f64, ReconciliationError> {
        if !self.view.has_column(column) {
            return Err(self.target.error(format!(
                "result table {} has no column {}",
                self.table, column
            )));
        }
        self.view.get(self.target.row.row, column).ok_or_else(|| {
            self.target
                .error(format!("result table {} has no row {}", self.table, self.target.row.row))
        })
    }

    /// `{prefix}_{suffix}` in symmetric mode, `{prefix}_{phase}_{suffix}`
    /// per phase otherwise.
    fn phased(&self, prefix: &str, suffix: &str) -> Result<PhaseValue, ReconciliationError> {
        match self.symmetry {
            CalculationSymmetry::Symmetric => {
                Ok(PhaseValue::Scalar(self.scalar(&format!("{}_{}", prefix, suffix))?))
            }
            CalculationSymmetry::Asymmetric => {
                let mut values = [0.0; 3];
                for (slot, phase) in values.iter_mut().zip(PHASES) {
                    *slot = self.scalar(&format!("{}_{}_{}", prefix, phase, suffix))?;
                }
                Ok(PhaseValue::PerPhase(values))
            }
        }
    }

    fn has_phase_columns(&self, prefix: &str, suffix: &str) -> bool {
        PHASES
            .iter()
            .all(|phase| self.view.has_column(&format!("{}_{}_{}", prefix, phase, suffix)))
    }
}

struct Reconciler<'a> {
    symmetry: CalculationSymmetry,
    translation: &'a Translation,
    views: HashMap<&'a str, RawTableView<'a>>,
    /// Node id → (energized, voltage magnitude in V)
    nodes: HashMap<ComponentId, (bool, PhaseValue)>,
}

impl<'a> Reconciler<'a> {
    fn target(
        &self,
        category: ComponentType,
        id: ComponentId,
    ) -> Result<Target, ReconciliationError> {
        let row = self.translation.index.get(category, id).ok_or_else(|| {
            ReconciliationError::new(category.as_str(), Some(id), "component is not in the index map")
        })?;
        Ok(Target { category, id, row })
    }

    fn meta(&self, target: Target) -> Result<&'a ComponentMeta, ReconciliationError> {
        self.translation
            .meta(target.category, target.id)
            .ok_or_else(|| target.error("component has no translation metadata"))
    }

    fn reader(&self, target: Target) -> Result<RowReader<'_, 'a>, ReconciliationError> {
        let table = target.row.table.result_table(self.symmetry.is_symmetric());
        let view = self
            .views
            .get(table.as_str())
            .ok_or_else(|| target.error(format!("result table {} is missing", table)))?;
        if !view.has_row(target.row.row) {
            return Err(target.error(format!("result table {} has no row {}", table, target.row.row)));
        }
        Ok(RowReader {
            table,
            view,
            target,
            symmetry: self.symmetry,
        })
    }

    fn node(&mut self, target: Target) -> Result<NodeOutput, ReconciliationError> {
        let meta = self.meta(target)?;
        let (vm, va, p, q) = {
            let reader = self.reader(target)?;
            (
                reader.phased("vm", "pu")?,
                reader.phased("va", "degree")?,
                reader.phased("p", "mw")?,
                reader.phased("q", "mvar")?,
            )
        };

        let energized = meta.in_service && vm.is_finite() && va.is_finite();
        let output = if energized {
            let base = match self.symmetry {
                CalculationSymmetry::Symmetric => Volts(meta.base_voltage),
                CalculationSymmetry::Asymmetric => Volts(meta.base_voltage).line_to_neutral(),
            };
            // alternate bus powers are net consumption, canonical ones injection
            NodeOutput {
                id: target.id,
                energized: 1,
                u_pu: vm,
                u: vm.map(|v| PerUnit(v).to_volts(base).value()),
                u_angle: va.map(|v| Degrees(v).to_radians().value()),
                p: p.map(|v| -Megawatts(v).to_watts().value()),
                q: q.map(|v| -Megavars(v).to_vars().value()),
            }
        } else {
            let zero = PhaseValue::zero(self.symmetry);
            NodeOutput {
                id: target.id,
                energized: 0,
                u_pu: zero,
                u: zero,
                u_angle: zero,
                p: zero,
                q: zero,
            }
        };
        self.nodes.insert(target.id, (energized, output.u));
        Ok(output)
    }

    fn branch(&self, target: Target) -> Result<BranchOutput, ReconciliationError> {
        let meta = self.meta(target)?;
        let (from, to) = match target.row.table {
            AltTable::Line => ("from", "to"),
            AltTable::Trafo if meta.swapped => ("lv", "hv"),
            AltTable::Trafo => ("hv", "lv"),
            other => return Err(target.error(format!("{} rows are not branches", other))),
        };

        let reader = self.reader(target)?;
        let side = |side: &str| -> Result<[PhaseValue; 3], ReconciliationError> {
            Ok([
                reader
                    .phased("p", &format!("{}_mw", side))?
                    .map(|v| Megawatts(v).to_watts().value()),
                reader
                    .phased("q", &format!("{}_mvar", side))?
                    .map(|v| Megavars(v).to_vars().value()),
                reader
                    .phased("i", &format!("{}_ka", side))?
                    .map(|v| Kiloamperes(v).to_amperes().value()),
            ])
        };
        let [p_from, q_from, i_from] = side(from)?;
        let [p_to, q_to, i_to] = side(to)?;
        let loading_percent = reader.scalar("loading_percent")?;

        let energized = meta.in_service
            && [p_from, q_from, i_from, p_to, q_to, i_to]
                .iter()
                .all(PhaseValue::is_finite);
        if !energized {
            let zero = PhaseValue::zero(self.symmetry);
            return Ok(BranchOutput {
                id: target.id,
                energized: 0,
                loading: if meta.rated_current_known { 0.0 } else { f64::NAN },
                p_from: zero,
                q_from: zero,
                i_from: zero,
                s_from: zero,
                p_to: zero,
                q_to: zero,
                i_to: zero,
                s_to: zero,
            });
        }

        Ok(BranchOutput {
            id: target.id,
            energized: 1,
            loading: if meta.rated_current_known {
                Percent(loading_percent).to_fraction().value()
            } else {
                f64::NAN
            },
            p_from,
            q_from,
            i_from,
            s_from: p_from.zip_with(q_from, f64::hypot),
            p_to,
            q_to,
            i_to,
            s_to: p_to.zip_with(q_to, f64::hypot),
        })
    }

    fn appliance(&self, target: Target) -> Result<ApplianceOutput, ReconciliationError> {
        let meta = self.meta(target)?;
        let node = meta
            .node
            .ok_or_else(|| target.error("appliance has no attachment node"))?;
        let (node_energized, u) = *self
            .nodes
            .get(&node)
            .ok_or_else(|| target.error(format!("node {} has no reconciled result", node)))?;

        let reader = self.reader(target)?;
        let (p, q) = self.appliance_power(&reader, meta)?;
        let p = p.map(|v| meta.sign * Megawatts(v).to_watts().value());
        let q = q.map(|v| meta.sign * Megavars(v).to_vars().value());

        let energized = meta.in_service && node_energized && p.is_finite() && q.is_finite();
        if !energized {
            let zero = PhaseValue::zero(self.symmetry);
            return Ok(ApplianceOutput {
                id: target.id,
                energized: 0,
                p: zero,
                q: zero,
                i: zero,
                s: zero,
                pf: zero,
            });
        }

        let s = p.zip_with(q, f64::hypot);
        // u is line-to-line in symmetric mode and per phase line-to-neutral otherwise
        let phase_factor = match self.symmetry {
            CalculationSymmetry::Symmetric => 3f64.sqrt(),
            CalculationSymmetry::Asymmetric => 1.0,
        };
        let i = s.zip_with(u, |s, u| if u == 0.0 { 0.0 } else { s / (phase_factor * u) });
        let pf = p.zip_with(s, |p, s| if s == 0.0 { 0.0 } else { p / s });
        Ok(ApplianceOutput {
            id: target.id,
            energized: 1,
            p,
            q,
            i,
            s,
            pf,
        })
    }

    /// Active and reactive power in MW / Mvar as the alternate engine reports them.
    ///
    /// Asymmetric result tables may only carry totals for some element types;
    /// those are split evenly when the element is balanced.
    fn appliance_power(
        &self,
        reader: &RowReader<'_, '_>,
        meta: &ComponentMeta,
    ) -> Result<(PhaseValue, PhaseValue), ReconciliationError> {
        if self.symmetry.is_symmetric()
            || (reader.has_phase_columns("p", "mw") && reader.has_phase_columns("q", "mvar"))
        {
            return Ok((reader.phased("p", "mw")?, reader.phased("q", "mvar")?));
        }
        if !meta.balanced {
            return Err(reader.target.error(format!(
                "result table {} has no per-phase power columns for an unbalanced appliance",
                reader.table
            )));
        }
        let p = reader.scalar("p_mw")? / 3.0;
        let q = reader.scalar("q_mvar")? / 3.0;
        Ok((
            PhaseValue::splat(self.symmetry, p),
            PhaseValue::splat(self.symmetry, q),
        ))
    }
}
