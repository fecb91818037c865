//! Bidirectional map between canonical components and alternate rows.
//!
//! Every translated component owns exactly one *primary* row; helper rows the
//! translator adds (open switches for single-side open lines) are recorded as
//! *auxiliary* rows owned by the component that caused them. Auxiliary rows
//! never take part in reconciliation.

use pfx_core::alternate::{AltNetwork, AltRow, AltTable};
use pfx_core::{ComponentId, ComponentType, TranslationError};
use serde::Serialize;
use std::collections::BTreeMap;

type ComponentKey = (ComponentType, ComponentId);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentIndexMap {
    forward: BTreeMap<ComponentKey, AltRow>,
    inverse: BTreeMap<AltRow, ComponentKey>,
    auxiliary: BTreeMap<AltRow, ComponentKey>,
}

/// One serializable map entry, for dumping the map next to the tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub category: ComponentType,
    pub id: ComponentId,
    pub table: AltTable,
    pub row: usize,
    pub auxiliary: bool,
}

impl ComponentIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the primary row of a component.
    pub fn insert(
        &mut self,
        category: ComponentType,
        id: ComponentId,
        row: AltRow,
    ) -> Result<(), TranslationError> {
        if let Some(existing) = self.forward.get(&(category, id)) {
            return Err(TranslationError::new(
                category.as_str(),
                Some(id),
                format!("already mapped to {}", existing),
            ));
        }
        if let Some((owner_category, owner_id)) = self.owner(row) {
            return Err(TranslationError::new(
                category.as_str(),
                Some(id),
                format!("row {} already belongs to {} {}", row, owner_category, owner_id),
            ));
        }
        self.forward.insert((category, id), row);
        self.inverse.insert(row, (category, id));
        Ok(())
    }

    /// Record a helper row owned by an already mapped component.
    pub fn insert_auxiliary(
        &mut self,
        category: ComponentType,
        id: ComponentId,
        row: AltRow,
    ) -> Result<(), TranslationError> {
        if !self.forward.contains_key(&(category, id)) {
            return Err(TranslationError::new(
                category.as_str(),
                Some(id),
                format!("auxiliary row {} added before the primary row", row),
            ));
        }
        if self.owner(row).is_some() {
            return Err(TranslationError::new(
                category.as_str(),
                Some(id),
                format!("row {} is already mapped", row),
            ));
        }
        self.auxiliary.insert(row, (category, id));
        Ok(())
    }

    /// Primary row of a component.
    pub fn get(&self, category: ComponentType, id: ComponentId) -> Option<AltRow> {
        self.forward.get(&(category, id)).copied()
    }

    /// Component owning a primary or auxiliary row.
    pub fn owner(&self, row: AltRow) -> Option<(ComponentType, ComponentId)> {
        self.inverse
            .get(&row)
            .or_else(|| self.auxiliary.get(&row))
            .copied()
    }

    pub fn is_auxiliary(&self, row: AltRow) -> bool {
        self.auxiliary.contains_key(&row)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn auxiliary_len(&self) -> usize {
        self.auxiliary.len()
    }

    /// Check that the map is a total bijection onto the rows of `network`:
    /// every row is owned by exactly one entry and every entry points at an
    /// existing row.
    pub fn verify_bijection(&self, network: &AltNetwork) -> Result<(), TranslationError> {
        if self.forward.len() != self.inverse.len() {
            return Err(TranslationError::new(
                "index map",
                None,
                format!(
                    "{} components map onto {} rows",
                    self.forward.len(),
                    self.inverse.len()
                ),
            ));
        }
        for ((category, id), row) in &self.forward {
            if self.inverse.get(row) != Some(&(*category, *id)) {
                return Err(TranslationError::new(
                    category.as_str(),
                    Some(*id),
                    format!("row {} does not map back to the component", row),
                ));
            }
        }

        for table in AltTable::ALL {
            for row in 0..network.table_len(table) {
                let row = AltRow::new(table, row);
                let primary = self.inverse.contains_key(&row);
                let auxiliary = self.auxiliary.contains_key(&row);
                match (primary, auxiliary) {
                    (true, false) | (false, true) => {}
                    (false, false) => {
                        return Err(TranslationError::new(
                            "index map",
                            None,
                            format!("row {} has no canonical owner", row),
                        ))
                    }
                    (true, true) => {
                        return Err(TranslationError::new(
                            "index map",
                            None,
                            format!("row {} is both primary and auxiliary", row),
                        ))
                    }
                }
            }
        }

        for row in self.inverse.keys().chain(self.auxiliary.keys()) {
            if row.row >= network.table_len(row.table) {
                return Err(TranslationError::new(
                    "index map",
                    None,
                    format!("row {} does not exist", row),
                ));
            }
        }
        Ok(())
    }

    /// All entries, primary rows in canonical order followed by auxiliary rows.
    pub fn entries(&self) -> Vec<IndexEntry> {
        let primary = self.forward.iter().map(|((category, id), row)| IndexEntry {
            category: *category,
            id: *id,
            table: row.table,
            row: row.row,
            auxiliary: false,
        });
        let auxiliary = self.auxiliary.iter().map(|(row, (category, id))| IndexEntry {
            category: *category,
            id: *id,
            table: row.table,
            row: row.row,
            auxiliary: true,
        });
        primary.chain(auxiliary).collect()
    }
}
