//! Translation between the canonical model and the alternate table model.
//!
//! [`Translator`] builds an [`AltNetwork`](pfx_core::alternate::AltNetwork)
//! plus a [`ComponentIndexMap`]; [`reconcile`] uses both to turn the alternate
//! engine's raw result tables back into a canonical
//! [`ResultSet`](pfx_core::ResultSet).

pub mod index_map;
pub mod reconciler;
pub mod translator;

pub use index_map::{ComponentIndexMap, IndexEntry};
pub use reconciler::reconcile;
pub use translator::{
    translate, ComponentMeta, Translation, Translator, DEFAULT_FREQUENCY_HZ,
    OPEN_CIRCUIT_MAG0_PERCENT, SUPPORTED_ASYM_VECTOR_GROUPS, UNRATED_MAX_I_KA,
};
