//! Fixture export for pfx.
//!
//! Cases come from the built-in generators ([`cases`]) or from canonical
//! files listed in a case manifest ([`registry`]). Each case is exported
//! per calculation mode into `<prefix>-<sym|asym>-<case>/`; a run writes
//! `batch_manifest.json` describing every job.

pub mod cases;
pub mod exporter;
pub mod fixture;
pub mod job;
pub mod manifest;
pub mod params;
pub mod registry;
pub mod runner;

pub use cases::BuiltinCase;
pub use exporter::{ExportOutcome, FixtureExporter};
pub use fixture::{load_fixture, Fixture, FixtureWriter};
pub use job::{directory_name, jobs_from_registry, FixtureJob, FixtureJobRecord, DEFAULT_PREFIX};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest};
pub use params::{FixtureParams, ToleranceOverride, DEFAULT_LICENSE_TEXT};
pub use registry::{CaseRegistry, CaseSource, CaseSpec};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary};
