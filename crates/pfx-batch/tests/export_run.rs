use pfx_batch::manifest::BATCH_MANIFEST_FILE;
use pfx_batch::{
    jobs_from_registry, load_batch_manifest, load_fixture, run_batch, BatchRunnerConfig,
    CaseRegistry, CaseSource, CaseSpec, FixtureParams, DEFAULT_LICENSE_TEXT, DEFAULT_PREFIX,
};
use pfx_core::{CalculationSymmetry, ComponentId, Network, Node};
use pfx_io::exporters::write_network;
use pfx_solver_common::{FlatAlternateSolver, FlatCanonicalSolver};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn config(registry: &CaseRegistry, root: &Path, strict: bool) -> BatchRunnerConfig {
    BatchRunnerConfig {
        jobs: jobs_from_registry(registry, DEFAULT_PREFIX, &FixtureParams::default(), None),
        output_root: root.to_path_buf(),
        license_text: DEFAULT_LICENSE_TEXT.to_string(),
        max_iterations: 20,
        frequency: 50.0,
        strict,
    }
}

#[test]
fn builtin_cases_export_with_flat_engines() {
    let out = TempDir::new().unwrap();
    let registry = CaseRegistry::builtin();
    let summary = run_batch(
        &config(&registry, out.path(), true),
        &registry,
        &FlatCanonicalSolver,
        &FlatAlternateSolver,
    )
    .unwrap();

    let failures: Vec<_> = summary
        .jobs
        .iter()
        .filter(|job| !job.is_ok())
        .map(|job| format!("{}: {:?}", job.job_id, job.error))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert_eq!(summary.success, 17);

    let fixture = load_fixture(&out.path().join("pp-asym-transformer")).unwrap();
    assert_eq!(fixture.symmetry, CalculationSymmetry::Asymmetric);
    assert_eq!(fixture.params.rtol, 1e-2);
    assert_eq!(fixture.canonical.categories(), fixture.alternate.categories());
    assert!(out.path().join("pp-sym-line/params.json.license").is_file());
    assert!(!out.path().join("pp-asym-basic-node").exists());
}

#[test]
fn manifest_lists_every_job() {
    let out = TempDir::new().unwrap();
    let registry = CaseRegistry::builtin()
        .select(&["line".to_string(), "shunt".to_string()])
        .unwrap();
    let summary = run_batch(
        &config(&registry, out.path(), false),
        &registry,
        &FlatCanonicalSolver,
        &FlatAlternateSolver,
    )
    .unwrap();
    assert_eq!(summary.manifest_path, out.path().join(BATCH_MANIFEST_FILE));

    let manifest = load_batch_manifest(&summary.manifest_path).unwrap();
    assert_eq!(manifest.num_cases, 4);
    assert_eq!(manifest.canonical_solver, "flat");
    let ids: Vec<&str> = manifest.cases.iter().map(|c| c.job_id.as_str()).collect();
    assert_eq!(
        ids,
        ["pp-sym-line", "pp-asym-line", "pp-sym-shunt", "pp-asym-shunt"]
    );
    assert!(manifest.cases.iter().all(|c| c.comparison.is_some()));
}

#[test]
fn unsupported_category_fails_without_output() {
    let cases = TempDir::new().unwrap();
    let mut network = Network::new();
    network.node.push(Node::new(ComponentId::new(1), 10_500.0));
    network.node.push(Node::new(ComponentId::new(2), 10_500.0));
    network.opaque.insert(
        "link".to_string(),
        vec![json!({"id": 3, "from_node": 1, "to_node": 2, "from_status": 1, "to_status": 1})],
    );
    let input = cases.path().join("linked.json");
    write_network(&network, &input).unwrap();

    let mut registry = CaseRegistry::builtin()
        .select(&["basic-node".to_string()])
        .unwrap();
    registry
        .register(CaseSpec {
            name: "linked".into(),
            source: CaseSource::File(input),
            modes: vec![CalculationSymmetry::Symmetric],
            overrides: Vec::new(),
        })
        .unwrap();

    let out = TempDir::new().unwrap();
    let summary = run_batch(
        &config(&registry, out.path(), false),
        &registry,
        &FlatCanonicalSolver,
        &FlatAlternateSolver,
    )
    .unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failure, 1);

    let failed = summary
        .jobs
        .iter()
        .find(|job| job.job_id == "pp-sym-linked")
        .unwrap();
    assert_eq!(failed.stage.as_deref(), Some("translation"));
    assert!(failed.error.as_deref().unwrap().contains("link"));
    assert!(!out.path().join("pp-sym-linked").exists());
    assert!(out.path().join("pp-sym-basic-node/input.json").is_file());
}
