use spiloader_core::{
    declare_contract, erase, manifest_path, verify, ContractId, DirectoryRoot, DiscoveryEngine,
    DiscoveryError, DiscoveryPolicy, DuplicatePolicy, ErasedInstance, ErrorPolicy,
    InstantiationFailure, ProviderEntry, ProviderRegistry, SearchRoot, StaticRoot, VerifyError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub trait Service {
    fn name(&self) -> String;
}

declare_contract!(dyn Service, "example.Service");

pub trait AutoService {
    fn tag(&self) -> &'static str;
}

declare_contract!(dyn AutoService, "example.AutoService");

static SERIAL: AtomicUsize = AtomicUsize::new(0);
static IDS_ONLY_BUILDS: AtomicUsize = AtomicUsize::new(0);
static FAIL_FAST_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct SomeImpl {
    serial: usize,
}

impl Service for SomeImpl {
    fn name(&self) -> String {
        format!("some-impl#{}", self.serial)
    }
}

struct Tracked;

impl Service for Tracked {
    fn name(&self) -> String {
        "tracked".to_string()
    }
}

struct AutoOne;
struct AutoTwo;

impl AutoService for AutoOne {
    fn tag(&self) -> &'static str {
        "one"
    }
}

impl AutoService for AutoTwo {
    fn tag(&self) -> &'static str {
        "two"
    }
}

fn construct_some_impl() -> Result<ErasedInstance, String> {
    let serial = SERIAL.fetch_add(1, Ordering::SeqCst);
    Ok(erase::<dyn Service>(Box::new(SomeImpl { serial })))
}

fn construct_ids_only() -> Result<ErasedInstance, String> {
    IDS_ONLY_BUILDS.fetch_add(1, Ordering::SeqCst);
    Ok(erase::<dyn Service>(Box::new(Tracked)))
}

fn construct_fail_fast_probe() -> Result<ErasedInstance, String> {
    FAIL_FAST_BUILDS.fetch_add(1, Ordering::SeqCst);
    Ok(erase::<dyn Service>(Box::new(Tracked)))
}

fn construct_auto_one() -> Result<ErasedInstance, String> {
    Ok(erase::<dyn AutoService>(Box::new(AutoOne)))
}

fn construct_auto_two() -> Result<ErasedInstance, String> {
    Ok(erase::<dyn AutoService>(Box::new(AutoTwo)))
}

fn construct_broken() -> Result<ErasedInstance, String> {
    Err("backing store unavailable".to_string())
}

fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.declare::<dyn Service>().unwrap();
    registry.declare::<dyn AutoService>().unwrap();
    for entry in [
        ProviderEntry::new("example.Service", "impl.SomeImpl", module_path!(), construct_some_impl),
        ProviderEntry::new("example.Service", "impl.IdsOnly", module_path!(), construct_ids_only),
        ProviderEntry::new(
            "example.Service",
            "impl.FailFastProbe",
            module_path!(),
            construct_fail_fast_probe,
        ),
        ProviderEntry::new("example.Service", "impl.Broken", module_path!(), construct_broken),
        ProviderEntry::new("example.AutoService", "auto.One", module_path!(), construct_auto_one),
        ProviderEntry::new("example.AutoService", "auto.Two", module_path!(), construct_auto_two),
    ] {
        registry.register(entry).unwrap();
    }
    registry
}

fn dir_root(contract: &str, content: &str) -> (TempDir, DirectoryRoot) {
    let dir = tempfile::tempdir().unwrap();
    let path = manifest_path(dir.path(), &ContractId::parse(contract).unwrap());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
    let root = DirectoryRoot::new(dir.path());
    (dir, root)
}

fn static_root(name: &str, contract: &str, content: &str) -> Box<dyn SearchRoot> {
    Box::new(StaticRoot::new(name).with_manifest(ContractId::parse(contract).unwrap(), content))
}

fn engine(roots: Vec<Box<dyn SearchRoot>>) -> DiscoveryEngine {
    DiscoveryEngine::new(registry(), roots)
}

fn provider_ids(engine: &DiscoveryEngine, contract: &str) -> Vec<String> {
    engine
        .discover(contract)
        .unwrap()
        .map(|instance| instance.unwrap().provider().to_string())
        .collect()
}

#[test]
fn single_manual_manifest_verifies_one_provider() {
    let (_dir, root) = dir_root("example.Service", "impl.SomeImpl\n");
    let engine = engine(vec![Box::new(root)]);

    let report = verify(&engine, "example.Service", 1).unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.providers, vec!["impl.SomeImpl"]);
}

#[test]
fn two_roots_yield_both_providers_in_root_order() {
    let (_first_dir, first) = dir_root("example.AutoService", "auto.Two\n");
    let (_second_dir, second) = dir_root("example.AutoService", "auto.One\n");
    let engine = engine(vec![Box::new(first), Box::new(second)]);

    let report = verify(&engine, "example.AutoService", 2).unwrap();
    assert_eq!(report.providers, vec!["auto.Two", "auto.One"]);

    let tags: Vec<&str> = engine
        .load::<dyn AutoService>()
        .unwrap()
        .map(|provider| provider.unwrap().tag())
        .collect();
    assert_eq!(tags, vec!["two", "one"]);
}

#[test]
fn count_mismatch_reports_expected_and_actual() {
    let (_dir, root) = dir_root("example.Service", "impl.SomeImpl\n");
    let engine = engine(vec![Box::new(root)]);

    let err = verify(&engine, "example.Service", 2).unwrap_err();
    match err {
        VerifyError::CountMismatch {
            contract,
            expected,
            actual,
            providers,
        } => {
            assert_eq!(contract, "example.Service");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
            assert_eq!(providers, vec!["impl.SomeImpl"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn comment_and_blank_only_manifest_contributes_nothing() {
    let (_empty_dir, empty) = dir_root("example.Service", "# nothing here yet\n\n");
    let (_dir, root) = dir_root("example.Service", "impl.SomeImpl\n");
    let engine = engine(vec![Box::new(empty), Box::new(root)]);

    assert_eq!(provider_ids(&engine, "example.Service"), vec!["impl.SomeImpl"]);
    verify(&engine, "example.Service", 1).unwrap();
}

#[test]
fn contract_without_manifests_yields_empty_sequence() {
    let (_dir, root) = dir_root("example.Service", "impl.SomeImpl\n");
    let engine = engine(vec![Box::new(root)]);

    let mut discovery = engine.discover("example.AutoService").unwrap();
    assert!(discovery.next().is_none());
    assert_eq!(discovery.yielded(), 0);

    let no_roots = self::engine(Vec::new());
    verify(&no_roots, "example.Service", 0).unwrap();
}

#[test]
fn undeclared_or_invalid_contract_is_not_found() {
    let engine = engine(Vec::new());

    for contract in ["example.Missing", "../example.Service", "   "] {
        let err = engine.discover(contract).err().expect("discover must fail");
        assert!(matches!(err, DiscoveryError::ContractNotFound { .. }));
    }

    let err = verify(&engine, "example.Missing", 0).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Discovery(DiscoveryError::ContractNotFound { .. })
    ));
}

#[test]
fn count_sums_every_line_across_roots_including_repeats() {
    let first = static_root(
        "first",
        "example.AutoService",
        "auto.One\n# comment\nauto.One\n\nauto.Two # trailing comment\n",
    );
    let second = static_root("second", "example.AutoService", "auto.One\n");
    let engine = engine(vec![first, second]);

    assert_eq!(
        provider_ids(&engine, "example.AutoService"),
        vec!["auto.One", "auto.One", "auto.Two", "auto.One"]
    );
    verify(&engine, "example.AutoService", 4).unwrap();
}

#[test]
fn repeated_discovery_returns_same_ids_with_fresh_instances() {
    let root = static_root("memory", "example.Service", "impl.SomeImpl\n");
    let engine = engine(vec![root]);

    let first: Vec<_> = engine
        .load::<dyn Service>()
        .unwrap()
        .map(|provider| provider.unwrap())
        .collect();
    let second: Vec<_> = engine
        .load::<dyn Service>()
        .unwrap()
        .map(|provider| provider.unwrap())
        .collect();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id(), second[0].id());
    assert_eq!(first[0].root(), "memory");
    assert_ne!(first[0].name(), second[0].name());
}

#[test]
fn malformed_line_under_fail_fast_stops_before_later_roots() {
    let good = static_root("good", "example.Service", "impl.SomeImpl\n");
    let bad = static_root(
        "bad",
        "example.Service",
        "impl.FailFastProbe\nimpl.Bad Name\n",
    );
    let later = static_root("later", "example.Service", "impl.FailFastProbe\n");
    let engine = engine(vec![good, bad, later]);

    let mut discovery = engine.discover("example.Service").unwrap();
    let first = discovery.next().unwrap().unwrap();
    assert_eq!(first.provider().as_str(), "impl.SomeImpl");

    match discovery.next().unwrap().unwrap_err() {
        DiscoveryError::MalformedManifest {
            contract,
            root,
            line,
            content,
            ..
        } => {
            assert_eq!(contract, "example.Service");
            assert_eq!(root, "bad");
            assert_eq!(line, 2);
            assert_eq!(content, "impl.Bad Name");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(discovery.next().is_none());
    assert_eq!(FAIL_FAST_BUILDS.load(Ordering::SeqCst), 0);
}

#[test]
fn malformed_line_under_skip_policy_is_dropped() {
    let root = static_root(
        "mixed",
        "example.AutoService",
        "auto.One\nnot a provider\nauto.Two\n",
    );
    let engine = engine(vec![root]).with_policy(DiscoveryPolicy {
        on_malformed: ErrorPolicy::Skip,
        ..DiscoveryPolicy::default()
    });

    let mut discovery = engine.discover("example.AutoService").unwrap();
    let ids: Vec<String> = discovery
        .by_ref()
        .map(|instance| instance.unwrap().provider().to_string())
        .collect();
    assert_eq!(ids, vec!["auto.One", "auto.Two"]);
    assert_eq!(discovery.skipped(), 1);
}

#[test]
fn instantiation_failure_is_fail_fast_by_default() {
    let root = static_root(
        "memory",
        "example.Service",
        "impl.Broken\nimpl.SomeImpl\n",
    );
    let engine = engine(vec![root]);

    let outcomes: Vec<_> = engine.discover("example.Service").unwrap().collect();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        Err(DiscoveryError::ProviderInstantiation {
            provider, reason, ..
        }) => {
            assert_eq!(provider, "impl.Broken");
            assert_eq!(
                reason,
                &InstantiationFailure::Constructor("backing store unavailable".to_string())
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn instantiation_failures_are_skipped_when_configured() {
    let root = static_root(
        "memory",
        "example.Service",
        "impl.Broken\nimpl.Unregistered\nimpl.SomeImpl\n",
    );
    let engine = engine(vec![root]).with_policy(DiscoveryPolicy {
        on_instantiation_error: ErrorPolicy::Skip,
        ..DiscoveryPolicy::default()
    });

    let mut discovery = engine.discover("example.Service").unwrap();
    let ids: Vec<String> = discovery
        .by_ref()
        .map(|instance| instance.unwrap().provider().to_string())
        .collect();
    assert_eq!(ids, vec!["impl.SomeImpl"]);
    assert_eq!(discovery.skipped(), 2);
}

#[test]
fn unregistered_provider_reports_not_registered() {
    let root = static_root("memory", "example.Service", "impl.Unregistered\n");
    let engine = engine(vec![root]);

    let err = verify(&engine, "example.Service", 1).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Discovery(DiscoveryError::ProviderInstantiation {
            reason: InstantiationFailure::NotRegistered,
            ..
        })
    ));
}

#[test]
fn provider_of_another_contract_is_a_fatal_type_mismatch() {
    let root = static_root("memory", "example.Service", "auto.One\nimpl.SomeImpl\n");
    let engine = engine(vec![root]).with_policy(DiscoveryPolicy {
        on_instantiation_error: ErrorPolicy::Skip,
        ..DiscoveryPolicy::default()
    });

    let outcomes: Vec<_> = engine.discover("example.Service").unwrap().collect();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        Err(DiscoveryError::ProviderTypeMismatch {
            contract,
            provider,
            expected,
        }) => {
            assert_eq!(contract, "example.Service");
            assert_eq!(provider, "auto.One");
            assert!(expected.contains("Service"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn typed_loader_and_find_first_expose_contract_methods() {
    let root = static_root("memory", "example.AutoService", "auto.Two\nauto.One\n");
    let engine = engine(vec![root]);

    let first = engine
        .find_first::<dyn AutoService>()
        .unwrap()
        .expect("one provider should exist");
    assert_eq!(first.id().as_str(), "auto.Two");
    assert_eq!(first.tag(), "two");

    let none = engine.find_first::<dyn Service>().unwrap();
    assert!(none.is_none());
}

#[test]
fn provider_ids_lists_without_constructing() {
    let first = static_root("first", "example.Service", "impl.IdsOnly\n");
    let second = static_root("second", "example.Service", "impl.IdsOnly # again\n");
    let engine = engine(vec![first, second]);

    let listed = engine.provider_ids("example.Service").unwrap();
    let summary: Vec<(String, String, usize)> = listed
        .into_iter()
        .map(|entry| (entry.provider.to_string(), entry.root, entry.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("impl.IdsOnly".to_string(), "first".to_string(), 1),
            ("impl.IdsOnly".to_string(), "second".to_string(), 1),
        ]
    );
    assert_eq!(IDS_ONLY_BUILDS.load(Ordering::SeqCst), 0);
}

#[test]
fn duplicate_policies_apply_within_one_root_only() {
    let roots = || {
        vec![
            static_root(
                "first",
                "example.AutoService",
                "auto.One\nauto.One\nauto.Two\nauto.One\n",
            ),
            static_root("second", "example.AutoService", "auto.One\n"),
        ]
    };

    let collapse = engine(roots()).with_policy(DiscoveryPolicy {
        duplicates: DuplicatePolicy::CollapseConsecutive,
        ..DiscoveryPolicy::default()
    });
    assert_eq!(
        provider_ids(&collapse, "example.AutoService"),
        vec!["auto.One", "auto.Two", "auto.One", "auto.One"]
    );

    let unique = engine(roots()).with_policy(DiscoveryPolicy {
        duplicates: DuplicatePolicy::UniquePerRoot,
        ..DiscoveryPolicy::default()
    });
    assert_eq!(
        provider_ids(&unique, "example.AutoService"),
        vec!["auto.One", "auto.Two", "auto.One"]
    );
}

#[test]
fn unreadable_manifest_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = manifest_path(dir.path(), &ContractId::parse("example.Service").unwrap());
    std::fs::create_dir_all(&path).unwrap();
    let engine = engine(vec![Box::new(DirectoryRoot::new(dir.path()))]);

    let outcomes: Vec<_> = engine.discover("example.Service").unwrap().collect();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0],
        Err(DiscoveryError::ManifestRead { .. })
    ));
}
