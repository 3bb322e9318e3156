#![allow(missing_docs, unused_results)]

//! Entry-point resolution against hand-built units.

mod common;

use assert_matches::assert_matches;
use livecode_logging::{ConsoleLog, Severity};
use livecode_runtime::{ArtifactLoader, ExecutionError, SnippetTemplate};

use common::{DEFAULT_REGISTRATION, Harness, texts};

/// Template source with the default registration replaced.
fn with_registration(registration: &str, extra_items: &str) -> String {
    let source = SnippetTemplate::default().render("");
    assert!(source.contains(DEFAULT_REGISTRATION));
    format!(
        "{}\n{extra_items}\n",
        source.replace(DEFAULT_REGISTRATION, registration)
    )
}

#[test]
fn unit_without_registration_symbol_has_no_entry_point() {
    let harness = Harness::new();
    let artifact = harness.build("#[no_mangle]\npub extern \"C\" fn unrelated() {}\n");

    let result = ArtifactLoader::new().instantiate(&artifact);
    assert_matches!(result, Err(ExecutionError::NoEntryPoint));
}

#[test]
fn unit_registering_nothing_has_no_entry_point() {
    let harness = Harness::new();
    let source = with_registration("let _ = registrar;", "");
    let artifact = harness.build(&source);

    let loader = ArtifactLoader::new();
    assert_matches!(loader.instantiate(&artifact), Err(ExecutionError::NoEntryPoint));
    assert_eq!(loader.loaded_count(), 1);
}

#[test]
fn failing_constructor_is_instantiation_failure() {
    let harness = Harness::new();
    let source = with_registration(
        "host::register::<Exploding>(registrar);",
        r#"
pub struct Exploding;

impl Default for Exploding {
    fn default() -> Self {
        panic!("cannot construct")
    }
}

impl ModEntryPoint for Exploding {
    fn on_load(&mut self) {}
}
"#,
    );
    let artifact = harness.build(&source);

    let result = ArtifactLoader::new().instantiate(&artifact);
    assert_matches!(
        result,
        Err(ExecutionError::InstantiationFailed { ref entry_point }) if entry_point.ends_with("Exploding")
    );
}

#[test]
fn abi_version_mismatch_is_load_failure() {
    let harness = Harness::new();
    let source = SnippetTemplate::default()
        .render("")
        .replace("pub const ABI_VERSION: u32 = 1;", "pub const ABI_VERSION: u32 = 99;");
    let artifact = harness.build(&source);

    let result = ArtifactLoader::new().instantiate(&artifact);
    assert_matches!(result, Err(ExecutionError::LoadFailed { ref reason }) if reason.contains("99"));
}

#[test]
fn first_registration_wins() {
    let harness = Harness::new();
    let source = with_registration(
        "host::register::<First>(registrar); host::register::<CommandLineRunner>(registrar);",
        r#"
#[derive(Default)]
pub struct First;

impl ModEntryPoint for First {
    fn on_load(&mut self) {
        log::message("first");
    }
}
"#,
    );
    let artifact = harness.build(&source);
    let log = ConsoleLog::default();

    let mut instance = ArtifactLoader::new().instantiate(&artifact).unwrap();
    assert!(instance.name().ends_with("First"), "{}", instance.name());
    instance.start(&log).unwrap();

    assert_eq!(texts(&log), ["first"]);
}

#[test]
fn stop_runs_on_unload() {
    let harness = Harness::new();
    let source = with_registration(
        "host::register::<Lifecycle>(registrar);",
        r#"
#[derive(Default)]
pub struct Lifecycle {
    loads: u32,
}

impl ModEntryPoint for Lifecycle {
    fn on_load(&mut self) {
        self.loads += 1;
        log::message(format!("loaded {}", self.loads));
    }

    fn on_unload(&mut self) {
        log::warning(format!("unloading after {} loads", self.loads));
    }
}
"#,
    );
    let artifact = harness.build(&source);
    let log = ConsoleLog::default();

    let mut instance = ArtifactLoader::new().instantiate(&artifact).unwrap();
    instance.start(&log).unwrap();
    instance.start(&log).unwrap();
    instance.stop(&log).unwrap();
    drop(instance);

    let entries = log.snapshot();
    assert_eq!(texts(&log), ["loaded 1", "loaded 2", "unloading after 2 loads"]);
    assert_eq!(entries[2].severity, Severity::Warning);
    assert!(entries[2].caller.ends_with("Lifecycle::on_unload"), "{}", entries[2].caller);
}

#[test]
fn logging_outside_hooks_is_dropped() {
    let harness = Harness::new();
    let source = with_registration(
        "host::register::<Spawner>(registrar);",
        r#"
#[derive(Default)]
pub struct Spawner;

impl ModEntryPoint for Spawner {
    fn on_load(&mut self) {
        std::thread::spawn(|| log::message("from another thread")).join().unwrap();
        log::message("from on_load");
    }
}
"#,
    );
    let artifact = harness.build(&source);
    let log = ConsoleLog::default();

    let mut instance = ArtifactLoader::new().instantiate(&artifact).unwrap();
    instance.start(&log).unwrap();

    assert_eq!(texts(&log), ["from on_load"]);
}
