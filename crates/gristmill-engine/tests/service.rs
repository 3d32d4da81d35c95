//! End-to-end tests driving real generator and input-listing scripts.
#![cfg(unix)]

use std::collections::BTreeSet;
use std::fs;

use anyhow::Result;
use gristmill_config::EngineConfig;
use gristmill_engine::paths::path_with_suffix;
use gristmill_engine::{
    Action, Directive, GenerationReport, ProductDescriptor, ProductPaths, ProductService, Status,
};
use gristmill_test_support::{install_script, product_dir};
use tempfile::TempDir;

const GENERATOR: &str = "generate.sh";
const INPUT_LISTER: &str = "input.sh";

fn service_in(temp: &TempDir) -> ProductService {
    ProductService::new(EngineConfig {
        product_root: temp.path().join("products"),
        cache_root: temp.path().join("cache"),
        ..EngineConfig::default()
    })
}

fn paths_of(service: &ProductService, spec: &str) -> ProductPaths {
    let descriptor: ProductDescriptor = spec.parse().expect("valid descriptor");
    ProductPaths::resolve(
        &descriptor,
        &service.config().product_root,
        &service.config().cache_root,
    )
    .expect("resolvable descriptor")
}

fn request(
    service: &ProductService,
    spec: &str,
    actions: BTreeSet<Action>,
    directives: BTreeSet<Directive>,
) -> Result<GenerationReport> {
    let descriptor: ProductDescriptor = spec.parse()?;
    Ok(service.make_request(&descriptor, &actions, &directives)?)
}

#[test]
fn make_generates_and_publishes_the_artifact() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "printf hello > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("202001010000_test.gen.txt")?;

    assert_eq!(report.status, Status::OK);
    assert_eq!(report.exit_code, Some(0));
    let artifact = report.artifact.expect("artifact path");
    assert_eq!(fs::read_to_string(&artifact)?, "hello");
    assert_eq!(
        artifact,
        service
            .config()
            .cache_root
            .join("2020/01/01/test/gen/202001010000_test.gen.txt")
    );
    assert!(
        !paths_of(&service, "202001010000_test.gen.txt").temp_path.exists(),
        "temp file is consumed by publication"
    );
    Ok(())
}

#[test]
fn missing_generator_reports_not_implemented() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);

    let report = service.make("202001010000_test.gen.txt")?;

    assert_eq!(report.status, Status::NOT_IMPLEMENTED);
    assert!(report.artifact.is_none(), "target path must be cleared");
    Ok(())
}

#[test]
fn generator_failure_maps_the_self_reported_status() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "echo \"diagnostic detail\" >&2\necho \"409 bad input\"\nexit 1",
    )?;

    let report = service.make("202001010000_test.gen.txt")?;

    assert_eq!(report.status.code(), 409);
    assert_eq!(report.exit_code, Some(1));
    assert_eq!(report.diagnostic.as_deref(), Some("409 bad input"));
    assert!(report.artifact.is_none());

    let paths = paths_of(&service, "202001010000_test.gen.txt");
    let stdout_log = path_with_suffix(&paths.final_path, ".stdout.log");
    let stderr_log = path_with_suffix(&paths.final_path, ".stderr.log");
    assert_eq!(fs::read_to_string(stdout_log)?, "409 bad input\n");
    assert_eq!(fs::read_to_string(stderr_log)?, "diagnostic detail\n");
    assert!(
        !paths.final_path.exists(),
        "placeholder is removed after a failed generation"
    );
    Ok(())
}

#[test]
fn delete_removes_an_existing_artifact() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let paths = paths_of(&service, "202001010000_test.gen.txt");
    fs::create_dir_all(paths.final_path.parent().expect("parent"))?;
    fs::write(&paths.final_path, b"content")?;

    let report = request(
        &service,
        "202001010000_test.gen.txt",
        BTreeSet::from([Action::Delete]),
        BTreeSet::new(),
    )?;

    assert_eq!(report.status, Status::ACCEPTED);
    assert!(!paths.final_path.exists());
    Ok(())
}

#[test]
fn delete_of_a_missing_artifact_reports_not_found() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);

    let report = request(
        &service,
        "202001010000_test.gen.txt",
        BTreeSet::from([Action::Delete]),
        BTreeSet::new(),
    )?;

    assert_eq!(report.status, Status::NOT_FOUND);
    Ok(())
}

#[test]
fn cache_hit_serves_the_artifact_without_invoking_the_generator() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "echo run >> invoked\nprintf regenerated > \"$OUTDIR/$OUTFILE\"",
    )?;
    let paths = paths_of(&service, "202001010000_test.gen.txt");
    fs::create_dir_all(paths.final_path.parent().expect("parent"))?;
    fs::write(&paths.final_path, b"cached")?;

    let first = service.make("202001010000_test.gen.txt")?;
    let second = service.make("202001010000_test.gen.txt")?;

    assert_eq!(first.status, Status::OK);
    assert_eq!(second.status, Status::OK);
    assert_eq!(first.artifact, second.artifact);
    assert_eq!(fs::read_to_string(&paths.final_path)?, "cached");
    let marker = product_dir(&service.config().product_root, "test.gen").join("invoked");
    assert!(!marker.exists(), "generator must not run on a cache hit");
    Ok(())
}

#[test]
fn busy_placeholder_is_reported_and_left_untouched() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "printf never > \"$OUTDIR/$OUTFILE\"",
    )?;
    let paths = paths_of(&service, "202001010000_test.gen.txt");
    fs::create_dir_all(paths.final_path.parent().expect("parent"))?;
    fs::write(&paths.final_path, b"")?;

    let report = service.make("202001010000_test.gen.txt")?;

    assert_eq!(report.status, Status::ACCEPTED);
    assert!(report.artifact.is_none());
    assert_eq!(
        fs::metadata(&paths.final_path)?.len(),
        0,
        "placeholder must not be modified by a busy observer"
    );
    Ok(())
}

#[test]
fn empty_generator_output_reports_no_content() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(&service.config().product_root, "test.gen", GENERATOR, "exit 0")?;

    let report = service.make("202001010000_test.gen.txt")?;

    assert_eq!(report.status, Status::NO_CONTENT);
    assert!(report.artifact.is_none());
    let paths = paths_of(&service, "202001010000_test.gen.txt");
    assert!(
        !paths.final_path.exists(),
        "placeholder is removed when nothing was produced"
    );
    Ok(())
}

#[test]
fn resolved_inputs_reach_the_generator_environment() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let products = service.config().product_root.clone();
    install_script(
        &products,
        "upstream.typeB",
        GENERATOR,
        "printf \"site=$SITE\" > \"$OUTDIR/$OUTFILE\"",
    )?;
    install_script(
        &products,
        "top.prod",
        INPUT_LISTER,
        "echo \"a=202001010000_upstream.typeB_SITE=foo.dat\"",
    )?;
    install_script(
        &products,
        "top.prod",
        GENERATOR,
        "printf \"INPUTKEYS=$INPUTKEYS;a=$a\" > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("202001010000_top.prod.txt")?;

    assert_eq!(report.status, Status::OK);
    let upstream = paths_of(&service, "202001010000_upstream.typeB_SITE=foo.dat");
    assert_eq!(fs::read_to_string(&upstream.final_path)?, "site=foo");
    assert_eq!(
        report.inputs.get("a").map(String::as_str),
        Some(upstream.final_path.to_string_lossy().as_ref())
    );
    let artifact = report.artifact.expect("artifact path");
    let contents = fs::read_to_string(artifact)?;
    assert_eq!(
        contents,
        format!("INPUTKEYS=a;a={}", upstream.final_path.display())
    );
    Ok(())
}

#[test]
fn failing_inputs_are_skipped_best_effort() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let products = service.config().product_root.clone();
    install_script(
        &products,
        "dep.good",
        GENERATOR,
        "printf good > \"$OUTDIR/$OUTFILE\"",
    )?;
    // dep.broken has no generator at all, so resolving it fails.
    install_script(
        &products,
        "top.prod",
        INPUT_LISTER,
        "echo \"ok=202001010000_dep.good.dat\"\necho \"bad=202001010000_dep.broken.dat\"",
    )?;
    install_script(
        &products,
        "top.prod",
        GENERATOR,
        "printf \"KEYS=$INPUTKEYS\" > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("202001010000_top.prod.txt")?;

    assert_eq!(report.status, Status::OK, "parent still attempts generation");
    assert!(report.inputs.contains_key("ok"));
    assert!(!report.inputs.contains_key("bad"));
    let artifact = report.artifact.expect("artifact path");
    assert_eq!(fs::read_to_string(artifact)?, "KEYS=ok");
    Ok(())
}

#[test]
fn input_listing_failure_aborts_the_request() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let products = service.config().product_root.clone();
    install_script(
        &products,
        "top.prod",
        INPUT_LISTER,
        "echo \"no inputs available\"\nexit 3",
    )?;
    install_script(
        &products,
        "top.prod",
        GENERATOR,
        "printf never > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("202001010000_top.prod.txt")?;

    assert_eq!(report.status, Status::CONFLICT);
    assert_eq!(report.exit_code, Some(3));
    assert_eq!(report.diagnostic.as_deref(), Some("no inputs available"));
    let paths = paths_of(&service, "202001010000_top.prod.txt");
    assert!(
        !paths.final_path.exists(),
        "placeholder is removed when the listing fails"
    );
    Ok(())
}

#[test]
fn cyclic_inputs_are_skipped() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let products = service.config().product_root.clone();
    install_script(
        &products,
        "self.loop",
        INPUT_LISTER,
        "echo \"self=202001010000_self.loop.txt\"",
    )?;
    install_script(
        &products,
        "self.loop",
        GENERATOR,
        "printf \"KEYS=$INPUTKEYS\" > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("202001010000_self.loop.txt")?;

    assert_eq!(report.status, Status::OK);
    assert!(report.inputs.is_empty(), "the cyclic input must be skipped");
    let artifact = report.artifact.expect("artifact path");
    assert_eq!(fs::read_to_string(artifact)?, "KEYS=");
    Ok(())
}

#[test]
fn list_inputs_reports_the_raw_listing() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    let products = service.config().product_root.clone();
    install_script(
        &products,
        "top.prod",
        INPUT_LISTER,
        "echo \"a=202001010000_upstream.typeB_SITE=foo.dat\"",
    )?;
    install_script(
        &products,
        "top.prod",
        GENERATOR,
        "printf never > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = request(
        &service,
        "202001010000_top.prod.txt",
        BTreeSet::from([Action::ListInputs]),
        BTreeSet::new(),
    )?;

    assert_eq!(report.status, Status::NO_CONTENT);
    assert_eq!(
        report.inputs.get("a").map(String::as_str),
        Some("202001010000_upstream.typeB_SITE=foo.dat")
    );
    assert!(report.artifact.is_none());
    let paths = paths_of(&service, "202001010000_top.prod.txt");
    assert!(
        !paths.final_path.exists(),
        "a bare listing request must not create a placeholder"
    );
    Ok(())
}

#[test]
fn directives_create_aliases_and_persist_the_log() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "echo generation chatter\nprintf hello > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = request(
        &service,
        "202001010000_test.gen.txt",
        BTreeSet::from([Action::Make]),
        BTreeSet::from([Directive::Link, Directive::Latest, Directive::Log]),
    )?;

    assert_eq!(report.status, Status::OK);
    let paths = paths_of(&service, "202001010000_test.gen.txt");
    assert_eq!(fs::read_link(&paths.static_path)?, paths.final_path);
    assert_eq!(fs::read_link(&paths.latest_path)?, paths.final_path);
    assert_eq!(fs::read_to_string(&paths.latest_path)?, "hello");
    let log_path = path_with_suffix(&paths.final_path, ".log");
    assert_eq!(fs::read_to_string(log_path)?, "generation chatter\n");
    Ok(())
}

#[test]
fn latest_sentinel_resolves_outside_the_time_partition() -> Result<()> {
    let temp = TempDir::new()?;
    let service = service_in(&temp);
    install_script(
        &service.config().product_root,
        "test.gen",
        GENERATOR,
        "printf latest > \"$OUTDIR/$OUTFILE\"",
    )?;

    let report = service.make("LATEST_test.gen.txt")?;

    assert_eq!(report.status, Status::OK);
    let artifact = report.artifact.expect("artifact path");
    assert_eq!(
        artifact,
        service
            .config()
            .cache_root
            .join("test/gen/LATEST_test.gen.txt")
    );
    assert_eq!(fs::read_to_string(artifact)?, "latest");
    Ok(())
}
