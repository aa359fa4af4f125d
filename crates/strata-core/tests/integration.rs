use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strata_core::check::check_template_repository;
use strata_core::error::{Result, StrataError};
use strata_core::fetch::{Fetcher, RepositoryFetcher};
use strata_core::manifest::{load_service_manifest, ServiceManifest, TemplateRepository};
use strata_core::render::WriteAction;
use strata_core::vfs::{FileTree, MemoryTree};
use strata_core::{render_service, RenderOptions};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

/// Fetcher resolving the fixture repositories through local overrides.
fn fixture_fetcher() -> Fetcher {
    Fetcher::with_overrides(BTreeMap::from([
        ("gh:acme/go-base".to_string(), fixture_path("go-base")),
        ("gh:acme/go-http".to_string(), fixture_path("go-http")),
    ]))
}

fn write_service(dir: &Path, mode: &str, module: &str) -> ServiceManifest {
    std::fs::write(
        dir.join("service.yaml"),
        format!(
            "name: billing\n\
             repositories:\n  - gitUrl: gh:acme/go-http\n\
             arguments:\n  module: {module}\n  mode: {mode}\n  port: 9090\n"
        ),
    )
    .unwrap();
    load_service_manifest(dir).unwrap()
}

fn read(dir: &Path, path: &str) -> String {
    std::fs::read_to_string(dir.join(path)).unwrap()
}

/// Serves in-memory repositories and counts fetches per URL.
#[derive(Default)]
struct MemoryFetcher {
    repos: BTreeMap<String, Vec<(String, String)>>,
    fetches: RefCell<BTreeMap<String, usize>>,
}

impl MemoryFetcher {
    fn repo(mut self, url: &str, files: &[(&str, &str)]) -> Self {
        self.repos.insert(
            url.to_string(),
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        );
        self
    }
}

impl RepositoryFetcher for MemoryFetcher {
    fn fetch(&self, repository: &TemplateRepository) -> Result<Box<dyn FileTree>> {
        *self
            .fetches
            .borrow_mut()
            .entry(repository.git_url.clone())
            .or_default() += 1;
        let files = self
            .repos
            .get(&repository.git_url)
            .ok_or_else(|| StrataError::FetchFailed {
                url: repository.git_url.clone(),
                reason: "unknown repository".into(),
            })?;
        Ok(Box::new(
            files
                .iter()
                .fold(MemoryTree::new(), |tree, (p, c)| tree.with_file(p, c)),
        ))
    }
}

fn service(urls: &[&str], args: &[(&str, &str)]) -> ServiceManifest {
    ServiceManifest {
        name: "svc".into(),
        repositories: urls.iter().map(|u| TemplateRepository::new(*u)).collect(),
        arguments: args
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[test]
fn test_render_layered_fixture_repositories() {
    let target = tempfile::tempdir().unwrap();
    let manifest = write_service(target.path(), "dev", "example.com/billing");

    let report = render_service(&manifest, &fixture_fetcher(), &RenderOptions::new(target.path())).unwrap();

    assert_eq!(report.count(WriteAction::Created), 3);
    assert_eq!(report.action_for("go.mod"), Some(WriteAction::Created));

    // go-http's main.go shadows go-base's
    let main = read(target.path(), "main.go");
    assert!(main.contains("net/http"), "main.go was: {main}");
    assert!(main.contains("fmt.Fprintln(w, \"billing\")"));
    assert!(main.contains("\":9090\""));

    assert_eq!(read(target.path(), "go.mod"), "module example.com/billing\n\ngo 1.22\n");
    assert!(read(target.path(), "README.md").contains("listening on port 9090"));

    // dev mode does not list the deploy script; the bootstrap list is gone
    assert!(!target.path().join("deploy/run.sh").exists());
    assert!(!target.path().join("files.yaml").exists());
}

#[cfg(unix)]
#[test]
fn test_render_prod_adds_executable_script() {
    use std::os::unix::fs::PermissionsExt;

    let target = tempfile::tempdir().unwrap();
    let manifest = write_service(target.path(), "prod", "example.com/billing");

    let report = render_service(&manifest, &fixture_fetcher(), &RenderOptions::new(target.path())).unwrap();
    assert_eq!(report.action_for("deploy/run.sh"), Some(WriteAction::Created));

    let script = target.path().join("deploy/run.sh");
    assert_eq!(read(target.path(), "deploy/run.sh"), "#!/bin/sh\nexec ./billing\n");
    let mode = std::fs::metadata(&script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn test_block_edits_survive_rerender() {
    let target = tempfile::tempdir().unwrap();
    let manifest = write_service(target.path(), "dev", "example.com/billing");
    let options = RenderOptions::new(target.path());

    render_service(&manifest, &fixture_fetcher(), &options).unwrap();
    let generated = read(target.path(), "main.go");

    let edited = generated.replace(
        "/// StartBlock(imports)\n\n/// EndBlock(imports)",
        "/// StartBlock(imports)\n\t\"os\"\n\t\"strings\"\n/// EndBlock(imports)",
    );
    assert_ne!(edited, generated, "fixture should render an empty imports block");
    std::fs::write(target.path().join("main.go"), &edited).unwrap();

    let report = render_service(&manifest, &fixture_fetcher(), &options).unwrap();
    assert_eq!(report.action_for("main.go"), Some(WriteAction::Updated));
    assert_eq!(read(target.path(), "main.go"), edited);
}

#[test]
fn test_static_file_written_once() {
    let target = tempfile::tempdir().unwrap();
    let first = write_service(target.path(), "dev", "example.com/first");
    render_service(&first, &fixture_fetcher(), &RenderOptions::new(target.path())).unwrap();

    let second = write_service(target.path(), "dev", "example.com/second");
    let report = render_service(&second, &fixture_fetcher(), &RenderOptions::new(target.path())).unwrap();

    assert_eq!(report.action_for("go.mod"), Some(WriteAction::Skipping));
    assert_eq!(read(target.path(), "go.mod"), "module example.com/first\n\ngo 1.22\n");
}

#[test]
fn test_validation_failure_writes_nothing() {
    let target = tempfile::tempdir().unwrap();
    let out = target.path().join("out");
    let mut manifest = write_service(target.path(), "staging", "example.com/billing");

    let err = render_service(&manifest, &fixture_fetcher(), &RenderOptions::new(&out)).unwrap_err();
    match err {
        StrataError::InvalidArgumentValue { name, got, .. } => {
            assert_eq!(name, "mode");
            assert_eq!(got, "staging");
        }
        other => panic!("expected InvalidArgumentValue, got: {other:?}"),
    }
    assert!(!out.exists());

    manifest.arguments.remove("module");
    manifest.arguments.insert("mode".into(), "dev".into());
    let err = render_service(&manifest, &fixture_fetcher(), &RenderOptions::new(&out)).unwrap_err();
    assert!(matches!(err, StrataError::MissingRequiredArgument { ref name } if name == "module"));
    assert!(!out.exists());
}

#[test]
fn test_check_fixture_repositories() {
    for name in ["go-base", "go-http"] {
        let result = check_template_repository(&fixture_path(name)).unwrap();
        assert!(result.is_ok(), "{name}: {:?}", result.errors());
        assert!(result.warnings().is_empty(), "{name}: {:?}", result.warnings());
    }
}

#[test]
fn test_later_repository_overrides_earlier() {
    let fetcher = MemoryFetcher::default()
        .repo("base", &[("manifest.yaml", "name: base\n"), ("Makefile.tpl", "base"), ("LICENSE.tpl", "MIT")])
        .repo(
            "service",
            &[
                ("manifest.yaml", "name: service\ndependencies:\n  - gitUrl: base\n"),
                ("Makefile.tpl", "service"),
            ],
        );
    let target = tempfile::tempdir().unwrap();

    let report = render_service(&service(&["service"], &[]), &fetcher, &RenderOptions::new(target.path())).unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(read(target.path(), "Makefile"), "service");
    assert_eq!(read(target.path(), "LICENSE"), "MIT");
}

#[test]
fn test_shared_dependency_fetched_once() {
    let fetcher = MemoryFetcher::default()
        .repo("base", &[("manifest.yaml", "name: base\n"), ("a.tpl", "a")])
        .repo("one", &[("manifest.yaml", "dependencies:\n  - gitUrl: base\n")])
        .repo("two", &[("manifest.yaml", "dependencies:\n  - gitUrl: base\n")]);
    let target = tempfile::tempdir().unwrap();

    render_service(&service(&["one", "two"], &[]), &fetcher, &RenderOptions::new(target.path())).unwrap();
    assert_eq!(fetcher.fetches.borrow()["base"], 1);
}

#[test]
fn test_write_if_controls_output() {
    let fetcher = MemoryFetcher::default().repo(
        "repo",
        &[
            ("manifest.yaml", "arguments:\n  mode:\n    values: [dev, prod]\n"),
            ("deploy.yaml.tpl", "{% if writeIf(arg=\"mode\", value=\"prod\") %}{% endif %}replicas: 3\n"),
        ],
    );

    let dev = tempfile::tempdir().unwrap();
    let report = render_service(&service(&["repo"], &[("mode", "dev")]), &fetcher, &RenderOptions::new(dev.path())).unwrap();
    assert_eq!(report.action_for("deploy.yaml"), Some(WriteAction::Skipping));
    assert!(!dev.path().join("deploy.yaml").exists());

    let prod = tempfile::tempdir().unwrap();
    let report = render_service(&service(&["repo"], &[("mode", "prod")]), &fetcher, &RenderOptions::new(prod.path())).unwrap();
    assert_eq!(report.action_for("deploy.yaml"), Some(WriteAction::Created));
    assert_eq!(read(prod.path(), "deploy.yaml"), "replicas: 3\n");
}

#[test]
fn test_set_output_name_and_static_list() {
    let fetcher = MemoryFetcher::default().repo(
        "repo",
        &[
            ("manifest.yaml", "name: repo\n"),
            (
                "files.yaml",
                "files:\n  main.go:\n    templatePath: cmd.go.tpl\n  .env:\n    templatePath: env.tpl\n    static: true\n",
            ),
            ("cmd.go.tpl", "{% if setOutputName(name=\"cmd/svc/main.go\") %}{% endif %}package main\n"),
            ("env.tpl", "PORT=8080\n"),
            ("ignored.tpl", "not listed"),
        ],
    );
    let target = tempfile::tempdir().unwrap();
    std::fs::write(target.path().join(".env"), "PORT=1\n").unwrap();

    let report = render_service(&service(&["repo"], &[]), &fetcher, &RenderOptions::new(target.path())).unwrap();

    assert_eq!(report.action_for("cmd/svc/main.go"), Some(WriteAction::Created));
    assert_eq!(report.action_for(".env"), Some(WriteAction::Skipping));
    assert_eq!(read(target.path(), "cmd/svc/main.go"), "package main\n");
    assert_eq!(read(target.path(), ".env"), "PORT=1\n");
    assert!(!target.path().join("main.go").exists());
    assert!(!target.path().join("ignored").exists());
}

#[test]
fn test_formatter_failure_falls_back_to_raw_output() {
    let fetcher = MemoryFetcher::default().repo(
        "repo",
        &[("manifest.yaml", "name: repo\n"), ("main.go.tpl", "package main\n")],
    );
    let target = tempfile::tempdir().unwrap();
    let options = RenderOptions::new(target.path()).with_formatters(BTreeMap::from([(
        "go".to_string(),
        vec!["strata-test-missing-goimports".to_string()],
    )]));

    let report = render_service(&service(&["repo"], &[]), &fetcher, &options).unwrap();
    assert_eq!(report.action_for("main.go"), Some(WriteAction::Created));
    assert_eq!(read(target.path(), "main.go"), "package main\n");
}

#[test]
fn test_malformed_markers_abort_run() {
    let fetcher = MemoryFetcher::default().repo(
        "repo",
        &[("manifest.yaml", "name: repo\n"), ("main.go.tpl", "package main\n")],
    );
    let target = tempfile::tempdir().unwrap();
    let existing = "package main\n/// StartBlock(a)\nx\n/// StartBlock(b)\n";
    std::fs::write(target.path().join("main.go"), existing).unwrap();

    let err = render_service(&service(&["repo"], &[]), &fetcher, &RenderOptions::new(target.path())).unwrap_err();
    match err {
        StrataError::MalformedBlockMarkers { path, line, .. } => {
            assert!(path.ends_with("main.go"));
            assert_eq!(line, 4);
        }
        other => panic!("expected MalformedBlockMarkers, got: {other:?}"),
    }
    assert_eq!(read(target.path(), "main.go"), existing);
}

#[test]
fn test_no_repositories() {
    let target = tempfile::tempdir().unwrap();
    let err = render_service(&service(&[], &[]), &MemoryFetcher::default(), &RenderOptions::new(target.path())).unwrap_err();
    assert!(matches!(err, StrataError::NoRepositories));
}

#[test]
fn test_fetch_failure_names_repository() {
    let target = tempfile::tempdir().unwrap();
    let err = render_service(&service(&["gone"], &[]), &MemoryFetcher::default(), &RenderOptions::new(target.path())).unwrap_err();
    assert!(matches!(err, StrataError::Repository { ref url, .. } if url == "gone"));
}
