//! Integration test: orchestrator end-to-end over an in-memory resolver.
//!
//! The fake resolver serves prebuilt trees, prunes them to the requested
//! depth the way a real resolver would, and records how many resolutions
//! run at the same time.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depwall_core::orchestrator::{self, plan};
use depwall_core::{
    CheckError, Config, Constraint, DependencyNode, DependencyTree, ImportResolver, MemorySink,
    ModuleInfo, PackagePath, ResolveError, Reporter,
};
use tempfile::TempDir;

const MODULE: &str = "example.com/shop";

fn pkg(rel: &str) -> String {
    format!("{MODULE}/{rel}")
}

fn node(rel: &str, from: &str) -> DependencyNode {
    DependencyNode::new(pkg(rel), format!("/src/shop/{from}"))
}

#[derive(Default)]
struct FakeResolver {
    trees: HashMap<String, DependencyNode>,
    broken: Vec<String>,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeResolver {
    fn with(mut self, root: DependencyNode) -> Self {
        self.trees.insert(root.name.to_string(), root);
        self
    }

    fn broken(mut self, root: &str) -> Self {
        self.broken.push(root.to_owned());
        self
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

fn prune(node: &DependencyNode, depth: usize, max_depth: Option<usize>) -> DependencyNode {
    let mut pruned = node.clone();
    pruned.children = if max_depth.is_some_and(|max| depth >= max) {
        Vec::new()
    } else {
        node.children
            .iter()
            .map(|c| prune(c, depth + 1, max_depth))
            .collect()
    };
    pruned
}

impl ImportResolver for FakeResolver {
    fn resolve(
        &self,
        root: &PackagePath,
        max_depth: Option<usize>,
    ) -> Result<DependencyTree, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.broken.iter().any(|b| b == root.as_str()) {
            return Err(ResolveError::Parse {
                path: root.as_str().into(),
                message: "unexpected token".into(),
            });
        }
        let tree = self
            .trees
            .get(root.as_str())
            .ok_or_else(|| ResolveError::RootUnresolved {
                package: root.clone(),
            })?;
        Ok(DependencyTree {
            root: prune(tree, 0, max_depth),
        })
    }
}

fn constraint(from: &str, allow: &[&str]) -> Constraint {
    Constraint {
        from: from.into(),
        allow: allow.iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn config(constraints: Vec<Constraint>) -> Config {
    Config {
        constraints,
        ..Config::default()
    }
}

async fn run_with(
    config: &Config,
    module: &ModuleInfo,
    resolver: Arc<dyn ImportResolver>,
) -> (Result<bool, CheckError>, String) {
    let sink = MemorySink::new();
    let reporter = Arc::new(Reporter::new(Box::new(sink.clone()), false));
    let result = orchestrator::run(config, module, resolver, reporter).await;
    (result, sink.contents())
}

/// `ui` imports `infra`, which imports `db`.
fn layered_resolver() -> FakeResolver {
    FakeResolver::default().with(node("ui", "").with_children(vec![
        DependencyNode::new("fmt", "/src/shop/ui").internal(),
        node("infra", "ui").with_children(vec![node("db", "infra")]),
    ]))
}

#[tokio::test]
async fn depth_two_violation_hidden_without_recursion() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let cfg = config(vec![constraint("./ui", &["./infra"])]);

    let (result, out) = run_with(&cfg, &module, Arc::new(layered_resolver())).await;
    assert!(result.unwrap());
    assert_eq!(out, format!("# {}\n[OK] fmt\n[OK] {}\n\n", pkg("ui"), pkg("infra")));
}

#[tokio::test]
async fn depth_two_violation_reported_with_recursion() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let mut cfg = config(vec![constraint("./ui", &["./infra"])]);
    cfg.recursive = true;

    let (result, out) = run_with(&cfg, &module, Arc::new(layered_resolver())).await;
    assert!(!result.unwrap());
    assert_eq!(
        out,
        format!(
            "# {}\n[OK] fmt\n[NG] {} is imported\n  from /src/shop/ui\n    from /src/shop/infra\n\n",
            pkg("ui"),
            pkg("db")
        )
    );
}

#[tokio::test]
async fn failing_dependency_does_not_suppress_sibling() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let resolver = FakeResolver::default().with(
        node("app", "").with_children(vec![node("a", "app"), node("b", "app")]),
    );
    let cfg = config(vec![constraint("./app", &["./b"])]);

    let (result, out) = run_with(&cfg, &module, Arc::new(resolver)).await;
    assert!(!result.unwrap());
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], format!("[NG] {} is imported", pkg("a")));
    assert_eq!(lines[3], format!("[OK] {}", pkg("b")));
}

#[tokio::test]
async fn external_packages_follow_toggle() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let resolver = Arc::new(FakeResolver::default().with(
        node("app", "").with_children(vec![DependencyNode::new("github.com/pkg/errors", "/src/shop/app")]),
    ));
    let mut cfg = config(vec![constraint("./app", &["./domain"])]);

    let (result, _) = run_with(&cfg, &module, resolver.clone()).await;
    assert!(!result.unwrap());

    cfg.ignore_external = true;
    let (result, out) = run_with(&cfg, &module, resolver).await;
    assert!(result.unwrap());
    assert!(out.contains("[OK] github.com/pkg/errors"));
}

#[tokio::test]
async fn unresolved_explicit_root_is_fatal() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let cfg = config(vec![constraint("./missing", &["./domain"])]);

    let (result, out) = run_with(&cfg, &module, Arc::new(FakeResolver::default())).await;
    assert!(matches!(result, Err(CheckError::RootUnresolved { .. })));
    assert!(out.is_empty());
}

#[tokio::test]
async fn unresolved_wildcard_roots_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("services/api")).unwrap();
    fs::create_dir_all(tmp.path().join("services/testdata")).unwrap();
    let module = ModuleInfo::new(MODULE, tmp.path());

    let resolver = FakeResolver::default()
        .with(node("services/api", "").with_children(vec![node("domain", "services/api")]));
    let cfg = config(vec![constraint("./services/**", &["./domain"])]);

    let (result, out) = run_with(&cfg, &module, Arc::new(resolver)).await;
    assert!(result.unwrap());
    assert_eq!(out, format!("# {}\n[OK] {}\n\n", pkg("services/api"), pkg("domain")));
}

#[tokio::test]
async fn unresolved_single_match_wildcard_is_fatal() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("leaf")).unwrap();
    let module = ModuleInfo::new(MODULE, tmp.path());
    let cfg = config(vec![constraint("./leaf/**", &["./domain"])]);

    let jobs = plan(&cfg, &module).unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(!jobs[0].multi_match);

    let (result, out) = run_with(&cfg, &module, Arc::new(FakeResolver::default())).await;
    assert!(matches!(result, Err(CheckError::RootUnresolved { .. })));
    assert!(out.is_empty());
}

#[tokio::test]
async fn resolver_failure_is_fatal() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let resolver = layered_resolver().broken(&pkg("infra"));
    let cfg = config(vec![
        constraint("./ui", &["./infra"]),
        constraint("./infra", &["./db"]),
    ]);

    let (result, _) = run_with(&cfg, &module, Arc::new(resolver)).await;
    assert!(matches!(result, Err(CheckError::Resolution(ResolveError::Parse { .. }))));
}

#[tokio::test]
async fn nothing_is_scheduled_after_fatal_error() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let resolver = Arc::new(
        FakeResolver::default()
            .broken(&pkg("a"))
            .with(node("b", "").with_children(vec![node("domain", "b")]))
            .with(node("c", "").with_children(vec![node("domain", "c")])),
    );
    let cfg = config(vec![
        constraint("./a", &["./domain"]),
        constraint("./b", &["./domain"]),
        constraint("./c", &["./domain"]),
    ]);

    let shared: Arc<dyn ImportResolver> = resolver.clone();
    let (result, out) = run_with(&cfg, &module, shared).await;
    assert!(matches!(result, Err(CheckError::Resolution(_))));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert!(out.is_empty());
}

#[tokio::test]
async fn invalid_wildcard_scope_fails_before_checking() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let cfg = config(vec![
        constraint("./ui", &["./infra"]),
        constraint("github.com/other/**", &[]),
    ]);

    let (result, out) = run_with(&cfg, &module, Arc::new(layered_resolver())).await;
    assert!(matches!(result, Err(CheckError::InvalidWildcardScope { .. })));
    assert!(out.is_empty());
}

#[test]
fn plan_keeps_declaration_order_and_normalizes() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let cfg = config(vec![
        constraint("./b", &["./x", "github.com/y"]),
        constraint("./a", &[]),
    ]);
    let jobs = plan(&cfg, &module).unwrap();
    let roots: Vec<&str> = jobs.iter().map(|j| j.root.as_str()).collect();
    assert_eq!(roots, vec![pkg("b"), pkg("a")]);
    let allowed: Vec<&str> = jobs[0].allowed.iter().map(PackagePath::as_str).collect();
    assert_eq!(allowed, vec![pkg("x").as_str(), "github.com/y"]);
    assert!(!jobs[0].multi_match);
}

fn many_roots(n: usize) -> (FakeResolver, Config) {
    let mut resolver = FakeResolver::default().delay(Duration::from_millis(15));
    let mut constraints = Vec::new();
    for i in 0..n {
        let rel = format!("svc{i}");
        resolver = resolver.with(node(&rel, "").with_children(vec![
            node("domain", &rel),
            node("infra", &rel),
            node(&format!("svc{}", (i + 1) % n), &rel),
        ]));
        constraints.push(constraint(&format!("./{rel}"), &["./domain"]));
    }
    (resolver, config(constraints))
}

fn sorted_lines(out: &str) -> Vec<String> {
    let mut lines: Vec<String> = out.lines().map(str::to_owned).collect();
    lines.sort();
    lines
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_output_matches_sequential_run() {
    let module = ModuleInfo::new(MODULE, "/src/shop");
    let n = 8;

    let (resolver, mut cfg) = many_roots(n);
    cfg.concurrency = 1;
    let (sequential, seq_out) = run_with(&cfg, &module, Arc::new(resolver)).await;

    let (resolver, mut cfg) = many_roots(n);
    cfg.concurrency = 3;
    let resolver = Arc::new(resolver);
    let (concurrent, par_out) = run_with(&cfg, &module, resolver.clone()).await;

    assert!(!sequential.unwrap());
    assert!(!concurrent.unwrap());
    assert!(resolver.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(sorted_lines(&seq_out), sorted_lines(&par_out));

    // Every block is complete and contiguous.
    let blocks: Vec<&str> = par_out.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), n);
    for block in blocks {
        let lines: Vec<&str> = block.lines().collect();
        assert!(lines[0].starts_with("# "), "block must start with a header: {block}");
        let root = lines[0].trim_start_matches("# ");
        assert_eq!(lines[1], format!("[OK] {}", pkg("domain")));
        assert_eq!(lines[2], format!("[NG] {} is imported", pkg("infra")));
        let svc = root.trim_start_matches(&format!("{MODULE}/"));
        assert_eq!(lines[3], format!("  from /src/shop/{svc}"));
        assert!(lines[4].starts_with("[NG] "));
        assert_eq!(lines.len(), 6);
    }
}
