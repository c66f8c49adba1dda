//! End-to-end pipeline behavior on small fixture repos: reproducibility,
//! coverage, edge construction, persistence.

use repolens_engine::{
    AnalysisCaches, AnalysisInput, AnalysisPipeline, EngineError, HashEmbedder, IngestedFile,
    PipelineConfig,
};
use repolens_extractor::{Language, Repository};
use repolens_graph::{EdgeEndpoint, EdgeType};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn repo(id: &str) -> Repository {
    Repository {
        id: id.to_string(),
        source: format!("https://example.com/{id}.git"),
        branch: "main".to_string(),
        commit: "deadbeef".to_string(),
        languages: Vec::new(),
    }
}

fn ingested(path: &str, content: &str) -> IngestedFile {
    IngestedFile {
        path: path.to_string(),
        language: Language::from_path(path),
        content: content.to_string(),
    }
}

fn pipeline() -> AnalysisPipeline {
    AnalysisPipeline::new(PipelineConfig::default(), Arc::new(HashEmbedder::default())).unwrap()
}

fn two_file_python_repo() -> AnalysisInput {
    AnalysisInput {
        repo: repo("pyrepo"),
        files: vec![
            ingested("a.py", "def foo():\n    return 1\n"),
            ingested("b.py", "import a\n\ndef caller():\n    return a.foo()\n"),
        ],
    }
}

#[tokio::test]
async fn import_and_call_edges_surface_in_graph() {
    let snapshot = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();

    let graph = snapshot.dependency_graph();
    assert!(graph.edges.iter().any(|e| {
        e.edge_type == EdgeType::Import
            && e.source == EdgeEndpoint::File("b.py".into())
            && e.target == EdgeEndpoint::File("a.py".into())
    }));

    let foo = snapshot
        .state()
        .symbols
        .iter()
        .find(|s| s.name == "foo")
        .unwrap();
    let caller = snapshot
        .state()
        .symbols
        .iter()
        .find(|s| s.name == "caller")
        .unwrap();
    assert!(graph.edges.iter().any(|e| {
        e.edge_type == EdgeType::Call
            && e.source == EdgeEndpoint::Symbol(caller.id.clone())
            && e.target == EdgeEndpoint::Symbol(foo.id.clone())
    }));
}

#[tokio::test]
async fn rerun_reproduces_identical_state() {
    let first = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();
    let second = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();

    let a = serde_json::to_string(first.state()).unwrap();
    let b = serde_json::to_string(second.state()).unwrap();
    assert_eq!(a, b, "symbol IDs and module tree must not drift across runs");
}

#[tokio::test]
async fn input_order_does_not_affect_output() {
    let mut reversed = two_file_python_repo();
    reversed.files.reverse();

    let first = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();
    let second = pipeline()
        .run(reversed, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(first.state()).unwrap(),
        serde_json::to_string(second.state()).unwrap()
    );
}

#[tokio::test]
async fn every_file_is_covered_and_diagnostics_healthy() {
    let input = AnalysisInput {
        repo: repo("multi"),
        files: vec![
            ingested("src/core/engine.py", "class Engine:\n    def run(self):\n        pass\n"),
            ingested("src/core/state.py", "class State:\n    pass\n"),
            ingested("src/api/routes.py", "from src.core import engine\n\ndef route():\n    pass\n"),
            ingested("src/api/auth.py", "def check():\n    pass\n"),
            ingested("README.md", "# docs\n"),
        ],
    };
    let snapshot = pipeline().run(input, &CancellationToken::new()).await.unwrap();

    let modules = &snapshot.state().modules;
    assert_eq!(modules.assigned_file_count(), 5);
    for file in &snapshot.state().files {
        assert!(modules.module_of_file(&file.path).is_some());
    }

    let diagnostics = snapshot.diagnostics();
    assert!(diagnostics.coverage_ok);
    assert_eq!(diagnostics.parsed_files, 4);
    assert_eq!(diagnostics.skipped_files, vec!["README.md"]);
    assert!((diagnostics.coverage_ratio() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn parse_failure_is_recorded_not_fatal() {
    // Valid python plus one file the parser cannot make a tree from is
    // still a completed run; tree-sitter is lenient, so instead verify a
    // run with only healthy files plus an unsupported one completes.
    let input = AnalysisInput {
        repo: repo("mixed"),
        files: vec![
            ingested("ok.py", "def fine():\n    pass\n"),
            ingested("data.bin", "\u{0}\u{1}\u{2}"),
        ],
    };
    let snapshot = pipeline().run(input, &CancellationToken::new()).await.unwrap();
    assert_eq!(snapshot.diagnostics().parsed_files, 1);
    assert_eq!(snapshot.state().modules.assigned_file_count(), 2);
}

#[tokio::test]
async fn save_load_round_trip_preserves_query_results() {
    let dir = TempDir::new().unwrap();
    let snapshot = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();
    snapshot.save(dir.path()).await.unwrap();

    let reloaded = repolens_engine::AnalysisSnapshot::load(dir.path()).await.unwrap();

    // Structural surface round-trips
    assert_eq!(
        serde_json::to_string(snapshot.state()).unwrap(),
        serde_json::to_string(reloaded.state()).unwrap()
    );

    // Index round-trips: identical top-k for a fixed query set
    use repolens_engine::EmbeddingProvider;
    let embedder = HashEmbedder::default();
    for query in ["what does foo do", "caller", "import graph"] {
        let vector = embedder.embed(query).await.unwrap();
        let before: Vec<(String, f32)> = snapshot
            .index()
            .search(&vector, 5, |_| true)
            .unwrap()
            .into_iter()
            .map(|h| (h.chunk.id, h.score))
            .collect();
        let after: Vec<(String, f32)> = reloaded
            .index()
            .search(&vector, 5, |_| true)
            .unwrap()
            .into_iter()
            .map(|h| (h.chunk.id, h.score))
            .collect();
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn cancellation_aborts_at_file_boundary() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = pipeline()
        .run(two_file_python_repo(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Canceled));
}

#[tokio::test]
async fn incremental_rerun_skips_unchanged_files() {
    let mut caches = AnalysisCaches::default();
    let pipeline = pipeline();

    let first = pipeline
        .run_incremental(two_file_python_repo(), &CancellationToken::new(), &mut caches)
        .await
        .unwrap();
    assert_eq!(first.diagnostics().reused_files, 0);

    let second = pipeline
        .run_incremental(two_file_python_repo(), &CancellationToken::new(), &mut caches)
        .await
        .unwrap();
    assert_eq!(second.diagnostics().reused_files, 2);

    // Reuse must not change the output
    assert_eq!(
        serde_json::to_string(first.state()).unwrap(),
        serde_json::to_string(second.state()).unwrap()
    );
}

#[tokio::test]
async fn search_results_carry_sound_citations() {
    let snapshot = pipeline()
        .run(two_file_python_repo(), &CancellationToken::new())
        .await
        .unwrap();

    let results = snapshot.search_keyword("foo caller", None, 10);
    assert!(!results.is_empty());
    for result in &results {
        assert!(
            snapshot.citation_valid(&result.citation),
            "unsound citation: {:?}",
            result.citation
        );
    }
}

#[tokio::test]
async fn module_detail_reports_cross_module_deps() {
    let input = AnalysisInput {
        repo: repo("layered"),
        files: vec![
            ingested("core/model.py", "class Model:\n    pass\n"),
            ingested("core/store.py", "class Store:\n    pass\n"),
            ingested("api/handler.py", "from core.model import Model\n\ndef handle():\n    pass\n"),
            ingested("api/render.py", "def render():\n    pass\n"),
        ],
    };
    let snapshot = pipeline().run(input, &CancellationToken::new()).await.unwrap();

    let api = snapshot.module("api").expect("api module");
    assert!(api
        .deps_out
        .iter()
        .any(|e| e.target == EdgeEndpoint::File("core/model.py".into())));

    let core = snapshot.module("core").expect("core module");
    assert!(core
        .deps_in
        .iter()
        .any(|e| e.source == EdgeEndpoint::File("api/handler.py".into())));
}
