use crate::scanner::RepoScanner;
use anyhow::{bail, Context, Result};
use repolens_engine::{
    AnalysisInput, AnalysisSnapshot, EmbeddingProvider, HashEmbedder, IngestedFile, ModelConfig,
    RemoteEmbedder, RemoteEmbedderConfig,
};
use repolens_extractor::{content_hash, Language, Repository};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-repo analysis artifacts live here, keyed by workspace fingerprint
pub const STATE_DIR: &str = ".repolens";
const LATEST_FILE: &str = "latest";

/// Build the pipeline input for a repository root: scan, read, tag, and
/// fingerprint. The fingerprint plays the role of the commit SHA for
/// plain directories, so an unchanged tree maps to the same artifacts.
pub fn ingest(root: &Path, repo_id: Option<String>) -> Result<AnalysisInput> {
    let root = root
        .canonicalize()
        .with_context(|| format!("repository root {} not accessible", root.display()))?;

    let mut files = Vec::new();
    let mut manifest = String::new();
    for path in RepoScanner::new(&root).scan() {
        let relative = path
            .strip_prefix(&root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping unreadable file {relative}: {e}");
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        manifest.push_str(&relative);
        manifest.push(':');
        manifest.push_str(&content_hash(&bytes));
        manifest.push('\n');
        files.push(IngestedFile {
            path: relative.clone(),
            language: Language::from_path(&relative),
            content,
        });
    }

    if files.is_empty() {
        bail!("no analyzable files under {}", root.display());
    }

    let mut commit = content_hash(manifest.as_bytes());
    commit.truncate(12);

    let id = repo_id.unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repo".to_string())
    });

    Ok(AnalysisInput {
        repo: Repository {
            id,
            source: root.display().to_string(),
            branch: "local".to_string(),
            commit,
            languages: Vec::new(),
        },
        files,
    })
}

pub fn snapshot_dir(root: &Path, commit: &str) -> PathBuf {
    root.join(STATE_DIR).join(commit)
}

/// Remember which fingerprint was analyzed last
pub fn write_latest(root: &Path, commit: &str) -> Result<()> {
    let dir = root.join(STATE_DIR);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(LATEST_FILE), commit)?;
    Ok(())
}

pub async fn load_latest(root: &Path) -> Result<AnalysisSnapshot> {
    let latest = root.join(STATE_DIR).join(LATEST_FILE);
    let commit = std::fs::read_to_string(&latest)
        .context("no analysis found; run `repolens analyze` first")?;
    let dir = snapshot_dir(root, commit.trim());
    AnalysisSnapshot::load(&dir)
        .await
        .with_context(|| format!("loading analysis from {}", dir.display()))
}

/// Embedding provider from the environment: a remote OpenAI-compatible
/// endpoint when EMBEDDING_* is configured, else the deterministic hash
/// fallback.
pub fn embedder_from_env() -> Result<Arc<dyn EmbeddingProvider>> {
    let base_url = std::env::var("EMBEDDING_BASE_URL").ok();
    let api_key = std::env::var("EMBEDDING_API_KEY").ok();
    let model = std::env::var("EMBEDDING_MODEL").ok();

    match (base_url, api_key, model) {
        (Some(base_url), Some(api_key), Some(model_name)) => {
            let dimension = env_parse("EMBEDDING_DIMENSION", 1536)?;
            let embedder = RemoteEmbedder::new(RemoteEmbedderConfig {
                base_url,
                api_key,
                model_name,
                dimension,
                timeout_s: env_parse("EMBEDDING_TIMEOUT_S", 60)?,
                max_concurrency: env_parse("EMBEDDING_MAX_CONCURRENCY", 4)?,
            })?;
            Ok(Arc::new(embedder))
        }
        _ => Ok(Arc::new(HashEmbedder::default())),
    }
}

/// Generation model config from the environment
pub fn model_from_env() -> Result<ModelConfig> {
    let base_url = std::env::var("LLM_BASE_URL")
        .context("LLM_BASE_URL not set; answer needs a generation endpoint")?;
    let api_key = std::env::var("LLM_API_KEY").context("LLM_API_KEY not set")?;
    let model_name = std::env::var("LLM_MODEL").context("LLM_MODEL not set")?;
    Ok(ModelConfig {
        base_url,
        api_key,
        model_name,
        timeout_s: env_parse("LLM_TIMEOUT_S", 60)?,
        max_tokens: env_parse("LLM_MAX_TOKENS", 1024)?,
    })
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}={raw}: {e}")),
        Err(_) => Ok(default),
    }
}
