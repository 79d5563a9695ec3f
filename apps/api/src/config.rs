use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::matching::combiner::{BandThresholds, ScoreWeights, ScoringPolicy};
use crate::matching::pipeline::{FailurePolicy, PipelineSettings};
use crate::matching::semantic::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Hash,
    Http,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(EmbeddingBackend::Hash),
            "http" => Ok(EmbeddingBackend::Http),
            other => Err(anyhow!("expected 'hash' or 'http', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hash,
            model: "all-MiniLM-L6-v2".to_string(),
            api_url: "http://localhost:8001/v1".to_string(),
            api_key: None,
            dimension: 384,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup naming the variable.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding: EmbeddingConfig,
    pub retry: RetryPolicy,
    pub pipeline: PipelineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            embedding: EmbeddingConfig::default(),
            retry: RetryPolicy::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding = EmbeddingConfig {
            backend: parse_or(&get, "EMBEDDING_BACKEND", defaults.embedding.backend)?,
            model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding.model),
            api_url: get("EMBEDDING_API_URL").unwrap_or(defaults.embedding.api_url),
            api_key: get("EMBEDDING_API_KEY"),
            dimension: parse_or(&get, "EMBEDDING_DIMENSION", defaults.embedding.dimension)?,
            timeout: Duration::from_secs(parse_or(
                &get,
                "EMBEDDING_TIMEOUT_SECS",
                defaults.embedding.timeout.as_secs(),
            )?),
        };

        let retry = RetryPolicy {
            max_retries: parse_or(&get, "EMBEDDING_MAX_RETRIES", defaults.retry.max_retries)?,
            backoff: Duration::from_millis(parse_or(
                &get,
                "EMBEDDING_RETRY_BACKOFF_MS",
                defaults.retry.backoff.as_millis() as u64,
            )?),
        };

        let keyword_weight: f64 = parse_or(&get, "KEYWORD_WEIGHT", 0.5)?;
        let weights = ScoreWeights::new(keyword_weight).context("Invalid KEYWORD_WEIGHT")?;

        let title_weights = match get("TITLE_KEYWORD_WEIGHTS") {
            Some(raw) => parse_title_weights(&raw).context("Invalid TITLE_KEYWORD_WEIGHTS")?,
            None => BTreeMap::new(),
        };

        let bands = match get("SEMANTIC_BAND_THRESHOLDS") {
            Some(raw) => parse_bands(&raw).context("Invalid SEMANTIC_BAND_THRESHOLDS")?,
            None => BandThresholds::default(),
        };

        let pipeline = PipelineSettings {
            scoring: ScoringPolicy {
                weights,
                title_weights,
                bands,
            },
            failure_policy: match get("EMBEDDING_FAILURE_POLICY") {
                Some(raw) => raw
                    .parse::<FailurePolicy>()
                    .map_err(|e| anyhow!(e))
                    .context("Invalid EMBEDDING_FAILURE_POLICY")?,
                None => defaults.pipeline.failure_policy,
            },
            concurrency: parse_or(&get, "MATCH_CONCURRENCY", defaults.pipeline.concurrency)?,
            run_timeout: Duration::from_secs(parse_or(
                &get,
                "MATCH_RUN_TIMEOUT_SECS",
                defaults.pipeline.run_timeout.as_secs(),
            )?),
        };

        if pipeline.concurrency == 0 {
            bail!("MATCH_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            port: parse_or(&get, "PORT", defaults.port)
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding,
            retry,
            pipeline,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Environment variable '{key}' is invalid: {e}")),
        None => Ok(default),
    }
}

/// `title=weight;title=weight`, titles matched case-insensitively.
fn parse_title_weights(raw: &str) -> Result<BTreeMap<String, ScoreWeights>> {
    let mut out = BTreeMap::new();
    for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (title, weight) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected 'title=weight', got '{pair}'"))?;
        let weight: f64 = weight
            .trim()
            .parse()
            .with_context(|| format!("weight for '{}' is not a number", title.trim()))?;
        out.insert(title.trim().to_lowercase(), ScoreWeights::new(weight)?);
    }
    Ok(out)
}

fn parse_bands(raw: &str) -> Result<BandThresholds> {
    let values = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("thresholds must be numbers")?;
    match values.as_slice() {
        [low, medium, high] => Ok(BandThresholds::new(*low, *medium, *high)?),
        _ => bail!("expected three comma-separated thresholds, got {}", values.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(cfg.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(cfg.pipeline.scoring.weights, ScoreWeights::default());
        assert_eq!(cfg.pipeline.scoring.bands, BandThresholds::default());
        assert_eq!(cfg.pipeline.failure_policy, FailurePolicy::KeywordOnly);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("EMBEDDING_BACKEND", "http"),
            ("EMBEDDING_API_KEY", "k"),
            ("KEYWORD_WEIGHT", "0.4"),
            ("SEMANTIC_BAND_THRESHOLDS", "0.1, 0.3, 0.5"),
            ("EMBEDDING_FAILURE_POLICY", "skip"),
            ("EMBEDDING_MAX_RETRIES", "5"),
            ("MATCH_RUN_TIMEOUT_SECS", "10"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.embedding.backend, EmbeddingBackend::Http);
        assert_eq!(cfg.embedding.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.pipeline.scoring.weights.keyword(), 0.4);
        assert_eq!(
            cfg.pipeline.scoring.bands,
            BandThresholds::new(0.1, 0.3, 0.5).unwrap()
        );
        assert_eq!(cfg.pipeline.failure_policy, FailurePolicy::Skip);
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.pipeline.run_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_title_weights_are_lowercased() {
        let cfg = config(&[(
            "TITLE_KEYWORD_WEIGHTS",
            "Data Entry Clerk=0.7; Senior Software Engineer = 0.3",
        )])
        .unwrap();

        let scoring = &cfg.pipeline.scoring;
        assert_eq!(scoring.weights_for("data entry clerk").keyword(), 0.7);
        assert_eq!(scoring.weights_for("SENIOR SOFTWARE ENGINEER").keyword(), 0.3);
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        let err = config(&[("KEYWORD_WEIGHT", "heavy")]).unwrap_err();
        assert!(format!("{err:#}").contains("KEYWORD_WEIGHT"));

        let err = config(&[("SEMANTIC_BAND_THRESHOLDS", "0.6,0.4,0.2")]).unwrap_err();
        assert!(format!("{err:#}").contains("SEMANTIC_BAND_THRESHOLDS"));

        assert!(config(&[("KEYWORD_WEIGHT", "1.5")]).is_err());
        assert!(config(&[("EMBEDDING_BACKEND", "onnx")]).is_err());
        assert!(config(&[("MATCH_CONCURRENCY", "0")]).is_err());
        assert!(config(&[("SEMANTIC_BAND_THRESHOLDS", "0.1,0.2")]).is_err());
    }
}
