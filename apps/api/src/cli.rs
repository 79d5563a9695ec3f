//! Command-line surface: `serve` (default) runs the HTTP API, `rank` runs one
//! file-based match and writes the ranked-candidates artifact.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::artifact;
use crate::matching::pipeline::MatchPipeline;
use crate::matching::shortlist::{self, ShortlistPolicy};

#[derive(Debug, Parser)]
#[command(name = "shortlist", version, about = "Rank candidates against a job profile")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Rank a directory of candidate profiles against one job profile.
    Rank(RankArgs),
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Job profile JSON file.
    #[arg(long)]
    pub job: PathBuf,

    /// Directory of candidate profile JSON files.
    #[arg(long)]
    pub candidates: PathBuf,

    /// Where to write the ranked-candidates artifact.
    #[arg(long, default_value = "output/ranked_candidates.json")]
    pub output: PathBuf,

    #[arg(long)]
    pub top_n: Option<usize>,

    #[arg(long)]
    pub min_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankSummary {
    pub ranked: usize,
    pub skipped: usize,
    pub output: PathBuf,
}

pub async fn run_rank(pipeline: &MatchPipeline, args: &RankArgs) -> Result<RankSummary> {
    let policy = ShortlistPolicy {
        min_score: args.min_score,
        top_n: args.top_n,
    };
    if !policy.is_valid() {
        bail!("--min-score must be within [0, 1]");
    }

    let job = artifact::load_document(&args.job).context("Failed to load job profile")?;
    let batch = artifact::load_candidates(&args.candidates)
        .context("Failed to load candidate profiles")?;

    let run = pipeline.run(&job, &batch.documents).await?;
    let skipped = run.skipped.len() + batch.unreadable.len();

    let ranked = shortlist::apply(run.shortlist, &policy);
    artifact::write_ranked(&args.output, &ranked).context("Failed to write ranked candidates")?;

    info!(
        run_id = %run.run_id,
        job_title = %run.job_title,
        ranked = ranked.len(),
        skipped,
        output = %args.output.display(),
        "ranked candidates written"
    );

    Ok(RankSummary {
        ranked: ranked.len(),
        skipped,
        output: args.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use crate::embedding::HashEmbedder;
    use crate::matching::pipeline::PipelineSettings;
    use crate::matching::semantic::{RetryPolicy, SemanticEngine};

    fn pipeline() -> MatchPipeline {
        MatchPipeline::new(
            SemanticEngine::new(Arc::new(HashEmbedder::new(128)), RetryPolicy::default()),
            PipelineSettings::default(),
        )
    }

    #[test]
    fn test_cli_parses_rank_command() {
        let cli = Cli::try_parse_from([
            "shortlist", "rank", "--job", "job.json", "--candidates", "cands", "--top-n", "5",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Rank(args)) => {
                assert_eq!(args.top_n, Some(5));
                assert_eq!(args.output, PathBuf::from("output/ranked_candidates.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["shortlist"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_rank_writes_artifact_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.json");
        let cands = dir.path().join("candidates");
        fs::create_dir(&cands).unwrap();
        fs::write(
            &job,
            r#"{"job_title":"Data Engineer","required_skills":["python","sql"],"responsibilities":["Build pipelines"]}"#,
        )
        .unwrap();
        fs::write(
            cands.join("ann.json"),
            r#"{"candidate_name":"Ann","skills":["python","sql"]}"#,
        )
        .unwrap();
        fs::write(cands.join("bob.json"), r#"{"candidate_name":"Bob","skills":["java"]}"#).unwrap();
        fs::write(cands.join("broken.json"), "{").unwrap();
        fs::write(cands.join("nameless.json"), r#"{"skills":["python"]}"#).unwrap();

        let args = RankArgs {
            job,
            candidates: cands,
            output: dir.path().join("out").join("ranked.json"),
            top_n: None,
            min_score: None,
        };

        let summary = run_rank(&pipeline(), &args).await.unwrap();
        assert_eq!(summary.ranked, 2);
        assert_eq!(summary.skipped, 2);

        let ranked = artifact::read_ranked(&args.output).unwrap();
        assert_eq!(ranked[0].candidate_name, "Ann");
        assert_eq!(ranked[0].original_filename.as_deref(), Some("ann.json"));
        assert_eq!(ranked[1].candidate_name, "Bob");
    }

    #[tokio::test]
    async fn test_rank_rejects_invalid_min_score() {
        let args = RankArgs {
            job: PathBuf::from("job.json"),
            candidates: PathBuf::from("cands"),
            output: PathBuf::from("out.json"),
            top_n: None,
            min_score: Some(-1.0),
        };
        assert!(run_rank(&pipeline(), &args).await.is_err());
    }
}
