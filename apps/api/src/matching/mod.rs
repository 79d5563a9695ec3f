// Candidate matching core.
// Implements: profile validation, keyword matching, semantic similarity,
// score combination, ranking, shortlist policy and the batch pipeline.
// Embedding calls go through the `embedding` module; nothing here talks to a model directly.

pub mod combiner;
pub mod handlers;
pub mod keyword;
pub mod pipeline;
pub mod profile;
pub mod ranker;
pub mod semantic;
pub mod shortlist;
pub mod validation;
