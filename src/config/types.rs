//! Configuration type definitions.
//!
//! These types are deserialised from TOML configuration files and describe
//! named pipelines built from the stage catalogue in `STAGE_TYPES`.

use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration: a set of named pipelines.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipelines: HashMap<String, PipelineConfig>,
}

/// A pipeline is a source stage followed by zero or more intermediate
/// stages, run in declaration order.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub description: String,
    pub stages: Vec<StageConfig>,
}

/// Configuration for a single stage in a pipeline.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StageConfig {
    /// The stage type to instantiate, e.g. "seq_gen", "filter", "shuffler".
    #[serde(rename = "type")]
    pub r#type: String,

    /// Stage-specific configuration parameters.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

/// Stage type names that may appear as the first stage of a pipeline
/// (sources, §4.D).
pub const SOURCE_STAGE_TYPES: &[&str] =
    &["seq_gen", "async_seq_gen", "collection", "empty", "error_source", "queue_reader"];

/// Stage type names that may appear after the first stage (intermediate
/// stages, §4.E, plus bridges/shuffler/multifile which also consume a
/// pipe).
pub const INTERMEDIATE_STAGE_TYPES: &[&str] = &[
    "filter",
    "callback",
    "delegate",
    "order_validation",
    "portion_sampler",
    "exact_sampler",
    "sync_to_async",
    "async_to_sync",
    "shuffler",
    "multifile",
];
