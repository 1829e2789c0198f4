//! Structural validation for loaded pipeline configurations.

use crate::config::types::{Config, PipelineConfig, INTERMEDIATE_STAGE_TYPES, SOURCE_STAGE_TYPES};

pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    for (name, pipeline) in &config.pipelines {
        validate_pipeline(name, pipeline)?;
    }
    Ok(())
}

fn validate_pipeline(name: &str, pipeline: &PipelineConfig) -> anyhow::Result<()> {
    let Some(first) = pipeline.stages.first() else {
        return Err(anyhow::anyhow!("pipeline '{}' must have at least one stage", name));
    };

    if !SOURCE_STAGE_TYPES.contains(&first.r#type.as_str()) {
        return Err(anyhow::anyhow!(
            "pipeline '{}': first stage must be a source type (one of {:?}), got '{}'",
            name,
            SOURCE_STAGE_TYPES,
            first.r#type
        ));
    }

    for stage in &pipeline.stages[1..] {
        if !INTERMEDIATE_STAGE_TYPES.contains(&stage.r#type.as_str()) {
            return Err(anyhow::anyhow!(
                "pipeline '{}': stage type '{}' is not valid after the first stage",
                name,
                stage.r#type
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config_from_string;

    #[test]
    fn accepts_source_followed_by_intermediate_stages() {
        let toml = r#"
            [pipelines.demo]
            description = "demo"

            [[pipelines.demo.stages]]
            type = "seq_gen"
            parameters = { count = 10 }

            [[pipelines.demo.stages]]
            type = "filter"
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_source_first_stage() {
        let toml = r#"
            [pipelines.demo]
            description = "demo"

            [[pipelines.demo.stages]]
            type = "filter"
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_empty_stage_list() {
        let toml = r#"
            [pipelines.demo]
            description = "demo"
            stages = []
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }
}
