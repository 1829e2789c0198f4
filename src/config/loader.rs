//! Loading pipeline configuration from TOML files or strings.

use crate::config::types::Config;
use std::fs;
use std::path::Path;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

pub fn load_config_from_string(content: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_simple_pipeline() {
        let toml = r#"
            [pipelines.demo]
            description = "demo pipeline"

            [[pipelines.demo.stages]]
            type = "seq_gen"
            parameters = { count = 5 }
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert_eq!(config.pipelines.len(), 1);
        assert_eq!(config.pipelines["demo"].stages.len(), 1);
    }
}
