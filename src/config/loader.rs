//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Expands `${VAR}` and `${VAR:-default}` placeholders before parsing,
    /// then runs validation so a misconfigured service fails at startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = super::expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_expands_env_vars() {
        std::env::set_var("PARTGATE_TEST_BUCKET", "bucket-from-env");
        let yaml = r#"
server:
  address: "127.0.0.1:8080"
s3:
  bucket: "${PARTGATE_TEST_BUCKET}"
  access_key: "ak"
  secret_key: "sk"
"#;
        let path = std::env::temp_dir().join("partgate-loader-test.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.s3.bucket, "bucket-from-env");
        std::env::remove_var("PARTGATE_TEST_BUCKET");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ConfigLoader::load("/nonexistent/partgate.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
