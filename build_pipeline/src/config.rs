//! Build-time strategy overrides (spec §4 step 3a).
//!
//! `original_source/core/metadata.py::AbstractFilterGenerator.__init__` loads
//! `config_file` as `{ column: { strategy, params } }` and consults it ahead
//! of the strategy selector in `prepare_filter_params`. Shardex's override
//! file has the same shape; `params` deserializes straight into
//! [`filter_types::BuildParams`].

use crate::error::{self, Error};
use filter_types::BuildParams;
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::HashMap;
use std::path::Path;

/// One column's override entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnOverride {
    /// The filter tag to build, bypassing the strategy selector.
    pub strategy: String,
    /// Construction parameters, if the strategy needs any beyond its
    /// defaults.
    #[serde(default)]
    pub params: BuildParams,
}

/// `column name → override`, as loaded from a `config_file`.
pub type Config = HashMap<String, ColumnOverride>;

/// Load a `config_file` from disk. An absent file is not an error at this
/// layer; callers that allow no config pass `None` to [`crate::Pipeline::new`]
/// instead of calling this.
pub fn load(path: &Path) -> Result<Config, Error> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).context(error::ReadConfigSnafu {
        path: display.clone(),
    })?;
    serde_json::from_slice(&bytes).context(error::ParseConfigSnafu { path: display })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_strategy_and_params_override() {
        let dir = std::env::temp_dir().join(format!(
            "build_pipeline_config_test_{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r#"{"amount": {"strategy": "range"}, "city": {"strategy": "fuzzy_string", "params": {"threshold": 0.85}}}"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config["amount"].strategy, "range");
        assert_eq!(config["city"].strategy, "fuzzy_string");
        assert_eq!(config["city"].params.threshold, Some(0.85));
    }

    #[test]
    fn missing_file_fails() {
        let err = load(Path::new("/does/not/exist.json")).unwrap_err();
        assert!(matches!(err, Error::ReadConfig { .. }));
    }
}
