use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Pipeline kind this runner accepts.
pub const FILTER_KIND: &str = "pipeline";
/// Pipeline type this runner accepts.
pub const FILTER_TYPE: &str = "exec";

/// Capability filter sent with every stage request.
///
/// The remote server only hands out stages whose platform and labels match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub kind: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub os: String,
    pub arch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kernel: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Filter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            kind: FILTER_KIND.to_string(),
            r#type: FILTER_TYPE.to_string(),
            os: config.platform.os.clone(),
            arch: config.platform.arch.clone(),
            variant: config.platform.variant.clone(),
            kernel: config.platform.kernel.clone(),
            labels: config.runner.labels.clone(),
        }
    }
}
