use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::history::{HistoryGlobalConfig, NodeHistoryConfig, NodeHistorySettings};

/// 全局配置
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    pub system: SystemConfig,
    pub history: HistoryGlobalConfig,
    pub logging: LoggingConfig,

    /// 节点级覆盖配置（节点 ID -> 配置）
    pub nodes: HashMap<String, NodeHistoryConfig>,
}

impl GlobalConfig {
    /// 获取节点合并后的历史配置
    pub fn node_settings(&self, node_id: &str) -> NodeHistorySettings {
        self.nodes
            .get(node_id)
            .cloned()
            .unwrap_or_default()
            .merge_with_global(&self.history)
    }
}

/// 系统配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub name: String,
    pub version: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "FLUX IOT History Server".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter 过滤表达式
    pub level: String,

    /// 是否输出 JSON 格式日志
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_global_config() {
        let config = GlobalConfig::default();
        assert_eq!(config.system.name, "FLUX IOT History Server");
        assert_eq!(config.history.minimum_processing_interval_ms, 1000);
        assert_eq!(config.logging.level, "info");
        assert!(config.nodes.is_empty());
    }

    #[test]
    fn test_unknown_node_uses_global() {
        let config = GlobalConfig::default();
        let settings = config.node_settings("ns=2;s=Unknown");
        assert!(!settings.stepped);
        assert_eq!(settings.aggregate, config.history.aggregate);
    }
}
