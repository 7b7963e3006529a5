use flux_types::AggregateConfiguration;
use serde::{Deserialize, Serialize};

/// 历史聚合全局配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryGlobalConfig {
    /// 服务端允许的最小处理间隔（毫秒）
    pub minimum_processing_interval_ms: i64,

    /// 单次读取允许的最大时间片数量
    pub max_slices_per_read: u64,

    /// 服务端默认聚合配置
    pub aggregate: AggregateConfiguration,
}

impl Default for HistoryGlobalConfig {
    fn default() -> Self {
        Self {
            minimum_processing_interval_ms: 1000,
            max_slices_per_read: 100_000,
            aggregate: AggregateConfiguration::server_defaults(),
        }
    }
}

/// 单个节点的历史配置（可覆盖全局）
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NodeHistoryConfig {
    /// 变量值是否阶跃保持
    pub stepped: Option<bool>,
    pub treat_uncertain_as_bad: Option<bool>,
    pub percent_data_bad: Option<u8>,
    pub percent_data_good: Option<u8>,
    pub use_sloped_extrapolation: Option<bool>,
}

impl NodeHistoryConfig {
    /// 合并全局配置和节点配置
    pub fn merge_with_global(&self, global: &HistoryGlobalConfig) -> NodeHistorySettings {
        let defaults = global.aggregate;
        NodeHistorySettings {
            stepped: self.stepped.unwrap_or(false),
            aggregate: AggregateConfiguration {
                use_server_capabilities_defaults: false,
                treat_uncertain_as_bad: self
                    .treat_uncertain_as_bad
                    .unwrap_or(defaults.treat_uncertain_as_bad),
                percent_data_bad: self.percent_data_bad.unwrap_or(defaults.percent_data_bad),
                percent_data_good: self.percent_data_good.unwrap_or(defaults.percent_data_good),
                use_sloped_extrapolation: self
                    .use_sloped_extrapolation
                    .unwrap_or(defaults.use_sloped_extrapolation),
            },
        }
    }
}

/// 合并后的节点历史配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHistorySettings {
    pub stepped: bool,
    pub aggregate: AggregateConfiguration,
}
