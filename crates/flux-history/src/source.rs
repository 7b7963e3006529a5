use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flux_config::GlobalConfig;
use flux_types::{AggregateConfiguration, DataValue, StatusCode, Variant};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// 原始历史数据源 trait
#[async_trait]
pub trait RawHistorySource: Send + Sync {
    /// 读取 `[start, end]` 内的原始样本（升序），可附带两侧的边界样本
    async fn fetch_raw(
        &self,
        node_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DataValue>>;

    /// 变量是否阶跃保持
    async fn is_stepped(&self, node_id: &str) -> bool;

    /// 数据源的默认聚合配置
    fn default_configuration(&self) -> AggregateConfiguration;

    /// 节点的聚合配置
    async fn node_configuration(&self, _node_id: &str) -> AggregateConfiguration {
        self.default_configuration()
    }
}

#[derive(Debug, Clone, Default)]
struct NodeHistory {
    values: Vec<DataValue>,
    stepped: bool,
    configuration: Option<AggregateConfiguration>,
}

/// 内存历史存储
///
/// 每个节点一条按时间排序的样本序列。
pub struct MemoryHistory {
    nodes: RwLock<HashMap<String, NodeHistory>>,
    default_configuration: AggregateConfiguration,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            default_configuration: AggregateConfiguration::server_defaults(),
        }
    }

    /// 按配置创建，预置节点级的阶跃标志和聚合配置
    pub fn from_config(config: &GlobalConfig) -> Self {
        let nodes = config
            .nodes
            .keys()
            .map(|node_id| {
                let settings = config.node_settings(node_id);
                let node = NodeHistory {
                    values: Vec::new(),
                    stepped: settings.stepped,
                    configuration: Some(settings.aggregate),
                };
                (node_id.clone(), node)
            })
            .collect();

        Self {
            nodes: RwLock::new(nodes),
            default_configuration: config.history.aggregate,
        }
    }

    pub async fn set_stepped(&self, node_id: &str, stepped: bool) {
        let mut nodes = self.nodes.write().await;
        nodes.entry(node_id.to_string()).or_default().stepped = stepped;
    }

    pub async fn set_configuration(&self, node_id: &str, configuration: AggregateConfiguration) {
        let mut nodes = self.nodes.write().await;
        nodes.entry(node_id.to_string()).or_default().configuration = Some(configuration);
    }

    /// 追加样本，保持时间顺序（同一时间戳的样本按写入顺序排列）
    pub async fn append(&self, node_id: &str, value: DataValue) {
        let mut nodes = self.nodes.write().await;
        let values = &mut nodes.entry(node_id.to_string()).or_default().values;
        let index = values.partition_point(|v| v.source_timestamp <= value.source_timestamp);
        values.insert(index, value);
    }

    pub async fn append_all(&self, node_id: &str, values: impl IntoIterator<Item = DataValue>) {
        let mut nodes = self.nodes.write().await;
        let stored = &mut nodes.entry(node_id.to_string()).or_default().values;
        stored.extend(values);
        stored.sort_by_key(|v| v.source_timestamp);
    }

    /// 追加 JSON 读数
    pub async fn append_json(
        &self,
        node_id: &str,
        timestamp: DateTime<Utc>,
        value: &serde_json::Value,
        status: StatusCode,
    ) {
        self.append(node_id, DataValue::new(Variant::from(value), status, timestamp))
            .await;
    }

    pub async fn len(&self, node_id: &str) -> usize {
        self.nodes
            .read()
            .await
            .get(node_id)
            .map(|node| node.values.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RawHistorySource for MemoryHistory {
    /// 返回范围内样本，以及两侧向外直到第一个 Good 样本为止的边界样本
    async fn fetch_raw(
        &self,
        node_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DataValue>> {
        let (lo, hi) = if end < start { (end, start) } else { (start, end) };

        let nodes = self.nodes.read().await;
        let node = nodes
            .get(node_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown history node: {}", node_id))?;
        let values = &node.values;

        let mut from = values.partition_point(|v| v.source_timestamp < lo);
        let mut to = values.partition_point(|v| v.source_timestamp <= hi);

        while from > 0 {
            from -= 1;
            if values[from].status.is_good() {
                break;
            }
        }
        while to < values.len() {
            to += 1;
            if values[to - 1].status.is_good() {
                break;
            }
        }

        debug!(
            node_id = %node_id,
            start = %lo,
            end = %hi,
            count = to - from,
            "Raw history fetched"
        );

        Ok(values[from..to].to_vec())
    }

    async fn is_stepped(&self, node_id: &str) -> bool {
        self.nodes
            .read()
            .await
            .get(node_id)
            .map(|node| node.stepped)
            .unwrap_or(false)
    }

    fn default_configuration(&self) -> AggregateConfiguration {
        self.default_configuration
    }

    async fn node_configuration(&self, node_id: &str) -> AggregateConfiguration {
        self.nodes
            .read()
            .await
            .get(node_id)
            .and_then(|node| node.configuration)
            .unwrap_or(self.default_configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use flux_config::NodeHistoryConfig;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn test_fetch_includes_bounding_samples() {
        let history = MemoryHistory::new();
        history
            .append_all(
                "temp",
                vec![
                    DataValue::good(t(0), 1.0),
                    DataValue::new(2.0, StatusCode::BAD, t(5)),
                    DataValue::good(t(10), 3.0),
                    DataValue::good(t(20), 4.0),
                    DataValue::good(t(30), 5.0),
                ],
            )
            .await;

        let raw = history.fetch_raw("temp", t(8), t(25)).await.unwrap();
        let times: Vec<_> = raw.iter().map(|v| v.source_timestamp).collect();
        assert_eq!(times, vec![t(0), t(5), t(10), t(20), t(30)]);

        let reversed = history.fetch_raw("temp", t(25), t(8)).await.unwrap();
        assert_eq!(reversed.len(), raw.len());
    }

    #[tokio::test]
    async fn test_append_keeps_order() {
        let history = MemoryHistory::new();
        history.append("temp", DataValue::good(t(10), 2.0)).await;
        history.append("temp", DataValue::good(t(0), 1.0)).await;
        history
            .append_json("temp", t(5), &serde_json::json!(1.5), StatusCode::GOOD)
            .await;

        let raw = history.fetch_raw("temp", t(0), t(10)).await.unwrap();
        let values: Vec<_> = raw.iter().filter_map(|v| v.as_f64()).collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0]);
        assert_eq!(history.len("temp").await, 3);
    }

    #[tokio::test]
    async fn test_unknown_node_is_error() {
        let history = MemoryHistory::new();
        assert!(history.fetch_raw("missing", t(0), t(1)).await.is_err());
        assert!(!history.is_stepped("missing").await);
    }

    #[tokio::test]
    async fn test_node_settings_from_config() {
        let mut config = GlobalConfig::default();
        config.nodes.insert(
            "valve".to_string(),
            NodeHistoryConfig {
                stepped: Some(true),
                percent_data_good: Some(80),
                ..Default::default()
            },
        );

        let history = MemoryHistory::from_config(&config);
        assert!(history.is_stepped("valve").await);
        assert_eq!(history.node_configuration("valve").await.percent_data_good, 80);
        assert_eq!(history.node_configuration("other").await.percent_data_good, 100);
    }
}
