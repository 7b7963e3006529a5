use crate::calculator::{Calculator, CalculatorSpec};
use crate::function::{AggregateFunction, AggregateFunctionId, BUILTIN_FUNCTIONS};
use crate::slice::interval_from_millis;
use chrono::Duration;
use flux_config::HistoryGlobalConfig;
use flux_types::AggregateConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 计算器工厂
pub type CalculatorFactory = Arc<dyn Fn(&CalculatorSpec) -> Calculator + Send + Sync>;

/// 为函数枚举生成工厂
pub fn builtin_factory(function: AggregateFunction) -> CalculatorFactory {
    Arc::new(move |spec: &CalculatorSpec| Calculator::new(function, spec))
}

/// 注册表变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    Registered { id: AggregateFunctionId, name: String },
    Unregistered { id: AggregateFunctionId, name: String },
}

struct FunctionEntry {
    name: String,
    factory: CalculatorFactory,
}

struct RegistryState {
    functions: HashMap<AggregateFunctionId, FunctionEntry>,
    default_configuration: AggregateConfiguration,
    minimum_processing_interval: Duration,
}

/// 聚合函数注册表
///
/// 所有读写都经过同一把锁，锁只在访问表时持有；
/// 计算器在锁外构造，原始数据的读取也在锁外进行。
pub struct AggregateManager {
    state: RwLock<RegistryState>,
    events: broadcast::Sender<RegistryEvent>,
}

impl RegistryState {
    fn empty() -> Self {
        Self {
            functions: HashMap::new(),
            default_configuration: AggregateConfiguration::server_defaults(),
            minimum_processing_interval: Duration::zero(),
        }
    }

    fn builtin() -> Self {
        let functions = BUILTIN_FUNCTIONS
            .iter()
            .map(|(id, function)| {
                let entry = FunctionEntry {
                    name: function.name().to_string(),
                    factory: builtin_factory(*function),
                };
                (*id, entry)
            })
            .collect();
        Self {
            functions,
            ..Self::empty()
        }
    }
}

impl AggregateManager {
    fn with_state(state: RegistryState) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(state),
            events,
        }
    }

    /// 创建空注册表
    pub fn new() -> Self {
        Self::with_state(RegistryState::empty())
    }

    /// 创建包含全部内置函数的注册表
    pub fn with_builtin_functions() -> Self {
        Self::with_state(RegistryState::builtin())
    }

    /// 根据配置创建注册表
    pub fn from_config(config: &HistoryGlobalConfig) -> Self {
        Self::with_state(RegistryState {
            default_configuration: config.aggregate,
            minimum_processing_interval: interval_from_millis(config.minimum_processing_interval_ms),
            ..RegistryState::builtin()
        })
    }

    /// 订阅注册表变更
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub async fn is_supported(&self, id: AggregateFunctionId) -> bool {
        self.state.read().await.functions.contains_key(&id)
    }

    /// 按名称查找函数标识（忽略大小写）
    pub async fn function_id(&self, name: &str) -> Option<AggregateFunctionId> {
        let state = self.state.read().await;
        state
            .functions
            .iter()
            .filter(|(_, entry)| entry.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
            .min()
    }

    pub async fn function_name(&self, id: AggregateFunctionId) -> Option<String> {
        self.state
            .read()
            .await
            .functions
            .get(&id)
            .map(|entry| entry.name.clone())
    }

    /// 注册计算器工厂
    ///
    /// # 参数
    /// * `id` - 函数标识，已存在时替换
    /// * `name` - 函数名称，用于按名称查找
    /// * `factory` - 计算器工厂
    pub async fn register_factory(
        &self,
        id: AggregateFunctionId,
        name: impl Into<String>,
        factory: CalculatorFactory,
    ) {
        let name = name.into();
        let replaced = {
            let mut state = self.state.write().await;
            state
                .functions
                .insert(
                    id,
                    FunctionEntry {
                        name: name.clone(),
                        factory,
                    },
                )
                .is_some()
        };

        info!(function_id = %id, name = %name, replaced, "Aggregate function registered");
        let _ = self.events.send(RegistryEvent::Registered { id, name });
    }

    /// 注册函数枚举
    pub async fn register_function(&self, id: AggregateFunctionId, function: AggregateFunction) {
        self.register_factory(id, function.name(), builtin_factory(function))
            .await;
    }

    /// 注销计算器工厂
    ///
    /// # 返回
    /// 函数原先存在时返回 `true`
    pub async fn unregister_factory(&self, id: AggregateFunctionId) -> bool {
        let removed = self.state.write().await.functions.remove(&id);

        match removed {
            Some(entry) => {
                info!(function_id = %id, name = %entry.name, "Aggregate function unregistered");
                let _ = self.events.send(RegistryEvent::Unregistered {
                    id,
                    name: entry.name,
                });
                true
            }
            None => {
                debug!(function_id = %id, "Aggregate function not registered");
                false
            }
        }
    }

    pub async fn default_configuration(&self) -> AggregateConfiguration {
        self.state.read().await.default_configuration
    }

    pub async fn set_default_configuration(&self, configuration: AggregateConfiguration) {
        self.state.write().await.default_configuration = configuration;
        info!(
            treat_uncertain_as_bad = configuration.treat_uncertain_as_bad,
            percent_data_bad = configuration.percent_data_bad,
            percent_data_good = configuration.percent_data_good,
            "Default aggregate configuration updated"
        );
    }

    pub async fn minimum_processing_interval(&self) -> Duration {
        self.state.read().await.minimum_processing_interval
    }

    pub async fn set_minimum_processing_interval(&self, interval: Duration) {
        let interval = interval.max(Duration::zero());
        self.state.write().await.minimum_processing_interval = interval;
        info!(
            minimum_ms = interval.num_milliseconds(),
            "Minimum processing interval updated"
        );
    }

    /// 创建计算器
    ///
    /// # 参数
    /// * `spec` - 请求参数；`use_server_capabilities_defaults` 为真时改用注册表的默认配置，
    ///   正的处理间隔小于下限时被抬到下限
    ///
    /// # 返回
    /// 函数未注册时返回 `None`
    pub async fn create_calculator(&self, spec: &CalculatorSpec) -> Option<Calculator> {
        let mut spec = *spec;
        let factory = {
            let state = self.state.read().await;
            let entry = state.functions.get(&spec.function_id)?;

            if spec.configuration.use_server_capabilities_defaults {
                spec.configuration = state.default_configuration;
            }

            let minimum = state.minimum_processing_interval;
            if spec.processing_interval > Duration::zero() && spec.processing_interval < minimum {
                warn!(
                    function_id = %spec.function_id,
                    requested_ms = spec.processing_interval.num_milliseconds(),
                    minimum_ms = minimum.num_milliseconds(),
                    "Processing interval raised to server minimum"
                );
                spec.processing_interval = minimum;
            }

            Arc::clone(&entry.factory)
        };

        debug!(
            function_id = %spec.function_id,
            start = %spec.start_time,
            end = %spec.end_time,
            interval_ms = spec.processing_interval.num_milliseconds(),
            stepped = spec.stepped,
            "Creating aggregate calculator"
        );
        Some(factory(&spec))
    }
}

impl Default for AggregateManager {
    fn default() -> Self {
        Self::with_builtin_functions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::StdDevFunction;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn test_builtin_functions_are_supported() {
        let manager = AggregateManager::with_builtin_functions();

        assert!(manager.is_supported(AggregateFunctionId::AVERAGE).await);
        assert!(manager.is_supported(AggregateFunctionId::DELTA_BOUNDS).await);
        assert!(!manager.is_supported(AggregateFunctionId(42)).await);
        assert_eq!(
            manager.function_id("timeaverage2").await,
            Some(AggregateFunctionId::TIME_AVERAGE_2)
        );
        assert_eq!(
            manager.function_name(AggregateFunctionId::COUNT).await.as_deref(),
            Some("Count")
        );
    }

    #[tokio::test]
    async fn test_unknown_function_gives_none() {
        let manager = AggregateManager::new();
        let spec = CalculatorSpec::new(AggregateFunctionId::AVERAGE, t(0), t(10), Duration::zero());
        assert!(manager.create_calculator(&spec).await.is_none());
    }

    #[tokio::test]
    async fn test_register_and_unregister_emit_events() {
        let manager = AggregateManager::new();
        let mut events = manager.subscribe();
        let id = AggregateFunctionId(90_001);

        manager
            .register_function(id, AggregateFunction::StdDev(StdDevFunction::RegressionSlope))
            .await;
        assert!(manager.is_supported(id).await);

        assert!(manager.unregister_factory(id).await);
        assert!(!manager.unregister_factory(id).await);

        assert_eq!(
            events.recv().await.unwrap(),
            RegistryEvent::Registered {
                id,
                name: "RegressionSlope".to_string()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            RegistryEvent::Unregistered {
                id,
                name: "RegressionSlope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_defaults_substitution() {
        let manager = AggregateManager::with_builtin_functions();
        let server = AggregateConfiguration::server_defaults().with_percent_thresholds(50, 50);
        manager.set_default_configuration(server).await;

        let requested = AggregateConfiguration::default()
            .with_treat_uncertain_as_bad(false)
            .with_server_capabilities_defaults(true);
        let spec = CalculatorSpec::new(AggregateFunctionId::AVERAGE, t(0), t(10), Duration::zero())
            .with_configuration(requested);

        let calculator = manager.create_calculator(&spec).await.unwrap();
        assert_eq!(*calculator.configuration(), server);
    }

    #[tokio::test]
    async fn test_minimum_interval_is_enforced() {
        let config = HistoryGlobalConfig {
            minimum_processing_interval_ms: 5_000,
            ..Default::default()
        };
        let manager = AggregateManager::from_config(&config);

        let spec = CalculatorSpec::new(AggregateFunctionId::COUNT, t(0), t(60), Duration::seconds(1));
        let calculator = manager.create_calculator(&spec).await.unwrap();
        assert_eq!(calculator.slice_count(), 12);

        // 非正间隔表示整个范围一个时间片，不受下限影响
        let whole = CalculatorSpec::new(AggregateFunctionId::COUNT, t(0), t(60), Duration::zero());
        let calculator = manager.create_calculator(&whole).await.unwrap();
        assert_eq!(calculator.slice_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let manager = Arc::new(AggregateManager::with_builtin_functions());
        let mut handles = Vec::new();

        for i in 0..16u32 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                let id = AggregateFunctionId(100_000 + i);
                manager
                    .register_function(id, AggregateFunction::StdDev(StdDevFunction::RegressionIntercept))
                    .await;
                let spec = CalculatorSpec::new(id, t(0), t(10), Duration::zero());
                manager.create_calculator(&spec).await.is_some()
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
