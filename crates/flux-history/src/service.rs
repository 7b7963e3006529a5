use crate::calculator::{AggregateStream, CalculatorSpec};
use crate::error::{HistoryError, Result};
use crate::function::AggregateFunctionId;
use crate::manager::AggregateManager;
use crate::slice::interval_from_millis;
use crate::source::RawHistorySource;
use chrono::{DateTime, Utc};
use flux_types::{AggregateConfiguration, DataValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 处理后历史数据读取请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReadRequest {
    /// 请求 ID（用于日志关联）
    pub request_id: Uuid,

    /// 节点 ID
    pub node_id: String,

    /// 聚合函数
    pub aggregate: AggregateFunctionId,

    /// 开始时间
    pub start_time: DateTime<Utc>,

    /// 结束时间，早于开始时间时按逆序返回
    pub end_time: DateTime<Utc>,

    /// 处理间隔（毫秒），不大于 0 时整个范围为一个时间片
    pub processing_interval_ms: i64,

    /// 阶跃标志，未指定时取数据源的设置
    pub stepped: Option<bool>,

    /// 聚合配置，未指定时取节点配置
    pub configuration: Option<AggregateConfiguration>,
}

impl ProcessedReadRequest {
    pub fn new(
        node_id: impl Into<String>,
        aggregate: AggregateFunctionId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            node_id: node_id.into(),
            aggregate,
            start_time,
            end_time,
            processing_interval_ms: 0,
            stepped: None,
            configuration: None,
        }
    }

    pub fn with_interval_ms(mut self, processing_interval_ms: i64) -> Self {
        self.processing_interval_ms = processing_interval_ms;
        self
    }

    pub fn with_stepped(mut self, stepped: bool) -> Self {
        self.stepped = Some(stepped);
        self
    }

    pub fn with_configuration(mut self, configuration: AggregateConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// 历史读取服务
///
/// 把读请求交给注册表创建计算器，再从数据源取原始数据。
pub struct HistoryReadService<S: RawHistorySource> {
    source: Arc<S>,
    manager: Arc<AggregateManager>,
    max_slices: u64,
}

impl<S: RawHistorySource> HistoryReadService<S> {
    pub fn new(source: Arc<S>, manager: Arc<AggregateManager>) -> Self {
        Self {
            source,
            manager,
            max_slices: 100_000,
        }
    }

    pub fn with_max_slices(mut self, max_slices: u64) -> Self {
        self.max_slices = max_slices;
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn manager(&self) -> &Arc<AggregateManager> {
        &self.manager
    }

    /// 执行处理后读取，返回惰性结果序列
    ///
    /// # 错误
    /// * `InvalidTimeRange` - 起止时间相同
    /// * `AggregateNotSupported` - 聚合函数未注册
    /// * `TooManySlices` - 时间片数量超过上限
    /// * `Source` - 数据源读取失败
    pub async fn read_processed(&self, request: &ProcessedReadRequest) -> Result<AggregateStream> {
        if request.start_time == request.end_time {
            warn!(
                request_id = %request.request_id,
                node_id = %request.node_id,
                "Rejected processed read with empty time range"
            );
            return Err(HistoryError::InvalidTimeRange(request.start_time));
        }

        let stepped = match request.stepped {
            Some(stepped) => stepped,
            None => self.source.is_stepped(&request.node_id).await,
        };
        let configuration = match request.configuration {
            Some(configuration) => configuration,
            None => self.source.node_configuration(&request.node_id).await,
        };

        let spec = CalculatorSpec::new(
            request.aggregate,
            request.start_time,
            request.end_time,
            interval_from_millis(request.processing_interval_ms),
        )
        .with_stepped(stepped)
        .with_configuration(configuration);

        let calculator = self
            .manager
            .create_calculator(&spec)
            .await
            .ok_or(HistoryError::AggregateNotSupported(request.aggregate))?;

        let slices = calculator.slice_count();
        if slices > self.max_slices {
            return Err(HistoryError::TooManySlices {
                requested: slices,
                limit: self.max_slices,
            });
        }

        let (lo, hi) = calculator.time_range();
        let raw = self
            .source
            .fetch_raw(&request.node_id, lo, hi)
            .await
            .map_err(HistoryError::Source)?;

        info!(
            request_id = %request.request_id,
            node_id = %request.node_id,
            function = %calculator.function(),
            slices,
            raw_samples = raw.len(),
            backward = calculator.time_flows_backward(),
            "Processed history read"
        );
        debug!(
            request_id = %request.request_id,
            stepped,
            treat_uncertain_as_bad = configuration.treat_uncertain_as_bad,
            "Aggregate configuration resolved"
        );

        calculator.compute(raw)
    }

    /// 执行处理后读取并收集全部结果
    pub async fn read_processed_values(
        &self,
        request: &ProcessedReadRequest,
    ) -> Result<Vec<DataValue>> {
        self.read_processed(request).await?.collect_values()
    }
}
