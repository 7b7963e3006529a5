use crate::function::AggregateFunctionId;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 历史聚合错误类型
///
/// 数据本身的问题（无数据、类型无法转换）不会产生错误，
/// 只会体现在结果的状态码上。
#[derive(Error, Debug)]
pub enum HistoryError {
    /// 起止时间相同
    #[error("Invalid time range: start and end are both {0}")]
    InvalidTimeRange(DateTime<Utc>),

    /// 聚合函数未注册
    #[error("Aggregate function not supported: {0}")]
    AggregateNotSupported(AggregateFunctionId),

    /// 原始样本未按时间排序
    #[error("Raw samples out of order at index {index}")]
    UnorderedSamples { index: usize },

    /// 请求的时间片数量超过上限
    #[error("Too many time slices requested: {requested} (limit {limit})")]
    TooManySlices { requested: u64, limit: u64 },

    /// 原始数据源错误
    #[error("Raw history source error: {0}")]
    Source(anyhow::Error),

    /// 引擎内部不变量被破坏
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 历史聚合结果类型
pub type Result<T> = std::result::Result<T, HistoryError>;

impl HistoryError {
    /// 创建内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        HistoryError::Internal(msg.into())
    }
}
