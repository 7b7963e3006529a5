use crate::status::{AggregateBits, StatusCode};
use crate::variant::Variant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 带时间戳和质量的数据值
///
/// 既用作历史原始样本，也用作聚合输出记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub value: Variant,
    pub status: StatusCode,
    pub source_timestamp: DateTime<Utc>,
}

impl DataValue {
    pub fn new(value: impl Into<Variant>, status: StatusCode, source_timestamp: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            status,
            source_timestamp,
        }
    }

    /// 创建 Good 质量的数据值
    pub fn good(source_timestamp: DateTime<Utc>, value: impl Into<Variant>) -> Self {
        Self::new(value, StatusCode::GOOD, source_timestamp)
    }

    /// 无数据记录，不携带任何数值
    pub fn no_data(source_timestamp: DateTime<Utc>) -> Self {
        Self {
            value: Variant::Empty,
            status: StatusCode::BAD_NO_DATA,
            source_timestamp,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_aggregate_bits(mut self, bits: AggregateBits) -> Self {
        self.status = self.status.with_aggregate_bits(bits);
        self
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn is_no_data(&self) -> bool {
        self.status.code() == StatusCode::BAD_NO_DATA
    }
}
