use crate::error::{HistoryError, Result};
use crate::slice::TimeSlice;
use chrono::{DateTime, Utc};
use flux_types::DataValue;

/// 按时间升序排列的原始样本序列
///
/// 由计算器独占，时间片只借用其中的切片。
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    values: Vec<DataValue>,
}

impl RawSeries {
    /// 接受升序或整体降序的样本；其他顺序返回 `UnorderedSamples`
    pub fn new(mut values: Vec<DataValue>) -> Result<Self> {
        if let Some(index) = first_unordered(&values, |a, b| a <= b) {
            if first_unordered(&values, |a, b| a >= b).is_some() {
                return Err(HistoryError::UnorderedSamples { index });
            }
            values.reverse();
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// 落在时间片内的原始样本
    pub fn range_in(&self, slice: &TimeSlice) -> &[DataValue] {
        let from = self
            .values
            .partition_point(|v| v.source_timestamp < slice.start);
        let to = if slice.closed {
            self.values
                .partition_point(|v| v.source_timestamp <= slice.end)
        } else {
            self.values
                .partition_point(|v| v.source_timestamp < slice.end)
        };
        &self.values[from..to.max(from)]
    }

    /// 时间戳不晚于 `t` 的样本个数
    pub fn count_at_or_before(&self, t: DateTime<Utc>) -> usize {
        self.values.partition_point(|v| v.source_timestamp <= t)
    }

    /// 时间戳早于 `t` 的样本个数
    pub fn count_before(&self, t: DateTime<Utc>) -> usize {
        self.values.partition_point(|v| v.source_timestamp < t)
    }

    /// 最后一个时间戳不晚于 `t` 的样本
    pub fn last_at_or_before(&self, t: DateTime<Utc>) -> Option<&DataValue> {
        self.count_at_or_before(t)
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
    }

    /// 第一个时间戳晚于 `t` 的样本
    pub fn first_after(&self, t: DateTime<Utc>) -> Option<&DataValue> {
        self.values.get(self.count_at_or_before(t))
    }
}

fn first_unordered(
    values: &[DataValue],
    in_order: impl Fn(&DateTime<Utc>, &DateTime<Utc>) -> bool,
) -> Option<usize> {
    values
        .windows(2)
        .position(|w| !in_order(&w[0].source_timestamp, &w[1].source_timestamp))
        .map(|i| i + 1)
}
