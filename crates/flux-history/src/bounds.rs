use crate::series::RawSeries;
use crate::slice::millis_between;
use chrono::{DateTime, Utc};
use flux_types::{AggregateBits, AggregateConfiguration, DataValue, StatusCode};

/// 边界取值策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    /// 沿用边界时刻及之前最后一个原始样本
    Simple,
    /// 在边界两侧的可用样本之间插值（阶跃变量保持前值）
    Interpolated,
}

/// 时间片边界上的值
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// 时间戳总是边界时刻
    pub value: DataValue,

    /// 边界时刻恰好存在原始样本
    pub raw: bool,
}

impl Bound {
    fn raw(value: &DataValue) -> Self {
        Self {
            value: value.clone(),
            raw: true,
        }
    }

    fn synthesized(value: DataValue) -> Self {
        Self { value, raw: false }
    }
}

/// 简单边界
pub fn simple_bound(series: &RawSeries, at: DateTime<Utc>) -> Option<Bound> {
    let prior = series.last_at_or_before(at)?;
    if prior.source_timestamp == at {
        return Some(Bound::raw(prior));
    }

    let status = prior
        .status
        .code()
        .with_aggregate_bits(AggregateBits::INTERPOLATED);
    Some(Bound::synthesized(DataValue::new(
        prior.value.clone(),
        status,
        at,
    )))
}

/// 插值边界
///
/// 只使用可用的数值样本；跨越了不可用样本或质量不同的两点时，
/// 结果降为 `UncertainDataSubNormal`。数据末尾之后按配置外推。
pub fn interpolated_bound(
    series: &RawSeries,
    at: DateTime<Utc>,
    config: &AggregateConfiguration,
    stepped: bool,
) -> Option<Bound> {
    let values = series.values();
    let usable = |v: &DataValue| config.is_usable(v.status) && v.as_f64().is_some();

    let split = series.count_at_or_before(at);
    let before_index = values[..split].iter().rposition(|v| usable(v))?;
    let before = &values[before_index];
    let skipped_before = before_index + 1 < split;

    if before.source_timestamp == at {
        return Some(Bound::raw(before));
    }

    let before_value = before.as_f64()?;

    if stepped {
        let mut status = before.status.code();
        if skipped_before {
            status = status.worse(StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
        }
        return Some(interpolated(before.value.clone(), status, at));
    }

    let after_offset = values[split..].iter().position(|v| usable(v));
    match after_offset {
        Some(offset) => {
            let after = &values[split + offset];
            let skipped = skipped_before || offset > 0;
            let after_value = after.as_f64()?;

            let value = lerp(
                before.source_timestamp,
                before_value,
                after.source_timestamp,
                after_value,
                at,
            );

            let mut status = before.status.code().worse(after.status.code());
            if skipped || before.status.severity() != after.status.severity() {
                status = status.worse(StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
            }
            Some(interpolated(before.value.variant_type().cast(value), status, at))
        }
        None => {
            // 数据末尾之后：外推
            let previous = values[..before_index].iter().rposition(|v| usable(v));
            let value = match previous {
                Some(i) if config.use_sloped_extrapolation => {
                    let first = &values[i];
                    let first_value = first.as_f64()?;
                    lerp(
                        first.source_timestamp,
                        first_value,
                        before.source_timestamp,
                        before_value,
                        at,
                    )
                }
                _ => before_value,
            };

            let status = before
                .status
                .code()
                .worse(StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
            Some(interpolated(before.value.variant_type().cast(value), status, at))
        }
    }
}

fn interpolated(value: flux_types::Variant, status: StatusCode, at: DateTime<Utc>) -> Bound {
    Bound::synthesized(DataValue::new(
        value,
        status.with_aggregate_bits(AggregateBits::INTERPOLATED),
        at,
    ))
}

/// 过 (t1, v1)、(t2, v2) 的直线在 `at` 处的值
fn lerp(t1: DateTime<Utc>, v1: f64, t2: DateTime<Utc>, v2: f64, at: DateTime<Utc>) -> f64 {
    let span = millis_between(t1, t2);
    if span == 0.0 {
        return v2;
    }
    v1 + (v2 - v1) * millis_between(t1, at) / span
}
