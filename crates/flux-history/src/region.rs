use crate::error::{HistoryError, Result};
use crate::slice::millis_between;
use chrono::{DateTime, Utc};
use flux_types::{AggregateConfiguration, DataValue, StatusCode};

/// 参与区间分解的点：边界值或原始样本
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub value: DataValue,

    /// 边界处合成的值（非原始样本）
    pub synthesized: bool,
}

impl Point {
    pub fn raw(value: DataValue) -> Self {
        Self {
            value,
            synthesized: false,
        }
    }

    pub fn synthesized(value: DataValue) -> Self {
        Self {
            value,
            synthesized: true,
        }
    }
}

/// 两个相邻点之间的子区间
///
/// 质量取自前导点。
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_value: Option<f64>,

    /// 结束点不可用时为 `None`
    pub end_value: Option<f64>,

    pub duration_ms: f64,
    pub status: StatusCode,

    /// 前导点在当前配置下可用
    pub usable: bool,
}

impl Region {
    /// 梯形积分（值·秒）；阶跃或缺少结束值时按前值保持
    pub fn area(&self, stepped: bool) -> Option<f64> {
        if !self.usable {
            return None;
        }
        let start = self.start_value?;
        let end = if stepped {
            start
        } else {
            self.end_value.unwrap_or(start)
        };
        Some((start + end) / 2.0 * self.duration_ms / 1000.0)
    }

    /// 区间内的平均值
    pub fn mean_value(&self, stepped: bool) -> Option<f64> {
        if !self.usable {
            return None;
        }
        let start = self.start_value?;
        if stepped {
            return Some(start);
        }
        Some((start + self.end_value.unwrap_or(start)) / 2.0)
    }
}

/// 把有序点序列分解为相邻区间
pub fn regions_in_value_set(
    points: &[Point],
    config: &AggregateConfiguration,
) -> Result<Vec<Region>> {
    let mut regions = Vec::with_capacity(points.len().saturating_sub(1));

    for pair in points.windows(2) {
        let (lead, next) = (&pair[0].value, &pair[1].value);
        let duration_ms = millis_between(lead.source_timestamp, next.source_timestamp);
        if duration_ms < 0.0 {
            return Err(HistoryError::internal(format!(
                "region from {} to {} has negative duration",
                lead.source_timestamp, next.source_timestamp
            )));
        }

        let usable = config.is_usable(lead.status);
        let next_usable = config.is_usable(next.status);
        regions.push(Region {
            start_time: lead.source_timestamp,
            end_time: next.source_timestamp,
            start_value: lead.as_f64(),
            end_value: if next_usable { next.as_f64() } else { None },
            duration_ms,
            status: lead.status,
            usable,
        });
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_regions_take_leading_quality() {
        let config = AggregateConfiguration::default();
        let points = vec![
            Point::raw(DataValue::good(t(0), 10.0)),
            Point::raw(DataValue::new(20.0, StatusCode::BAD, t(2))),
            Point::raw(DataValue::good(t(5), 30.0)),
        ];

        let regions = regions_in_value_set(&points, &config).unwrap();
        assert_eq!(regions.len(), 2);
        assert!(regions[0].usable);
        assert_eq!(regions[0].end_value, None);
        assert!(!regions[1].usable);
        assert_eq!(regions[1].duration_ms, 3000.0);

        assert_relative_eq!(regions[0].area(false).unwrap(), 20.0);
        assert_eq!(regions[1].area(false), None);
    }

    #[test]
    fn test_trapezoid_area() {
        let config = AggregateConfiguration::default();
        let points = vec![
            Point::raw(DataValue::good(t(0), 10.0)),
            Point::raw(DataValue::good(t(2), 20.0)),
        ];

        let regions = regions_in_value_set(&points, &config).unwrap();
        assert_relative_eq!(regions[0].area(false).unwrap(), 30.0);
        assert_relative_eq!(regions[0].area(true).unwrap(), 20.0);
        assert_relative_eq!(regions[0].mean_value(false).unwrap(), 15.0);
    }

    #[test]
    fn test_negative_duration_is_internal_error() {
        let config = AggregateConfiguration::default();
        let points = vec![
            Point::raw(DataValue::good(t(5), 1.0)),
            Point::raw(DataValue::good(t(1), 2.0)),
        ];

        let err = regions_in_value_set(&points, &config).unwrap_err();
        assert!(matches!(err, HistoryError::Internal(_)));
    }
}
