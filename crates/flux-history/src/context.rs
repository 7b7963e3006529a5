use crate::bounds::{interpolated_bound, simple_bound, Bound, BoundKind};
use crate::error::Result;
use crate::region::{regions_in_value_set, Point, Region};
use crate::series::RawSeries;
use crate::slice::TimeSlice;
use chrono::{DateTime, Utc};
use flux_types::{AggregateBits, AggregateConfiguration, DataValue, StatusCode, Variant};

/// 单个时间片的计算上下文
///
/// 持有时间片、片内原始样本以及取边界所需的完整序列。
pub struct SliceContext<'a> {
    pub slice: TimeSlice,
    pub series: &'a RawSeries,

    /// 片内原始样本（时间升序）
    pub raw: &'a [DataValue],

    pub config: &'a AggregateConfiguration,
    pub stepped: bool,
}

impl<'a> SliceContext<'a> {
    pub fn new(
        slice: TimeSlice,
        series: &'a RawSeries,
        config: &'a AggregateConfiguration,
        stepped: bool,
    ) -> Self {
        Self {
            slice,
            series,
            raw: series.range_in(&slice),
            config,
            stepped,
        }
    }

    pub fn is_usable(&self, value: &DataValue) -> bool {
        self.config.is_usable(value.status)
    }

    /// 可用且可转换为浮点数时返回数值
    pub fn usable_numeric(&self, value: &DataValue) -> Option<f64> {
        if self.is_usable(value) {
            value.as_f64()
        } else {
            None
        }
    }

    pub fn bound(&self, kind: BoundKind, at: DateTime<Utc>) -> Option<Bound> {
        match kind {
            BoundKind::Simple => simple_bound(self.series, at),
            BoundKind::Interpolated => interpolated_bound(self.series, at, self.config, self.stepped),
        }
    }

    /// 起始边界（时间较早的一侧）
    pub fn early_bound(&self, kind: BoundKind) -> Option<Bound> {
        self.bound(kind, self.slice.start)
    }

    /// 结束边界（时间较晚的一侧）
    pub fn late_bound(&self, kind: BoundKind) -> Option<Bound> {
        self.bound(kind, self.slice.end)
    }

    /// 边界 + 片内原始样本，按时间升序
    ///
    /// 边界时刻恰有原始样本且该样本已在片内时不重复加入。
    pub fn points(&self, kind: BoundKind) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.raw.len() + 2);

        if let Some(bound) = self.early_bound(kind) {
            if !bound.raw {
                points.push(Point::synthesized(bound.value));
            }
        }

        points.extend(self.raw.iter().cloned().map(Point::raw));

        if let Some(bound) = self.late_bound(kind) {
            let already_inside = bound.raw && self.slice.closed;
            if !already_inside {
                points.push(if bound.raw {
                    Point::raw(bound.value)
                } else {
                    Point::synthesized(bound.value)
                });
            }
        }

        points
    }

    pub fn regions(&self, kind: BoundKind) -> Result<Vec<Region>> {
        regions_in_value_set(&self.points(kind), self.config)
    }

    /// 可用区间的时长（毫秒），以及时间片内剩余的时长
    pub fn region_durations(&self, regions: &[Region]) -> (f64, f64) {
        let good: f64 = regions
            .iter()
            .filter(|r| r.usable)
            .map(|r| r.duration_ms)
            .sum();
        (good, (self.slice.width_ms() - good).max(0.0))
    }

    /// 片内可用/不可用样本个数
    pub fn sample_counts(&self) -> (f64, f64) {
        let good = self.raw.iter().filter(|v| self.is_usable(v)).count();
        (good as f64, (self.raw.len() - good) as f64)
    }

    /// 按请求方向遍历
    pub fn in_request_order<'b, T>(&self, items: &'b [T]) -> Box<dyn Iterator<Item = &'b T> + 'b> {
        if self.slice.backward {
            Box::new(items.iter().rev())
        } else {
            Box::new(items.iter())
        }
    }

    /// 无数据记录
    pub fn no_data(&self) -> DataValue {
        DataValue::no_data(self.slice.timestamp())
    }

    /// 补上时间片级的附加位（Partial、Overflow）
    pub fn finish(&self, mut value: DataValue, mut bits: AggregateBits) -> DataValue {
        if self.slice.partial {
            bits |= AggregateBits::PARTIAL;
        }
        let overflow = match value.value {
            Variant::Double(v) => !v.is_finite(),
            Variant::Float(v) => !v.is_finite(),
            _ => false,
        };
        if overflow {
            bits |= AggregateBits::OVERFLOW;
        }
        value.status = value.status.with_aggregate_bits(bits);
        value
    }

    /// 以时间片时间戳报告的计算值
    pub fn calculated(&self, value: impl Into<Variant>, status: StatusCode) -> DataValue {
        self.finish(
            DataValue::new(value, status.code(), self.slice.timestamp()),
            AggregateBits::CALCULATED,
        )
    }
}
