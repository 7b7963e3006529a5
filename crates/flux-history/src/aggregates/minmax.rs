use crate::bounds::BoundKind;
use crate::context::SliceContext;
use crate::error::Result;
use crate::region::Point;
use flux_types::{AggregateBits, DataValue, StatusCode, Variant};

/// 极值函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinMaxFunction {
    Minimum,
    Maximum,
    MinimumActualTime,
    MaximumActualTime,
    Range,
    Minimum2,
    Maximum2,
    MinimumActualTime2,
    MaximumActualTime2,
    Range2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    Value,
    ActualTime,
}

impl MinMaxFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
            Self::MinimumActualTime => "MinimumActualTime",
            Self::MaximumActualTime => "MaximumActualTime",
            Self::Range => "Range",
            Self::Minimum2 => "Minimum2",
            Self::Maximum2 => "Maximum2",
            Self::MinimumActualTime2 => "MinimumActualTime2",
            Self::MaximumActualTime2 => "MaximumActualTime2",
            Self::Range2 => "Range2",
        }
    }

    /// "2" 变体把简单边界也作为候选
    fn uses_bounds(&self) -> bool {
        matches!(
            self,
            Self::Minimum2
                | Self::Maximum2
                | Self::MinimumActualTime2
                | Self::MaximumActualTime2
                | Self::Range2
        )
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        let (candidates, interval_status) = if self.uses_bounds() {
            let regions = ctx.regions(BoundKind::Simple)?;
            let (good, bad) = ctx.region_durations(&regions);
            let candidates: Vec<Point> = ctx
                .points(BoundKind::Simple)
                .into_iter()
                .filter(|p| ctx.usable_numeric(&p.value).is_some())
                .collect();
            (candidates, ctx.config.interval_status(good, bad))
        } else {
            let candidates: Vec<Point> = ctx
                .raw
                .iter()
                .filter(|v| ctx.usable_numeric(v).is_some())
                .cloned()
                .map(Point::raw)
                .collect();
            let (good, bad) = ctx.sample_counts();
            (candidates, ctx.config.interval_status(good, bad))
        };

        if candidates.is_empty() {
            return Ok(ctx.no_data());
        }

        let result = match self {
            Self::Minimum | Self::Minimum2 => {
                extremum(ctx, &candidates, Extremum::Min, Report::Value, interval_status)
            }
            Self::Maximum | Self::Maximum2 => {
                extremum(ctx, &candidates, Extremum::Max, Report::Value, interval_status)
            }
            Self::MinimumActualTime | Self::MinimumActualTime2 => {
                extremum(ctx, &candidates, Extremum::Min, Report::ActualTime, interval_status)
            }
            Self::MaximumActualTime | Self::MaximumActualTime2 => {
                extremum(ctx, &candidates, Extremum::Max, Report::ActualTime, interval_status)
            }
            Self::Range | Self::Range2 => range(ctx, &candidates, interval_status),
        };
        Ok(result)
    }
}

/// 按请求方向寻找极值，返回首个极值点及并列个数
fn find<'p>(
    ctx: &SliceContext<'_>,
    candidates: &'p [Point],
    which: Extremum,
) -> Option<(&'p Point, f64, usize)> {
    let mut best: Option<(&Point, f64, usize)> = None;

    for point in ctx.in_request_order(candidates) {
        let Some(value) = point.value.as_f64() else {
            continue;
        };
        best = match best {
            None => Some((point, value, 1)),
            Some((current, current_value, ties)) => {
                let better = match which {
                    Extremum::Min => value < current_value,
                    Extremum::Max => value > current_value,
                };
                if better {
                    Some((point, value, 1))
                } else if value == current_value {
                    Some((current, current_value, ties + 1))
                } else {
                    Some((current, current_value, ties))
                }
            }
        };
    }

    best
}

fn extremum(
    ctx: &SliceContext<'_>,
    candidates: &[Point],
    which: Extremum,
    report: Report,
    interval_status: StatusCode,
) -> DataValue {
    let Some((point, _, ties)) = find(ctx, candidates, which) else {
        return ctx.no_data();
    };

    let status = point.value.status.code().worse(interval_status);
    let mut bits = AggregateBits::NONE;
    if ties > 1 {
        bits |= AggregateBits::MULTIPLE_VALUES;
    }

    let timestamp = match report {
        Report::Value => {
            bits |= AggregateBits::CALCULATED;
            ctx.slice.timestamp()
        }
        Report::ActualTime => {
            let timestamp = point.value.source_timestamp;
            if point.synthesized {
                bits |= AggregateBits::INTERPOLATED;
            } else if timestamp != ctx.slice.timestamp() {
                bits |= AggregateBits::CALCULATED;
            }
            timestamp
        }
    };

    ctx.finish(
        DataValue::new(point.value.value.clone(), status, timestamp),
        bits,
    )
}

fn range(ctx: &SliceContext<'_>, candidates: &[Point], interval_status: StatusCode) -> DataValue {
    let (Some((min, min_value, _)), Some((max, max_value, _))) = (
        find(ctx, candidates, Extremum::Min),
        find(ctx, candidates, Extremum::Max),
    ) else {
        return ctx.no_data();
    };

    let status = min
        .value
        .status
        .code()
        .worse(max.value.status.code())
        .worse(interval_status);
    ctx.calculated(Variant::Double((max_value - min_value).abs()), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::RawSeries;
    use crate::slice::SlicePlan;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use flux_types::AggregateConfiguration;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn run(function: MinMaxFunction, series: &RawSeries, from: i64, to: i64) -> DataValue {
        let config = AggregateConfiguration::default();
        let slice = SlicePlan::new(t(from), t(to), Duration::zero()).next().unwrap();
        let ctx = SliceContext::new(slice, series, &config, false);
        function.compute(&ctx).unwrap()
    }

    fn int_series() -> RawSeries {
        RawSeries::new(vec![
            DataValue::good(t(0), 5),
            DataValue::good(t(1), 2),
            DataValue::good(t(2), 9),
            DataValue::good(t(3), 2),
        ])
        .unwrap()
    }

    #[test]
    fn test_minimum_keeps_original_type_and_flags_ties() {
        let result = run(MinMaxFunction::Minimum, &int_series(), 0, 3);
        assert_eq!(result.value, Variant::Int32(2));
        assert_eq!(result.source_timestamp, t(0));

        let bits = result.status.aggregate_bits();
        assert!(bits.contains(AggregateBits::CALCULATED));
        assert!(bits.contains(AggregateBits::MULTIPLE_VALUES));
    }

    #[test]
    fn test_maximum_actual_time() {
        let result = run(MinMaxFunction::MaximumActualTime, &int_series(), 0, 3);
        assert_eq!(result.value, Variant::Int32(9));
        assert_eq!(result.source_timestamp, t(2));
        assert!(!result
            .status
            .aggregate_bits()
            .contains(AggregateBits::MULTIPLE_VALUES));
    }

    #[test]
    fn test_actual_time_on_slice_timestamp_is_not_calculated() {
        let result = run(MinMaxFunction::MaximumActualTime, &int_series(), 2, 3);
        assert_eq!(result.value, Variant::Int32(9));
        assert_eq!(result.source_timestamp, t(2));
        assert!(!result
            .status
            .aggregate_bits()
            .contains(AggregateBits::CALCULATED));

        // 逆序时报告时间戳为 t(3)，极值不在该时刻
        let reversed = run(MinMaxFunction::MaximumActualTime, &int_series(), 3, 2);
        assert_eq!(reversed.source_timestamp, t(2));
        assert!(reversed
            .status
            .aggregate_bits()
            .contains(AggregateBits::CALCULATED));
    }

    #[test]
    fn test_range_is_double() {
        let result = run(MinMaxFunction::Range, &int_series(), 0, 3);
        assert_eq!(result.value, Variant::Double(7.0));
        assert!(result.status.is_good());
    }

    #[test]
    fn test_maximum2_considers_bounds() {
        let series = RawSeries::new(vec![
            DataValue::good(t(0), 100.0),
            DataValue::good(t(5), 1.0),
        ])
        .unwrap();

        let plain = run(MinMaxFunction::Maximum, &series, 2, 8);
        assert_eq!(plain.as_f64(), Some(1.0));

        let bounded = run(MinMaxFunction::MaximumActualTime2, &series, 2, 8);
        assert_eq!(bounded.as_f64(), Some(100.0));
        assert_eq!(bounded.source_timestamp, t(2));
        assert!(bounded
            .status
            .aggregate_bits()
            .contains(AggregateBits::INTERPOLATED));
    }

    #[test]
    fn test_bad_only_gives_no_data() {
        let series = RawSeries::new(vec![DataValue::new(1.0, StatusCode::BAD, t(1))]).unwrap();
        assert!(run(MinMaxFunction::Minimum, &series, 0, 3).is_no_data());
    }
}
