use crate::bounds::BoundKind;
use crate::context::SliceContext;
use crate::error::Result;
use flux_types::{DataValue, StatusCode};

/// 平均值函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AverageFunction {
    /// 可用样本的算术平均
    Average,
    /// 简单边界区间上的时间加权平均
    TimeAverage,
    /// 插值边界区间上的时间加权平均
    TimeAverage2,
    /// 简单边界区间上的积分（值·秒）
    Total,
    /// 插值边界区间上的积分（值·秒）
    Total2,
}

impl AverageFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::TimeAverage => "TimeAverage",
            Self::TimeAverage2 => "TimeAverage2",
            Self::Total => "Total",
            Self::Total2 => "Total2",
        }
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        match self {
            Self::Average => Ok(average(ctx)),
            Self::TimeAverage => time_weighted(ctx, BoundKind::Simple, true),
            Self::TimeAverage2 => time_weighted(ctx, BoundKind::Interpolated, true),
            Self::Total => time_weighted(ctx, BoundKind::Simple, false),
            Self::Total2 => time_weighted(ctx, BoundKind::Interpolated, false),
        }
    }
}

fn average(ctx: &SliceContext<'_>) -> DataValue {
    let values: Vec<f64> = ctx.raw.iter().filter_map(|v| ctx.usable_numeric(v)).collect();
    if values.is_empty() {
        return ctx.no_data();
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let bad = (ctx.raw.len() - values.len()) as f64;
    let status = ctx.config.interval_status(values.len() as f64, bad);
    ctx.calculated(mean, status)
}

fn time_weighted(ctx: &SliceContext<'_>, kind: BoundKind, divide: bool) -> Result<DataValue> {
    let regions = ctx.regions(kind)?;

    let mut area = 0.0;
    let mut good_ms = 0.0;
    let mut degraded = false;
    for region in &regions {
        if let Some(a) = region.area(ctx.stepped) {
            area += a;
            good_ms += region.duration_ms;
            if !region.status.is_good() {
                degraded = true;
            }
        }
    }

    if good_ms <= 0.0 {
        return Ok(ctx.no_data());
    }

    let bad_ms = (ctx.slice.width_ms() - good_ms).max(0.0);
    let mut status = ctx.config.interval_status(good_ms, bad_ms);
    if kind == BoundKind::Interpolated && degraded {
        status = status.worse(StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
    }

    let value = if divide {
        area / (good_ms / 1000.0)
    } else {
        area
    };
    Ok(ctx.calculated(value, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::RawSeries;
    use crate::slice::SlicePlan;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use flux_types::{AggregateBits, AggregateConfiguration};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn run(function: AverageFunction, series: &RawSeries, from: i64, to: i64) -> DataValue {
        let config = AggregateConfiguration::default();
        let slice = SlicePlan::new(t(from), t(to), Duration::zero()).next().unwrap();
        let ctx = SliceContext::new(slice, series, &config, false);
        function.compute(&ctx).unwrap()
    }

    #[test]
    fn test_average_ignores_bad_samples() {
        let series = RawSeries::new(vec![
            DataValue::good(t(0), 10.0),
            DataValue::new(1000.0, StatusCode::BAD, t(1)),
            DataValue::good(t(2), 30.0),
        ])
        .unwrap();

        let result = run(AverageFunction::Average, &series, 0, 2);
        assert_relative_eq!(result.as_f64().unwrap(), 20.0);
        assert_eq!(result.status.code(), StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
        assert!(result.status.aggregate_bits().contains(AggregateBits::CALCULATED));
    }

    #[test]
    fn test_time_average_and_total() {
        let series = RawSeries::new(vec![
            DataValue::good(t(0), 0.0),
            DataValue::good(t(1), 10.0),
            DataValue::good(t(4), 40.0),
        ])
        .unwrap();

        let time_average = run(AverageFunction::TimeAverage, &series, 0, 4);
        assert_relative_eq!(time_average.as_f64().unwrap(), 20.0);
        assert!(time_average.status.is_good());

        let total = run(AverageFunction::Total, &series, 0, 4);
        assert_relative_eq!(total.as_f64().unwrap(), 80.0);
    }

    #[test]
    fn test_time_average2_interpolates_bounds() {
        let series = RawSeries::new(vec![
            DataValue::good(t(0), 0.0),
            DataValue::good(t(10), 100.0),
        ])
        .unwrap();

        let result = run(AverageFunction::TimeAverage2, &series, 2, 6);
        assert_relative_eq!(result.as_f64().unwrap(), 40.0);
        assert!(result.status.is_good());
    }

    #[test]
    fn test_bounded_variants_degrade_on_uncertain_region() {
        let series = RawSeries::new(vec![
            DataValue::good(t(0), 0.0),
            DataValue::new(10.0, StatusCode::UNCERTAIN, t(2)),
            DataValue::good(t(4), 20.0),
        ])
        .unwrap();
        let config = AggregateConfiguration::default().with_treat_uncertain_as_bad(false);
        let slice = SlicePlan::new(t(0), t(4), Duration::zero()).next().unwrap();
        let ctx = SliceContext::new(slice, &series, &config, false);

        let average2 = AverageFunction::TimeAverage2.compute(&ctx).unwrap();
        assert_relative_eq!(average2.as_f64().unwrap(), 10.0);
        assert_eq!(average2.status.code(), StatusCode::UNCERTAIN_DATA_SUB_NORMAL);
        assert!(average2.status.aggregate_bits().contains(AggregateBits::CALCULATED));

        let total2 = AverageFunction::Total2.compute(&ctx).unwrap();
        assert_relative_eq!(total2.as_f64().unwrap(), 40.0);
        assert_eq!(total2.status.code(), StatusCode::UNCERTAIN_DATA_SUB_NORMAL);

        // 简单边界的版本不按区域降级
        let average = AverageFunction::TimeAverage.compute(&ctx).unwrap();
        assert!(average.status.is_good());
    }

    #[test]
    fn test_no_usable_data() {
        let series = RawSeries::default();
        for function in [AverageFunction::Average, AverageFunction::Total2] {
            let result = run(function, &series, 0, 4);
            assert!(result.is_no_data());
            assert!(result.value.is_empty());
        }
    }
}
