use crate::bounds::BoundKind;
use crate::context::SliceContext;
use crate::error::Result;
use crate::region::regions_in_value_set;
use flux_types::{AggregateBits, DataValue, StatusCode, Variant};

/// 质量统计函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFunction {
    DurationGood,
    DurationBad,
    PercentGood,
    PercentBad,
    WorstQuality,
    WorstQuality2,
}

impl StatusFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DurationGood => "DurationGood",
            Self::DurationBad => "DurationBad",
            Self::PercentGood => "PercentGood",
            Self::PercentBad => "PercentBad",
            Self::WorstQuality => "WorstQuality",
            Self::WorstQuality2 => "WorstQuality2",
        }
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        match self {
            Self::DurationGood => durations(ctx, true, false),
            Self::DurationBad => durations(ctx, false, false),
            Self::PercentGood => durations(ctx, true, true),
            Self::PercentBad => durations(ctx, false, true),
            Self::WorstQuality => {
                let statuses: Vec<StatusCode> = ctx.raw.iter().map(|v| v.status).collect();
                Ok(worst_quality(ctx, &statuses))
            }
            Self::WorstQuality2 => {
                let statuses: Vec<StatusCode> = ctx
                    .points(BoundKind::Simple)
                    .iter()
                    .map(|p| p.value.status)
                    .collect();
                Ok(worst_quality(ctx, &statuses))
            }
        }
    }
}

/// 可用区间计为 Good，其余（含无数据的空隙）计为 Bad
fn durations(ctx: &SliceContext<'_>, good: bool, percent: bool) -> Result<DataValue> {
    let points = ctx.points(BoundKind::Simple);
    if points.is_empty() {
        return Ok(ctx.no_data());
    }

    let regions = regions_in_value_set(&points, ctx.config)?;
    let (good_ms, bad_ms) = ctx.region_durations(&regions);
    let selected = if good { good_ms } else { bad_ms };

    let value = if percent {
        let width = ctx.slice.width_ms();
        if width <= 0.0 {
            return Ok(ctx.no_data());
        }
        selected / width * 100.0
    } else {
        selected
    };

    Ok(ctx.calculated(value, StatusCode::GOOD))
}

/// 按请求方向扫描，返回首个最差质量；同一等级出现多次时标记 MultipleValues
fn worst_quality(ctx: &SliceContext<'_>, statuses: &[StatusCode]) -> DataValue {
    let mut worst: Option<(StatusCode, usize)> = None;

    for status in ctx.in_request_order(statuses) {
        let code = status.code();
        worst = match worst {
            None => Some((code, 1)),
            Some((current, count)) => {
                if code.severity() > current.severity() {
                    Some((code, 1))
                } else if code.severity() == current.severity() {
                    Some((current, count + 1))
                } else {
                    Some((current, count))
                }
            }
        };
    }

    let Some((code, count)) = worst else {
        return ctx.no_data();
    };

    let mut bits = AggregateBits::CALCULATED;
    if count > 1 {
        bits |= AggregateBits::MULTIPLE_VALUES;
    }
    ctx.finish(
        DataValue::new(Variant::StatusCode(code), StatusCode::GOOD, ctx.slice.timestamp()),
        bits,
    )
}
