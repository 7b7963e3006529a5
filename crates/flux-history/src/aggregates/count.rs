use crate::bounds::BoundKind;
use crate::context::SliceContext;
use crate::error::Result;
use flux_types::{DataValue, StatusCode, Variant};

/// 计数函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountFunction {
    Count,
    AnnotationCount,
    DurationInStateZero,
    DurationInStateNonZero,
    NumberOfTransitions,
}

impl CountFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::AnnotationCount => "AnnotationCount",
            Self::DurationInStateZero => "DurationInStateZero",
            Self::DurationInStateNonZero => "DurationInStateNonZero",
            Self::NumberOfTransitions => "NumberOfTransitions",
        }
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        match self {
            Self::Count => Ok(count(ctx)),
            Self::AnnotationCount => Ok(annotation_count(ctx)),
            Self::DurationInStateZero => duration_in_state(ctx, true),
            Self::DurationInStateNonZero => duration_in_state(ctx, false),
            Self::NumberOfTransitions => Ok(transitions(ctx)),
        }
    }
}

fn to_i32(n: usize) -> Variant {
    Variant::Int32(i32::try_from(n).unwrap_or(i32::MAX))
}

fn count(ctx: &SliceContext<'_>) -> DataValue {
    let (good, bad) = ctx.sample_counts();
    if good == 0.0 {
        return ctx.no_data();
    }
    let status = ctx.config.interval_status(good, bad);
    ctx.calculated(to_i32(good as usize), status)
}

fn annotation_count(ctx: &SliceContext<'_>) -> DataValue {
    if ctx.raw.is_empty() {
        return ctx.no_data();
    }
    ctx.calculated(to_i32(ctx.raw.len()), StatusCode::GOOD)
}

fn duration_in_state(ctx: &SliceContext<'_>, zero: bool) -> Result<DataValue> {
    let regions = ctx.regions(BoundKind::Simple)?;

    let mut matched_ms = 0.0;
    let mut any = false;
    for region in regions.iter().filter(|r| r.usable) {
        let Some(value) = region.start_value else {
            continue;
        };
        any = true;
        if (value == 0.0) == zero {
            matched_ms += region.duration_ms;
        }
    }

    if !any {
        return Ok(ctx.no_data());
    }

    let (good, bad) = ctx.region_durations(&regions);
    let status = ctx.config.interval_status(good, bad);
    Ok(ctx.calculated(matched_ms, status))
}

fn transitions(ctx: &SliceContext<'_>) -> DataValue {
    let values: Vec<f64> = ctx.raw.iter().filter_map(|v| ctx.usable_numeric(v)).collect();
    if values.is_empty() {
        return ctx.no_data();
    }

    // 片外的前值作为起点
    let seed = ctx
        .early_bound(BoundKind::Simple)
        .filter(|b| !b.raw)
        .and_then(|b| ctx.usable_numeric(&b.value));

    let mut previous = seed;
    let mut changes = 0usize;
    for value in values {
        if let Some(p) = previous {
            if p != value {
                changes += 1;
            }
        }
        previous = Some(value);
    }

    let (good, bad) = ctx.sample_counts();
    let status = ctx.config.interval_status(good, bad);
    ctx.calculated(to_i32(changes), status)
}
