use crate::bounds::{Bound, BoundKind};
use crate::context::SliceContext;
use crate::error::Result;
use chrono::{DateTime, Utc};
use flux_types::{AggregateBits, DataValue, StatusCode};

/// 起止值函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartEndFunction {
    /// 请求方向上第一个可用原始样本
    Start,
    /// 请求方向上最后一个可用原始样本
    End,
    Delta,
    StartBound,
    EndBound,
    DeltaBounds,
    /// 时间片时间戳处的插值
    Interpolative,
}

impl StartEndFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
            Self::Delta => "Delta",
            Self::StartBound => "StartBound",
            Self::EndBound => "EndBound",
            Self::DeltaBounds => "DeltaBounds",
            Self::Interpolative => "Interpolative",
        }
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        let result = match self {
            Self::Start => edge_sample(ctx, true),
            Self::End => edge_sample(ctx, false),
            Self::Delta => delta(ctx),
            Self::StartBound => edge_bound(ctx, ctx.slice.timestamp()),
            Self::EndBound => edge_bound(ctx, ctx.slice.trailing_edge()),
            Self::DeltaBounds => delta_bounds(ctx),
            Self::Interpolative => interpolative(ctx),
        };
        Ok(result)
    }
}

/// 原样返回样本，只补时间片级附加位
fn edge_sample(ctx: &SliceContext<'_>, first: bool) -> DataValue {
    let mut usable = ctx.in_request_order(ctx.raw).filter(|v| ctx.is_usable(v));
    let found = if first { usable.next() } else { usable.last() };

    match found {
        Some(value) => ctx.finish(value.clone(), AggregateBits::NONE),
        None => ctx.no_data(),
    }
}

fn delta(ctx: &SliceContext<'_>) -> DataValue {
    let numeric: Vec<(usize, f64)> = ctx
        .raw
        .iter()
        .enumerate()
        .filter_map(|(i, v)| ctx.usable_numeric(v).map(|x| (i, x)))
        .collect();

    let (Some(&(first_index, first)), Some(&(last_index, last))) = (numeric.first(), numeric.last())
    else {
        return ctx.no_data();
    };

    let skipped = first_index > 0 || last_index + 1 < ctx.raw.len();
    let status = if skipped {
        StatusCode::UNCERTAIN_DATA_SUB_NORMAL
    } else {
        StatusCode::GOOD
    };

    let value = if ctx.slice.backward {
        first - last
    } else {
        last - first
    };
    ctx.calculated(value, status)
}

/// 请求方向上某一侧的简单边界，报告在时间片时间戳
fn edge_bound(ctx: &SliceContext<'_>, edge: DateTime<Utc>) -> DataValue {
    let Some(bound) = ctx.bound(BoundKind::Simple, edge) else {
        return ctx.no_data();
    };
    if bound.value.status.is_bad() {
        return ctx.no_data();
    }

    let mut bits = AggregateBits::NONE;
    if !bound.raw {
        bits |= AggregateBits::INTERPOLATED;
    }
    if edge != ctx.slice.timestamp() {
        bits |= AggregateBits::CALCULATED;
    }

    let value = DataValue::new(
        bound.value.value,
        bound.value.status.code(),
        ctx.slice.timestamp(),
    );
    ctx.finish(value, bits)
}

fn delta_bounds(ctx: &SliceContext<'_>) -> DataValue {
    let numeric = |bound: Option<Bound>| {
        bound.and_then(|b| ctx.usable_numeric(&b.value).map(|v| (v, b.value.status.code())))
    };

    let leading = numeric(ctx.bound(BoundKind::Simple, ctx.slice.timestamp()));
    let trailing = numeric(ctx.bound(BoundKind::Simple, ctx.slice.trailing_edge()));

    match (leading, trailing) {
        (Some((start, start_status)), Some((end, end_status))) => {
            ctx.calculated(end - start, start_status.worse(end_status))
        }
        _ => ctx.no_data(),
    }
}

fn interpolative(ctx: &SliceContext<'_>) -> DataValue {
    match ctx.bound(BoundKind::Interpolated, ctx.slice.timestamp()) {
        Some(bound) => {
            let Bound { value, raw } = bound;
            let bits = if raw {
                AggregateBits::NONE
            } else {
                AggregateBits::INTERPOLATED
            };
            ctx.finish(
                DataValue::new(value.value, value.status.code(), value.source_timestamp),
                bits,
            )
        }
        None => ctx.no_data(),
    }
}
