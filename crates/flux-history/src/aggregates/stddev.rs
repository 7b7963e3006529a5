use crate::bounds::BoundKind;
use crate::context::SliceContext;
use crate::error::Result;
use crate::slice::millis_between;
use flux_types::DataValue;

/// 标准差 / 方差 / 线性回归函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StdDevFunction {
    StandardDeviationPopulation,
    StandardDeviationSample,
    VariancePopulation,
    VarianceSample,
    /// 回归斜率（值/秒）
    RegressionSlope,
    /// 回归截距（时间片起点处的值）
    RegressionIntercept,
    /// 回归残差标准差
    RegressionStdDev,
}

impl StdDevFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StandardDeviationPopulation => "StandardDeviationPopulation",
            Self::StandardDeviationSample => "StandardDeviationSample",
            Self::VariancePopulation => "VariancePopulation",
            Self::VarianceSample => "VarianceSample",
            Self::RegressionSlope => "RegressionSlope",
            Self::RegressionIntercept => "RegressionIntercept",
            Self::RegressionStdDev => "RegressionStdDev",
        }
    }

    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        match self {
            Self::StandardDeviationPopulation => Ok(dispersion(ctx, false, true)),
            Self::StandardDeviationSample => Ok(dispersion(ctx, true, true)),
            Self::VariancePopulation => Ok(dispersion(ctx, false, false)),
            Self::VarianceSample => Ok(dispersion(ctx, true, false)),
            Self::RegressionSlope | Self::RegressionIntercept | Self::RegressionStdDev => {
                regression(ctx, *self)
            }
        }
    }
}

/// 离散度（标准差或方差）
///
/// 总体版本只用片内可用的原始样本，除以 m。
/// 样本版本额外纳入非原始样本的起始简单边界，除以 (m - 1)。
/// 结束边界不计入：它沿用的是片内最后一个样本的值，同时又是下一个时间片的起始边界，
/// 计入会让同一个观测值在相邻时间片中各算一次。
fn dispersion(ctx: &SliceContext<'_>, sample: bool, root: bool) -> DataValue {
    let mut values: Vec<f64> = Vec::with_capacity(ctx.raw.len() + 1);
    if sample {
        if let Some(bound) = ctx.early_bound(BoundKind::Simple).filter(|b| !b.raw) {
            if let Some(v) = ctx.usable_numeric(&bound.value) {
                values.push(v);
            }
        }
    }
    values.extend(ctx.raw.iter().filter_map(|v| ctx.usable_numeric(v)));

    let divisor = if sample {
        values.len() as f64 - 1.0
    } else {
        values.len() as f64
    };
    if divisor < 1.0 {
        return ctx.no_data();
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / divisor;
    let value = if root { variance.sqrt() } else { variance };

    let (good, bad) = ctx.sample_counts();
    ctx.calculated(value, ctx.config.interval_status(good, bad))
}

/// 最小二乘拟合结果：`value = slope * seconds + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub residual_std_dev: f64,
    pub points: usize,
}

/// 对可用区间的中点做线性回归
///
/// 横坐标是中点距时间片起点的秒数，纵坐标是区间平均值。
/// 少于两个点或横坐标全部相同时返回 `None`。
pub fn linear_regression(ctx: &SliceContext<'_>) -> Result<Option<LinearRegression>> {
    let regions = ctx.regions(BoundKind::Simple)?;

    let samples: Vec<(f64, f64)> = regions
        .iter()
        .filter(|r| r.duration_ms > 0.0)
        .filter_map(|r| {
            let y = r.mean_value(ctx.stepped)?;
            let x = (millis_between(ctx.slice.start, r.start_time) + r.duration_ms / 2.0) / 1000.0;
            Some((x, y))
        })
        .collect();

    let n = samples.len();
    if n < 2 {
        return Ok(None);
    }

    let nf = n as f64;
    let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let sxx: f64 = samples.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return Ok(None);
    }
    let sxy: f64 = samples
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let residual: f64 = samples
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let residual_std_dev = if n > 2 {
        (residual / (nf - 2.0)).sqrt()
    } else {
        0.0
    };

    Ok(Some(LinearRegression {
        slope,
        intercept,
        residual_std_dev,
        points: n,
    }))
}

fn regression(ctx: &SliceContext<'_>, function: StdDevFunction) -> Result<DataValue> {
    let Some(fit) = linear_regression(ctx)? else {
        return Ok(ctx.no_data());
    };

    let value = match function {
        StdDevFunction::RegressionSlope => fit.slope,
        StdDevFunction::RegressionIntercept => fit.intercept,
        _ => fit.residual_std_dev,
    };

    let regions = ctx.regions(BoundKind::Simple)?;
    let (good, bad) = ctx.region_durations(&regions);
    Ok(ctx.calculated(value, ctx.config.interval_status(good, bad)))
}
