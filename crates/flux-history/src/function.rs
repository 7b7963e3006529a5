use crate::aggregates::{
    AverageFunction, CountFunction, MinMaxFunction, StartEndFunction, StatusFunction,
    StdDevFunction,
};
use crate::context::SliceContext;
use crate::error::Result;
use flux_types::DataValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 聚合函数标识（标准聚合函数节点的数值 ID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateFunctionId(pub u32);

impl AggregateFunctionId {
    pub const INTERPOLATIVE: Self = Self(2341);
    pub const AVERAGE: Self = Self(2342);
    pub const TIME_AVERAGE: Self = Self(2343);
    pub const TOTAL: Self = Self(2344);
    pub const MINIMUM: Self = Self(2346);
    pub const MAXIMUM: Self = Self(2347);
    pub const MINIMUM_ACTUAL_TIME: Self = Self(2348);
    pub const MAXIMUM_ACTUAL_TIME: Self = Self(2349);
    pub const RANGE: Self = Self(2350);
    pub const ANNOTATION_COUNT: Self = Self(2351);
    pub const COUNT: Self = Self(2352);
    pub const NUMBER_OF_TRANSITIONS: Self = Self(2355);
    pub const START: Self = Self(2357);
    pub const END: Self = Self(2358);
    pub const DELTA: Self = Self(2359);
    pub const DURATION_GOOD: Self = Self(2360);
    pub const DURATION_BAD: Self = Self(2361);
    pub const PERCENT_GOOD: Self = Self(2362);
    pub const PERCENT_BAD: Self = Self(2363);
    pub const WORST_QUALITY: Self = Self(2364);
    pub const TIME_AVERAGE_2: Self = Self(11285);
    pub const MINIMUM_2: Self = Self(11286);
    pub const MAXIMUM_2: Self = Self(11287);
    pub const RANGE_2: Self = Self(11288);
    pub const WORST_QUALITY_2: Self = Self(11292);
    pub const TOTAL_2: Self = Self(11304);
    pub const MINIMUM_ACTUAL_TIME_2: Self = Self(11305);
    pub const MAXIMUM_ACTUAL_TIME_2: Self = Self(11306);
    pub const DURATION_IN_STATE_ZERO: Self = Self(11307);
    pub const DURATION_IN_STATE_NON_ZERO: Self = Self(11308);
    pub const STANDARD_DEVIATION_SAMPLE: Self = Self(11426);
    pub const STANDARD_DEVIATION_POPULATION: Self = Self(11427);
    pub const VARIANCE_SAMPLE: Self = Self(11428);
    pub const VARIANCE_POPULATION: Self = Self(11429);
    pub const START_BOUND: Self = Self(11505);
    pub const END_BOUND: Self = Self(11506);
    pub const DELTA_BOUNDS: Self = Self(11507);
}

impl fmt::Display for AggregateFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i={}", self.0)
    }
}

/// 聚合函数：函数族 + 族内函数
///
/// 在构造计算器时确定一次，之后每个时间片直接匹配，不再按 ID 查找。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Average(AverageFunction),
    MinMax(MinMaxFunction),
    Count(CountFunction),
    StartEnd(StartEndFunction),
    Status(StatusFunction),
    StdDev(StdDevFunction),
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Average(f) => f.name(),
            Self::MinMax(f) => f.name(),
            Self::Count(f) => f.name(),
            Self::StartEnd(f) => f.name(),
            Self::Status(f) => f.name(),
            Self::StdDev(f) => f.name(),
        }
    }

    /// 计算单个时间片
    pub(crate) fn compute(&self, ctx: &SliceContext<'_>) -> Result<DataValue> {
        match self {
            Self::Average(f) => f.compute(ctx),
            Self::MinMax(f) => f.compute(ctx),
            Self::Count(f) => f.compute(ctx),
            Self::StartEnd(f) => f.compute(ctx),
            Self::Status(f) => f.compute(ctx),
            Self::StdDev(f) => f.compute(ctx),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Self::Average(_) => "average",
            Self::MinMax(_) => "minmax",
            Self::Count(_) => "count",
            Self::StartEnd(_) => "startend",
            Self::Status(_) => "status",
            Self::StdDev(_) => "stddev",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 内置聚合函数表
pub const BUILTIN_FUNCTIONS: &[(AggregateFunctionId, AggregateFunction)] = &[
    (AggregateFunctionId::INTERPOLATIVE, AggregateFunction::StartEnd(StartEndFunction::Interpolative)),
    (AggregateFunctionId::AVERAGE, AggregateFunction::Average(AverageFunction::Average)),
    (AggregateFunctionId::TIME_AVERAGE, AggregateFunction::Average(AverageFunction::TimeAverage)),
    (AggregateFunctionId::TOTAL, AggregateFunction::Average(AverageFunction::Total)),
    (AggregateFunctionId::TIME_AVERAGE_2, AggregateFunction::Average(AverageFunction::TimeAverage2)),
    (AggregateFunctionId::TOTAL_2, AggregateFunction::Average(AverageFunction::Total2)),
    (AggregateFunctionId::MINIMUM, AggregateFunction::MinMax(MinMaxFunction::Minimum)),
    (AggregateFunctionId::MAXIMUM, AggregateFunction::MinMax(MinMaxFunction::Maximum)),
    (AggregateFunctionId::MINIMUM_ACTUAL_TIME, AggregateFunction::MinMax(MinMaxFunction::MinimumActualTime)),
    (AggregateFunctionId::MAXIMUM_ACTUAL_TIME, AggregateFunction::MinMax(MinMaxFunction::MaximumActualTime)),
    (AggregateFunctionId::RANGE, AggregateFunction::MinMax(MinMaxFunction::Range)),
    (AggregateFunctionId::MINIMUM_2, AggregateFunction::MinMax(MinMaxFunction::Minimum2)),
    (AggregateFunctionId::MAXIMUM_2, AggregateFunction::MinMax(MinMaxFunction::Maximum2)),
    (AggregateFunctionId::MINIMUM_ACTUAL_TIME_2, AggregateFunction::MinMax(MinMaxFunction::MinimumActualTime2)),
    (AggregateFunctionId::MAXIMUM_ACTUAL_TIME_2, AggregateFunction::MinMax(MinMaxFunction::MaximumActualTime2)),
    (AggregateFunctionId::RANGE_2, AggregateFunction::MinMax(MinMaxFunction::Range2)),
    (AggregateFunctionId::COUNT, AggregateFunction::Count(CountFunction::Count)),
    (AggregateFunctionId::ANNOTATION_COUNT, AggregateFunction::Count(CountFunction::AnnotationCount)),
    (AggregateFunctionId::DURATION_IN_STATE_ZERO, AggregateFunction::Count(CountFunction::DurationInStateZero)),
    (AggregateFunctionId::DURATION_IN_STATE_NON_ZERO, AggregateFunction::Count(CountFunction::DurationInStateNonZero)),
    (AggregateFunctionId::NUMBER_OF_TRANSITIONS, AggregateFunction::Count(CountFunction::NumberOfTransitions)),
    (AggregateFunctionId::START, AggregateFunction::StartEnd(StartEndFunction::Start)),
    (AggregateFunctionId::END, AggregateFunction::StartEnd(StartEndFunction::End)),
    (AggregateFunctionId::DELTA, AggregateFunction::StartEnd(StartEndFunction::Delta)),
    (AggregateFunctionId::START_BOUND, AggregateFunction::StartEnd(StartEndFunction::StartBound)),
    (AggregateFunctionId::END_BOUND, AggregateFunction::StartEnd(StartEndFunction::EndBound)),
    (AggregateFunctionId::DELTA_BOUNDS, AggregateFunction::StartEnd(StartEndFunction::DeltaBounds)),
    (AggregateFunctionId::DURATION_GOOD, AggregateFunction::Status(StatusFunction::DurationGood)),
    (AggregateFunctionId::DURATION_BAD, AggregateFunction::Status(StatusFunction::DurationBad)),
    (AggregateFunctionId::PERCENT_GOOD, AggregateFunction::Status(StatusFunction::PercentGood)),
    (AggregateFunctionId::PERCENT_BAD, AggregateFunction::Status(StatusFunction::PercentBad)),
    (AggregateFunctionId::WORST_QUALITY, AggregateFunction::Status(StatusFunction::WorstQuality)),
    (AggregateFunctionId::WORST_QUALITY_2, AggregateFunction::Status(StatusFunction::WorstQuality2)),
    (AggregateFunctionId::STANDARD_DEVIATION_POPULATION, AggregateFunction::StdDev(StdDevFunction::StandardDeviationPopulation)),
    (AggregateFunctionId::STANDARD_DEVIATION_SAMPLE, AggregateFunction::StdDev(StdDevFunction::StandardDeviationSample)),
    (AggregateFunctionId::VARIANCE_POPULATION, AggregateFunction::StdDev(StdDevFunction::VariancePopulation)),
    (AggregateFunctionId::VARIANCE_SAMPLE, AggregateFunction::StdDev(StdDevFunction::VarianceSample)),
];

/// 按标识查找内置函数
pub fn builtin_function(id: AggregateFunctionId) -> Option<AggregateFunction> {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|(builtin_id, _)| *builtin_id == id)
        .map(|(_, function)| *function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_table_has_unique_ids_and_names() {
        let ids: HashSet<_> = BUILTIN_FUNCTIONS.iter().map(|(id, _)| *id).collect();
        let names: HashSet<_> = BUILTIN_FUNCTIONS.iter().map(|(_, f)| f.name()).collect();

        assert_eq!(ids.len(), BUILTIN_FUNCTIONS.len());
        assert_eq!(names.len(), BUILTIN_FUNCTIONS.len());
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(
            builtin_function(AggregateFunctionId::COUNT),
            Some(AggregateFunction::Count(CountFunction::Count))
        );
        assert_eq!(builtin_function(AggregateFunctionId(1)), None);
        assert_eq!(AggregateFunctionId::DELTA_BOUNDS.to_string(), "i=11507");
    }

    #[test]
    fn test_family_names() {
        let function = AggregateFunction::StdDev(StdDevFunction::RegressionSlope);
        assert_eq!(function.family(), "stddev");
        assert_eq!(function.to_string(), "RegressionSlope");
    }
}
