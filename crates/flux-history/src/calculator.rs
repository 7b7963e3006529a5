use crate::context::SliceContext;
use crate::error::{HistoryError, Result};
use crate::function::{AggregateFunction, AggregateFunctionId};
use crate::series::RawSeries;
use crate::slice::SlicePlan;
use chrono::{DateTime, Duration, Utc};
use flux_types::{AggregateConfiguration, DataValue};
use std::cell::Cell;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use tracing::trace;

/// 构造计算器所需的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorSpec {
    pub function_id: AggregateFunctionId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub processing_interval: Duration,
    pub stepped: bool,
    pub configuration: AggregateConfiguration,
}

impl CalculatorSpec {
    pub fn new(
        function_id: AggregateFunctionId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        processing_interval: Duration,
    ) -> Self {
        Self {
            function_id,
            start_time,
            end_time,
            processing_interval,
            stepped: false,
            configuration: AggregateConfiguration::server_defaults(),
        }
    }

    pub fn with_stepped(mut self, stepped: bool) -> Self {
        self.stepped = stepped;
        self
    }

    pub fn with_configuration(mut self, configuration: AggregateConfiguration) -> Self {
        self.configuration = configuration;
        self
    }
}

/// 一次聚合运行
///
/// 每个读请求构造一个，`compute` 消耗自身；不可克隆，也不能跨线程共享。
#[derive(Debug)]
pub struct Calculator {
    function_id: AggregateFunctionId,
    function: AggregateFunction,
    plan: SlicePlan,
    stepped: bool,
    configuration: AggregateConfiguration,
    _not_sync: PhantomData<Cell<()>>,
}

impl Calculator {
    pub fn new(function: AggregateFunction, spec: &CalculatorSpec) -> Self {
        Self {
            function_id: spec.function_id,
            function,
            plan: SlicePlan::new(spec.start_time, spec.end_time, spec.processing_interval),
            stepped: spec.stepped,
            configuration: spec.configuration,
            _not_sync: PhantomData,
        }
    }

    pub fn function_id(&self) -> AggregateFunctionId {
        self.function_id
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn slice_count(&self) -> u64 {
        self.plan.slice_count()
    }

    pub fn time_flows_backward(&self) -> bool {
        self.plan.backward()
    }

    pub fn stepped(&self) -> bool {
        self.stepped
    }

    pub fn configuration(&self) -> &AggregateConfiguration {
        &self.configuration
    }

    /// 请求的时间范围（先小后大）
    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.plan.range()
    }

    /// 消费原始样本，返回惰性的结果序列
    ///
    /// 样本需按时间升序（或整体降序）排列，可以包含范围两侧的边界样本。
    pub fn compute<I>(self, raw: I) -> Result<AggregateStream>
    where
        I: IntoIterator<Item = DataValue>,
    {
        let series = RawSeries::new(raw.into_iter().collect())?;
        Ok(AggregateStream {
            function_id: self.function_id,
            function: self.function,
            plan: self.plan,
            series,
            stepped: self.stepped,
            configuration: self.configuration,
            failed: false,
            _not_sync: PhantomData,
        })
    }
}

/// 按时间片逐个产出聚合结果
///
/// 出现内部错误时产出一次 `Err`，之后结束。
#[derive(Debug)]
pub struct AggregateStream {
    function_id: AggregateFunctionId,
    function: AggregateFunction,
    plan: SlicePlan,
    series: RawSeries,
    stepped: bool,
    configuration: AggregateConfiguration,
    failed: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl AggregateStream {
    pub fn function_id(&self) -> AggregateFunctionId {
        self.function_id
    }

    /// 收集全部结果，遇到第一个错误即返回
    pub fn collect_values(self) -> Result<Vec<DataValue>> {
        self.collect()
    }
}

impl Iterator for AggregateStream {
    type Item = Result<DataValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let slice = self.plan.next()?;
        let ctx = SliceContext::new(slice, &self.series, &self.configuration, self.stepped);

        match self.function.compute(&ctx) {
            Ok(value) => {
                trace!(
                    function = %self.function,
                    slice_start = %slice.start,
                    slice_end = %slice.end,
                    status = %value.status,
                    "Slice aggregated"
                );
                Some(Ok(value))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(match e {
                    HistoryError::Internal(msg) => HistoryError::Internal(format!(
                        "{} ({}): {}",
                        self.function, self.function_id, msg
                    )),
                    other => other,
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            self.plan.size_hint()
        }
    }
}

impl FusedIterator for AggregateStream {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::{AverageFunction, CountFunction};
    use chrono::TimeZone;
    use flux_types::Variant;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_stream_is_lazy_and_ordered() {
        let spec = CalculatorSpec::new(AggregateFunctionId::COUNT, t(0), t(30), Duration::seconds(10));
        let calculator = Calculator::new(AggregateFunction::Count(CountFunction::Count), &spec);
        assert_eq!(calculator.slice_count(), 3);
        assert!(!calculator.time_flows_backward());

        let raw = (0..30).map(|s| DataValue::good(t(s), s as f64));
        let mut stream = calculator.compute(raw).unwrap();
        assert_eq!(stream.size_hint(), (3, Some(3)));

        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.source_timestamp, t(0));
        assert_eq!(first.value, Variant::Int32(10));
        assert_eq!(stream.size_hint(), (2, Some(2)));
    }

    #[test]
    fn test_unordered_input_is_rejected() {
        let spec = CalculatorSpec::new(AggregateFunctionId::AVERAGE, t(0), t(10), Duration::zero());
        let calculator = Calculator::new(AggregateFunction::Average(AverageFunction::Average), &spec);

        let raw = vec![
            DataValue::good(t(1), 1.0),
            DataValue::good(t(5), 2.0),
            DataValue::good(t(3), 3.0),
        ];
        assert!(matches!(
            calculator.compute(raw),
            Err(HistoryError::UnorderedSamples { index: 2 })
        ));
    }

    #[test]
    fn test_backward_reports_from_end() {
        let spec = CalculatorSpec::new(AggregateFunctionId::AVERAGE, t(20), t(0), Duration::seconds(10));
        let calculator = Calculator::new(AggregateFunction::Average(AverageFunction::Average), &spec);
        assert!(calculator.time_flows_backward());

        let values = calculator
            .compute((0..20).map(|s| DataValue::good(t(s), s as f64)))
            .unwrap()
            .collect_values()
            .unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0].source_timestamp, t(20));
        // 第一个时间片 [10, 20]
        assert_eq!(values[0].as_f64(), Some(14.5));
        assert_eq!(values[1].source_timestamp, t(10));
    }
}
