pub mod aggregates;
pub mod bounds;
pub mod calculator;
pub mod context;
pub mod error;
pub mod function;
pub mod manager;
pub mod region;
pub mod series;
pub mod service;
pub mod slice;
pub mod source;

pub use aggregates::{
    linear_regression, AverageFunction, CountFunction, LinearRegression, MinMaxFunction,
    StartEndFunction, StatusFunction, StdDevFunction,
};
pub use bounds::{Bound, BoundKind};
pub use calculator::{AggregateStream, Calculator, CalculatorSpec};
pub use context::SliceContext;
pub use error::{HistoryError, Result};
pub use function::{builtin_function, AggregateFunction, AggregateFunctionId, BUILTIN_FUNCTIONS};
pub use manager::{builtin_factory, AggregateManager, CalculatorFactory, RegistryEvent};
pub use region::{regions_in_value_set, Point, Region};
pub use series::RawSeries;
pub use service::{HistoryReadService, ProcessedReadRequest};
pub use slice::{interval_from_millis, SlicePlan, TimeSlice};
pub use source::{MemoryHistory, RawHistorySource};
