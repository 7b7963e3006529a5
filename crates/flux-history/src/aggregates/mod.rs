//! 聚合函数族
//!
//! 每个函数族是一个封闭枚举，`compute` 把单个时间片转换为一条结果记录。

mod average;
mod count;
mod minmax;
mod start_end;
mod status;
mod stddev;

pub use average::AverageFunction;
pub use count::CountFunction;
pub use minmax::MinMaxFunction;
pub use start_end::StartEndFunction;
pub use status::StatusFunction;
pub use stddev::{linear_regression, LinearRegression, StdDevFunction};
