use crate::status::{Severity, StatusCode};
use serde::{Deserialize, Serialize};

/// 聚合配置
///
/// 控制质量过滤、百分比阈值和外推方式。构造计算器之后不可再修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfiguration {
    /// 为 true 时忽略其余字段，改用服务端默认配置
    pub use_server_capabilities_defaults: bool,

    /// 是否把 Uncertain 数据当作 Bad 处理
    pub treat_uncertain_as_bad: bool,

    /// 区间内坏数据占比达到该值（0-100）时整个区间为 Bad
    pub percent_data_bad: u8,

    /// 区间内好数据占比达到该值（0-100）时整个区间为 Good
    pub percent_data_good: u8,

    /// 数据末端之后是否按斜率外推
    pub use_sloped_extrapolation: bool,
}

impl AggregateConfiguration {
    /// 服务端默认配置
    pub const fn server_defaults() -> Self {
        Self {
            use_server_capabilities_defaults: false,
            treat_uncertain_as_bad: true,
            percent_data_bad: 100,
            percent_data_good: 100,
            use_sloped_extrapolation: false,
        }
    }

    pub fn with_treat_uncertain_as_bad(mut self, value: bool) -> Self {
        self.treat_uncertain_as_bad = value;
        self
    }

    pub fn with_percent_thresholds(mut self, percent_data_bad: u8, percent_data_good: u8) -> Self {
        self.percent_data_bad = percent_data_bad;
        self.percent_data_good = percent_data_good;
        self
    }

    pub fn with_sloped_extrapolation(mut self, value: bool) -> Self {
        self.use_sloped_extrapolation = value;
        self
    }

    pub fn with_server_capabilities_defaults(mut self, value: bool) -> Self {
        self.use_server_capabilities_defaults = value;
        self
    }

    /// Good 总是可用；Uncertain 仅在不被当作 Bad 时可用
    pub fn is_usable(&self, status: StatusCode) -> bool {
        match status.severity() {
            Severity::Good => true,
            Severity::Uncertain => !self.treat_uncertain_as_bad,
            Severity::Bad => false,
        }
    }

    /// 按好/坏数据的占比判定区间质量，坏数据优先
    ///
    /// `good` 与 `bad` 可以是样本数，也可以是持续时间（毫秒）。
    pub fn interval_status(&self, good: f64, bad: f64) -> StatusCode {
        let total = good + bad;
        if total <= 0.0 {
            return StatusCode::GOOD;
        }

        let percent_bad = bad / total * 100.0;
        let percent_good = good / total * 100.0;

        if bad > 0.0 && percent_bad >= f64::from(self.percent_data_bad) {
            StatusCode::BAD
        } else if percent_good >= f64::from(self.percent_data_good) {
            StatusCode::GOOD
        } else {
            StatusCode::UNCERTAIN_DATA_SUB_NORMAL
        }
    }
}

impl Default for AggregateConfiguration {
    fn default() -> Self {
        Self::server_defaults()
    }
}
