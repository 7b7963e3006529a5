use crate::config::AggregateConfiguration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// 质量等级
///
/// 排序按"坏"的程度递增：`Good < Uncertain < Bad`，
/// 因此 `max()` 得到的就是最差的质量。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Uncertain,
    Bad,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Uncertain => "uncertain",
            Self::Bad => "bad",
        }
    }
}

/// 聚合附加位
///
/// 与基础质量正交，可以叠加到任意状态码上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateBits(u16);

impl AggregateBits {
    pub const NONE: AggregateBits = AggregateBits(0x0000);
    /// 时间戳不是原始数据的时间戳
    pub const CALCULATED: AggregateBits = AggregateBits(0x0001);
    /// 数值由边界插值或沿用得到
    pub const INTERPOLATED: AggregateBits = AggregateBits(0x0002);
    /// 最后一个时间片被结束时间截断
    pub const PARTIAL: AggregateBits = AggregateBits(0x0004);
    pub const EXTRA_DATA: AggregateBits = AggregateBits(0x0008);
    /// 极值处存在多个相同的原始值
    pub const MULTIPLE_VALUES: AggregateBits = AggregateBits(0x0010);
    /// 浮点结果溢出
    pub const OVERFLOW: AggregateBits = AggregateBits(0x0080);

    const MASK: u16 = 0x009F;

    pub const fn from_bits(bits: u16) -> Self {
        AggregateBits(bits & Self::MASK)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: AggregateBits) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: AggregateBits) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: AggregateBits) {
        self.0 &= !other.0;
    }
}

impl BitOr for AggregateBits {
    type Output = AggregateBits;

    fn bitor(self, rhs: AggregateBits) -> AggregateBits {
        AggregateBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for AggregateBits {
    fn bitor_assign(&mut self, rhs: AggregateBits) {
        self.0 |= rhs.0;
    }
}

/// 状态码
///
/// 高两位是质量等级，高 16 位是子原因码，低位承载聚合附加位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    pub const GOOD_NO_DATA: StatusCode = StatusCode(0x00A5_0000);
    pub const UNCERTAIN: StatusCode = StatusCode(0x4000_0000);
    pub const UNCERTAIN_LAST_USABLE_VALUE: StatusCode = StatusCode(0x4090_0000);
    pub const UNCERTAIN_DATA_SUB_NORMAL: StatusCode = StatusCode(0x40A4_0000);
    pub const BAD: StatusCode = StatusCode(0x8000_0000);
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);
    pub const BAD_NO_DATA: StatusCode = StatusCode(0x809B_0000);
    pub const BAD_AGGREGATE_NOT_SUPPORTED: StatusCode = StatusCode(0x80D5_0000);
    pub const BAD_AGGREGATE_INVALID_INPUTS: StatusCode = StatusCode(0x80D6_0000);

    const CODE_MASK: u32 = 0xFFFF_0000;
    const INFO_TYPE_DATA_VALUE: u32 = 0x0000_0400;

    pub const fn from_bits(bits: u32) -> Self {
        StatusCode(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn severity(&self) -> Severity {
        match self.0 >> 30 {
            0 => Severity::Good,
            1 => Severity::Uncertain,
            _ => Severity::Bad,
        }
    }

    pub fn is_good(&self) -> bool {
        self.severity() == Severity::Good
    }

    pub fn is_uncertain(&self) -> bool {
        self.severity() == Severity::Uncertain
    }

    pub fn is_bad(&self) -> bool {
        self.severity() == Severity::Bad
    }

    /// 去掉附加位后的状态码（质量等级 + 子原因码）
    pub fn code(&self) -> StatusCode {
        StatusCode(self.0 & Self::CODE_MASK)
    }

    pub fn aggregate_bits(&self) -> AggregateBits {
        AggregateBits::from_bits((self.0 & 0xFFFF) as u16)
    }

    pub fn with_aggregate_bits(self, bits: AggregateBits) -> Self {
        if bits.is_empty() {
            return self;
        }
        StatusCode(self.0 | Self::INFO_TYPE_DATA_VALUE | u32::from(bits.bits()))
    }

    pub fn without_aggregate_bits(self, bits: AggregateBits) -> Self {
        let cleared = self.0 & !u32::from(bits.bits());
        if (cleared & 0x009F) == 0 {
            StatusCode(cleared & !Self::INFO_TYPE_DATA_VALUE)
        } else {
            StatusCode(cleared)
        }
    }

    /// 该状态在给定配置下是否可以参与计算
    pub fn is_usable(&self, config: &AggregateConfiguration) -> bool {
        config.is_usable(*self)
    }

    /// 返回两者中更差的状态码，等级相同时保留 `self`
    pub fn worse(self, other: StatusCode) -> StatusCode {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::GOOD
    }
}

impl From<Severity> for StatusCode {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Good => StatusCode::GOOD,
            Severity::Uncertain => StatusCode::UNCERTAIN,
            Severity::Bad => StatusCode::BAD,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.code() {
            StatusCode::GOOD => "Good",
            StatusCode::GOOD_NO_DATA => "GoodNoData",
            StatusCode::UNCERTAIN => "Uncertain",
            StatusCode::UNCERTAIN_LAST_USABLE_VALUE => "UncertainLastUsableValue",
            StatusCode::UNCERTAIN_DATA_SUB_NORMAL => "UncertainDataSubNormal",
            StatusCode::BAD => "Bad",
            StatusCode::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            StatusCode::BAD_NO_DATA => "BadNoData",
            StatusCode::BAD_AGGREGATE_NOT_SUPPORTED => "BadAggregateNotSupported",
            StatusCode::BAD_AGGREGATE_INVALID_INPUTS => "BadAggregateInvalidInputs",
            _ => return write!(f, "0x{:08X}", self.0),
        };

        let bits = self.aggregate_bits();
        if bits.is_empty() {
            write!(f, "{}", name)
        } else {
            write!(f, "{} [bits=0x{:02X}]", name, bits.bits())
        }
    }
}
