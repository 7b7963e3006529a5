use crate::status::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 数据值的类型标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantType {
    Empty,
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    StatusCode,
}

impl VariantType {
    /// 是否为可参与算术运算的数值类型
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Empty | Self::String | Self::StatusCode)
    }

    /// 把计算结果转换回原始数值类型
    ///
    /// 整数类型四舍五入并饱和到类型范围；非数值类型统一得到 Double。
    pub fn cast(&self, value: f64) -> Variant {
        match self {
            Self::Boolean => Variant::Boolean(value != 0.0),
            Self::SByte => Variant::SByte(value.round() as i8),
            Self::Byte => Variant::Byte(value.round() as u8),
            Self::Int16 => Variant::Int16(value.round() as i16),
            Self::UInt16 => Variant::UInt16(value.round() as u16),
            Self::Int32 => Variant::Int32(value.round() as i32),
            Self::UInt32 => Variant::UInt32(value.round() as u32),
            Self::Int64 => Variant::Int64(value.round() as i64),
            Self::UInt64 => Variant::UInt64(value.round() as u64),
            Self::Float => Variant::Float(value as f32),
            Self::Double | Self::Empty | Self::String | Self::StatusCode => Variant::Double(value),
        }
    }
}

/// 原始样本或聚合结果中携带的值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Variant {
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    StatusCode(StatusCode),
}

impl Variant {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Empty => VariantType::Empty,
            Self::Boolean(_) => VariantType::Boolean,
            Self::SByte(_) => VariantType::SByte,
            Self::Byte(_) => VariantType::Byte,
            Self::Int16(_) => VariantType::Int16,
            Self::UInt16(_) => VariantType::UInt16,
            Self::Int32(_) => VariantType::Int32,
            Self::UInt32(_) => VariantType::UInt32,
            Self::Int64(_) => VariantType::Int64,
            Self::UInt64(_) => VariantType::UInt64,
            Self::Float(_) => VariantType::Float,
            Self::Double(_) => VariantType::Double,
            Self::String(_) => VariantType::String,
            Self::StatusCode(_) => VariantType::StatusCode,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 转换为 64 位浮点数
    ///
    /// 非数值或非有限值返回 `None`，调用方应把该样本视为 Bad。
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::SByte(v) => f64::from(*v),
            Self::Byte(v) => f64::from(*v),
            Self::Int16(v) => f64::from(*v),
            Self::UInt16(v) => f64::from(*v),
            Self::Int32(v) => f64::from(*v),
            Self::UInt32(v) => f64::from(*v),
            Self::Int64(v) => *v as f64,
            Self::UInt64(v) => *v as f64,
            Self::Float(v) => f64::from(*v),
            Self::Double(v) => *v,
            Self::Empty | Self::String(_) | Self::StatusCode(_) => return None,
        };

        value.is_finite().then_some(value)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int32(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int64(value)
    }
}

impl From<u32> for Variant {
    fn from(value: u32) -> Self {
        Variant::UInt32(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::Float(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Double(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<StatusCode> for Variant {
    fn from(value: StatusCode) -> Self {
        Variant::StatusCode(value)
    }
}

/// 设备上报的 JSON 读数转换为 Variant
impl From<&serde_json::Value> for Variant {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Variant::Empty,
            Value::Bool(b) => Variant::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Variant::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Variant::UInt64(u)
                } else {
                    n.as_f64().map(Variant::Double).unwrap_or_default()
                }
            }
            Value::String(s) => Variant::String(s.clone()),
            Value::Array(_) | Value::Object(_) => Variant::String(value.to_string()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
            Self::StatusCode(v) => write!(f, "{}", v),
        }
    }
}
