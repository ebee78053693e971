// ==========================================
// 燃气瓶配送管理系统 - 领域类型定义
// ==========================================
// 职责: 数量/金额的边界类型、库存与支付枚举
// 红线: 空瓶库存允许为负(欠瓶), 其余数量一律非负
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ==========================================
// Quantity - 非负数量
// ==========================================
// 用途: 所有录入数量在边界处统一解析
// 规则: 无法解析/负数 一律视为 0, 不抛错
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// 有符号值转换, 负数截断为 0
    pub fn from_signed(value: i64) -> Self {
        if value <= 0 {
            Self(0)
        } else {
            Self(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }

    /// 宽松解析
    ///
    /// # 规则
    /// - 先按整数解析, 失败则按小数解析并截断
    /// - 空串、非数字、负数 → 0
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::from_signed(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::from_signed(v.trunc() as i64),
            _ => Self(0),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::ops::Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 前端录入可能是数字、小数或字符串, 统一宽松处理
#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawQuantity>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawQuantity::Int(v)) => Quantity::from_signed(v),
            Some(RawQuantity::Float(v)) if v.is_finite() => Quantity::from_signed(v.trunc() as i64),
            Some(RawQuantity::Text(s)) => Quantity::parse_lenient(&s),
            _ => Quantity::ZERO,
        })
    }
}

// ==========================================
// 金额辅助函数
// ==========================================

/// 金额下限截断为 0
pub fn non_negative(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

// ==========================================
// 库存类型 (Stock Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockType {
    Empty,     // 空瓶
    Defective, // 坏瓶
    Full,      // 满瓶(瓶型目录)
}

impl fmt::Display for StockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockType::Empty => write!(f, "empty"),
            StockType::Defective => write!(f, "defective"),
            StockType::Full => write!(f, "full"),
        }
    }
}

// ==========================================
// 变动方向 (Change Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Remove,
}

impl ChangeType {
    /// 由有符号变动量推导方向
    pub fn from_delta(delta: i64) -> Self {
        if delta >= 0 {
            ChangeType::Add
        } else {
            ChangeType::Remove
        }
    }

    /// 带方向的数量
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            ChangeType::Add => quantity,
            ChangeType::Remove => -quantity,
        }
    }
}

// ==========================================
// 支付方式 (Payment Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,  // 现金
    Check, // 支票
    MyGaz, // MyGaz 账户
}

impl PaymentMethod {
    /// 款项入账的目标账户
    pub fn account(self) -> Account {
        match self {
            PaymentMethod::Cash => Account::Cash,
            PaymentMethod::Check => Account::Bank,
            PaymentMethod::MyGaz => Account::MyGaz,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Check => write!(f, "check"),
            PaymentMethod::MyGaz => write!(f, "mygaz"),
        }
    }
}

// ==========================================
// 账户 (Account)
// ==========================================
// 资金流水的来源/去向
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Account {
    Cash,            // 收银箱
    Bank,            // 银行(支票)
    MyGaz,           // MyGaz 账户
    Driver(String),  // 司机往来
    Client(String),  // 客户往来
    External,        // 无主体的外部来源
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Cash => write!(f, "cash"),
            Account::Bank => write!(f, "bank"),
            Account::MyGaz => write!(f, "mygaz"),
            Account::Driver(id) => write!(f, "driver:{}", id),
            Account::Client(id) => write!(f, "client:{}", id),
            Account::External => write!(f, "external"),
        }
    }
}
