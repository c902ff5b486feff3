use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::CatalogEntry;

/// 按哪个字段过滤目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    /// 开头的编号
    #[default]
    Number,
    /// 年份
    Year,
}

impl FromStr for FilterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "num" => Ok(FilterField::Number),
            "year" => Ok(FilterField::Year),
            other => Err(format!("未知的过滤字段: {}", other)),
        }
    }
}

/// 过滤范围（两端都包含）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRange {
    pub field: FilterField,
    pub min: i64,
    pub max: i64,
}

impl Default for FilterRange {
    fn default() -> Self {
        Self {
            field: FilterField::Number,
            min: 399,
            max: 502,
        }
    }
}

impl FilterRange {
    pub fn new(field: FilterField, min: i64, max: i64) -> Self {
        Self { field, min, max }
    }

    /// 条目是否在范围内；无法解析的条目一律不在范围内
    pub fn contains(&self, entry: &CatalogEntry) -> bool {
        let value = match self.field {
            FilterField::Number => entry.number.map(i64::from),
            FilterField::Year => entry.year.map(i64::from),
        };
        matches!(value, Some(v) if v >= self.min && v <= self.max)
    }
}

impl fmt::Display for FilterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            FilterField::Number => "编号",
            FilterField::Year => "年份",
        };
        write!(f, "{} {}..={}", field, self.min, self.max)
    }
}
