use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// 开头的编号，例如 "399 1877 jan" 中的 399
fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,5})\b").expect("编号正则表达式无效"))
}

/// 编号后面的四位年份，例如 "399 1877 jan" 中的 1877
fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\s+(\d{4})\b").expect("年份正则表达式无效"))
}

/// 列表中的一条目录
///
/// 只在当前页面有效：每次导航之后都要按索引重新查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// 在当前列表中的位置（从 0 开始）
    pub index: usize,
    /// 显示文本（已去除首尾空白）
    pub text: String,
    /// 开头的编号
    pub number: Option<u32>,
    /// 年份
    pub year: Option<i32>,
}

impl CatalogEntry {
    /// 从显示文本解析目录条目
    pub fn parse(index: usize, raw_text: &str) -> Self {
        let text = raw_text.trim().to_string();
        let number = number_re()
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        let year = year_re()
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());

        Self {
            index,
            text,
            number,
            year,
        }
    }

    /// 状态文件中使用的标识
    ///
    /// 有编号时使用编号，否则使用完整标题
    pub fn identifier(&self) -> String {
        match self.number {
            Some(n) => n.to_string(),
            None => self.text.clone(),
        }
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "№{} {}", n, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}
