//! 页面元素选择器
//!
//! 档案馆网站的 DOM 不受我们控制，所有选择器都可以在配置文件的
//! `[selectors]` 段中覆盖。默认值对应 Het Utrechts Archief 当前的 `mi_` 标记。

use serde::{Deserialize, Serialize};

/// 单个元素选择器：CSS 选择器 + 可选的文本匹配
///
/// 配置文件中既可以写成字符串 `"button.mi_button_a_style"`，
/// 也可以写成表 `{ css = "button", text = "Verstuur" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelector")]
pub struct ElementSelector {
    pub css: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelector {
    Css(String),
    Full {
        css: String,
        #[serde(default)]
        text: Option<String>,
    },
}

impl From<RawSelector> for ElementSelector {
    fn from(raw: RawSelector) -> Self {
        match raw {
            RawSelector::Css(css) => Self { css, text: None },
            RawSelector::Full { css, text } => Self { css, text },
        }
    }
}

impl ElementSelector {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: Some(text.into()),
        }
    }
}

/// 全部选择器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 目录列表链接（按顺序尝试，第一个有匹配的生效）
    pub list: Vec<String>,
    /// 条目所在的卡片容器（相对列表链接的 `closest`）
    pub container: String,
    /// 卡片内打开查看器的缩略图（表单模式）
    pub viewer_thumbnail: Vec<ElementSelector>,
    /// 卡片内的分享按钮（邮件模式）
    pub share_button: Vec<ElementSelector>,
    /// 查看器所在的 iframe；为空时直接在主文档中查找
    pub viewer_frame: Option<String>,
    /// 查看器左侧的 Download 标签
    pub download_tab: Vec<ElementSelector>,
    /// Download 面板已打开的标志
    pub download_panel: ElementSelector,
    /// 邮箱输入框
    pub email_input: Vec<ElementSelector>,
    /// 发送按钮
    pub submit: Vec<ElementSelector>,
    /// 关闭按钮
    pub close: Vec<ElementSelector>,
    /// 分享链接文本框
    pub link_box: Vec<ElementSelector>,
    /// Cookie 横幅按钮
    pub cookie_banner: Vec<ElementSelector>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            list: vec![
                "a.mi_tree_content.mi_hyperlink".to_string(),
                "a.mi_hyperlink.mi_tree_content".to_string(),
                "div.mi_tree_content a.mi_hyperlink".to_string(),
                "a.mi_hyperlink".to_string(),
            ],
            container: "div.mi_tree_content, div[class*='mi']".to_string(),
            viewer_thumbnail: vec![ElementSelector::css("a.mi_stripthumb")],
            share_button: vec![ElementSelector::css("button.mi_button_a_style")],
            viewer_frame: None,
            download_tab: vec![
                ElementSelector::css("#download"),
                ElementSelector::css("a[title*='Download'], button[title*='Download']"),
                ElementSelector::css("a[aria-label*='Download'], button[aria-label*='Download']"),
                ElementSelector::with_text("a, button", "Download"),
            ],
            download_panel: ElementSelector::with_text("body", "Download volledige reeks bestanden"),
            email_input: vec![
                ElementSelector::css("input[type='email']"),
                ElementSelector::css("input[placeholder*='E-mail' i]"),
            ],
            submit: vec![
                ElementSelector::with_text("button", "Verstuur"),
                ElementSelector::css("input[type='submit'][value='Verstuur']"),
                ElementSelector::css("button[type='submit']"),
            ],
            close: vec![
                ElementSelector::with_text("button, a", "Sluiten"),
                ElementSelector::css("button[title*='Sluiten'], a[title*='Sluiten']"),
            ],
            link_box: vec![ElementSelector::css("div.mi_link_box textarea")],
            cookie_banner: vec![
                ElementSelector::with_text("button", "Akkoord"),
                ElementSelector::with_text("button", "Accept all"),
                ElementSelector::with_text("button", "Accept"),
            ],
        }
    }
}
