//! 页面脚本
//!
//! 每个函数生成一段自执行的 JS 代码，交给 `JsExecutor` 执行。
//! 选择器统一经过 `serde_json` 序列化后再嵌入，避免引号问题。

use serde_json::json;

use crate::models::ElementSelector;

/// 所有脚本共用的辅助函数
///
/// - `__root(frame)`：查看器所在的文档（iframe 或主文档）
/// - `__find(scope, sels)`：按顺序返回第一个可见且文本匹配的元素
/// - `__list(sels)`：第一个有匹配的列表选择器对应的全部元素
const PRELUDE: &str = r#"
    const __root = (frameSel) => {
        if (!frameSel) return document;
        const frame = document.querySelector(frameSel);
        if (!frame) return null;
        try { return frame.contentDocument; } catch (e) { return null; }
    };
    const __visible = (el) => {
        if (!el) return false;
        const view = (el.ownerDocument && el.ownerDocument.defaultView) || window;
        const style = view.getComputedStyle(el);
        return el.getClientRects().length > 0 && style.visibility !== 'hidden';
    };
    const __label = (el) =>
        [el.textContent || '', el.value || '', el.getAttribute('aria-label') || '', el.getAttribute('title') || '']
            .join(' ');
    const __find = (scope, sels) => {
        if (!scope) return null;
        for (const s of sels) {
            let nodes = [];
            try { nodes = Array.from(scope.querySelectorAll(s.css)); } catch (e) { continue; }
            for (const el of nodes) {
                if (s.text && !__label(el).includes(s.text)) continue;
                if (__visible(el)) return el;
            }
        }
        return null;
    };
    const __list = (sels) => {
        for (const css of sels) {
            const nodes = Array.from(document.querySelectorAll(css));
            if (nodes.length > 0) return nodes;
        }
        return [];
    };
"#;

fn wrap(body: &str) -> String {
    format!(
        r#"
        (async () => {{
            {}
            try {{
                {}
            }} catch (error) {{
                return {{ ok: false, reason: String(error && error.message || error) }};
            }}
        }})()
        "#,
        PRELUDE, body
    )
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // 序列化基础类型和 Vec 不会失败
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// 页面是否加载完成
pub fn ready_state() -> String {
    wrap("return document.readyState === 'complete';")
}

/// 读取列表中全部条目的文本
pub fn list_texts(list: &[String]) -> String {
    wrap(&format!(
        "return __list({}).map((el) => (el.textContent || '').trim());",
        encode(list)
    ))
}

/// 按索引点击列表条目
pub fn click_entry(list: &[String], index: usize) -> String {
    wrap(&format!(
        r#"
        const nodes = __list({list});
        const el = nodes[{index}];
        if (!el) return {{ ok: false, reason: 'entry ' + {index} + ' not found (' + nodes.length + ' entries)' }};
        el.scrollIntoView({{ block: 'center' }});
        el.click();
        return {{ ok: true }};
        "#,
        list = encode(list),
        index = index
    ))
}

/// 在条目所在卡片内点击目标元素；元素尚未出现时返回 false
pub fn click_in_container(
    list: &[String],
    index: usize,
    container: &str,
    targets: &[ElementSelector],
) -> String {
    wrap(&format!(
        r#"
        const link = __list({list})[{index}];
        if (!link) return false;
        const card = link.closest({container}) || link.parentElement;
        const el = __find(card, {targets});
        if (!el) return false;
        el.scrollIntoView({{ block: 'center' }});
        el.click();
        return {{ ok: true }};
        "#,
        list = encode(list),
        index = index,
        container = encode(container),
        targets = encode(targets)
    ))
}

/// 在查看器中点击第一个匹配的元素；没有匹配时返回 false
pub fn click_in_viewer(frame: Option<&str>, targets: &[ElementSelector]) -> String {
    wrap(&format!(
        r#"
        const el = __find(__root({frame}), {targets});
        if (!el) return false;
        el.click();
        return {{ ok: true }};
        "#,
        frame = encode(&frame),
        targets = encode(targets)
    ))
}

/// 查看器中是否存在匹配的元素
pub fn exists_in_viewer(frame: Option<&str>, targets: &[ElementSelector]) -> String {
    wrap(&format!(
        "return __find(__root({}), {}) !== null;",
        encode(&frame),
        encode(targets)
    ))
}

/// 清空并填写查看器中的输入框
///
/// 通过原生 setter 赋值并派发 input/change 事件，前端框架才能感知到变化
pub fn fill_in_viewer(frame: Option<&str>, targets: &[ElementSelector], value: &str) -> String {
    wrap(&format!(
        r#"
        const el = __find(__root({frame}), {targets});
        if (!el) return false;
        const view = el.ownerDocument.defaultView || window;
        const proto = el.tagName === 'TEXTAREA' ? view.HTMLTextAreaElement.prototype : view.HTMLInputElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
        el.focus();
        setter.call(el, '');
        el.dispatchEvent(new view.Event('input', {{ bubbles: true }}));
        setter.call(el, {value});
        el.dispatchEvent(new view.Event('input', {{ bubbles: true }}));
        el.dispatchEvent(new view.Event('change', {{ bubbles: true }}));
        return {{ ok: el.value === {value} }};
        "#,
        frame = encode(&frame),
        targets = encode(targets),
        value = encode(value)
    ))
}

/// 读取查看器中文本框的内容；为空时返回 false
pub fn read_in_viewer(frame: Option<&str>, targets: &[ElementSelector]) -> String {
    wrap(&format!(
        r#"
        const el = __find(__root({frame}), {targets});
        if (!el) return false;
        const text = ((el.value !== undefined ? el.value : el.textContent) || '').trim();
        return text.length > 0 ? text : false;
        "#,
        frame = encode(&frame),
        targets = encode(targets)
    ))
}

/// 在当前焦点元素上派发 Escape 按键
pub fn press_escape(frame: Option<&str>) -> String {
    wrap(&format!(
        r#"
        const docs = [__root({frame}), document].filter((d, i, all) => d && all.indexOf(d) === i);
        for (const doc of docs) {{
            const view = doc.defaultView || window;
            const target = doc.activeElement || doc.body;
            for (const type of ['keydown', 'keyup']) {{
                target.dispatchEvent(new view.KeyboardEvent(type, {{ key: 'Escape', code: 'Escape', keyCode: 27, bubbles: true }}));
            }}
        }}
        return {{ ok: true }};
        "#,
        frame = encode(&frame)
    ))
}

/// 从脚本返回值中取出失败原因
pub fn failure_reason(value: &serde_json::Value) -> Option<String> {
    if value.get("ok") == Some(&json!(false)) {
        Some(
            value
                .get("reason")
                .and_then(|r| r.as_str())
                .unwrap_or("脚本返回失败")
                .to_string(),
        )
    } else {
        None
    }
}
