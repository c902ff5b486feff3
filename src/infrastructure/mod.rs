pub mod dom_scripts;
pub mod js_executor;

pub use js_executor::{JsExecutor, ScriptRunner};
