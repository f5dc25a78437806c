//! JavaScript snippets evaluated in the page
//!
//! Elements are always re-resolved from their locator inside the snippet, so
//! no element handle outlives a single evaluation. A re-rendered table simply
//! resolves to the new node.

use super::{BrowserError, BrowserResult, Locator};
use serde::Deserialize;

/// Result of [`parent_has_class_script`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentClass {
    /// False when the element is not on the page
    pub found: bool,
    pub has_class: bool,
}

impl ParentClass {
    /// Whether the parent carries the class; a missing element is stale
    pub fn for_target(self, target: &Locator) -> BrowserResult<bool> {
        if self.found {
            Ok(self.has_class)
        } else {
            Err(BrowserError::Stale(target.to_string()))
        }
    }
}

/// Expression evaluating to the element, or null
fn resolve(target: &Locator) -> String {
    // serde_json produces a valid JS string literal with all escaping done
    let literal = serde_json::Value::String(target.expression().to_string()).to_string();
    match target {
        Locator::Css(_) => format!("document.querySelector({})", literal),
        Locator::XPath(_) => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            literal
        ),
    }
}

const VISIBLE_FN: &str = "const visible = (el) => { \
    const style = window.getComputedStyle(el); \
    const rect = el.getBoundingClientRect(); \
    return style.display !== 'none' && style.visibility !== 'hidden' \
        && (rect.width > 0 || rect.height > 0); };";

/// Evaluates to true when the element exists, is visible and not disabled
pub fn is_clickable_script(target: &Locator) -> String {
    format!(
        "(() => {{ {} const el = {}; return !!el && visible(el) && !el.disabled; }})()",
        VISIBLE_FN,
        resolve(target)
    )
}

/// Evaluates to true when the element is absent or invisible
pub fn is_hidden_script(target: &Locator) -> String {
    format!(
        "(() => {{ {} const el = {}; return !el || !visible(el); }})()",
        VISIBLE_FN,
        resolve(target)
    )
}

/// Clicks the element; evaluates to false when it cannot be found
pub fn click_script(target: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
        resolve(target)
    )
}

/// Evaluates to a [`ParentClass`] object telling whether the element exists
/// and whether its parent carries `class`
pub fn parent_has_class_script(target: &Locator, class: &str) -> String {
    let class = serde_json::Value::String(class.to_string()).to_string();
    format!(
        "(() => {{ const el = {}; if (!el) return {{ found: false, hasClass: false }}; \
         const parent = el.parentElement; \
         return {{ found: true, hasClass: !!parent && parent.classList.contains({}) }}; }})()",
        resolve(target),
        class
    )
}
