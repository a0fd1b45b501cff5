//! In-page scripts used by the default `PageDriver::dom` implementation.
//!
//! Everything runs through direct DOM access: no pointer simulation, so overlays and
//! off-screen positioning cannot block a click. Handlers that only react to real
//! pointer events are not exercised.

/// `arguments[0]` is a serialized `Locator`, `arguments[1]` a serialized `DomOp`.
/// Returns `{found, done}`.
pub const DOM_SCRIPT: &str = r#"
const locator = arguments[0];
const op = arguments[1];

const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();

function resolve(loc) {
    if (typeof loc !== 'object' || loc === null) return null;
    if ('css' in loc) {
        return document.querySelector(loc.css);
    }
    if ('text' in loc) {
        const { tag, contains } = loc.text;
        for (const el of document.querySelectorAll(tag || '*')) {
            if (norm(el.textContent).includes(contains)) return el;
        }
        return null;
    }
    if ('attribute' in loc) {
        const { tag, name, value } = loc.attribute;
        for (const el of document.querySelectorAll(tag || '*')) {
            if (el.getAttribute(name) === value) return el;
        }
        return null;
    }
    if ('label' in loc) {
        for (const label of document.querySelectorAll('label')) {
            if (!norm(label.textContent).includes(loc.label)) continue;
            const target = label.control
                || (label.htmlFor ? document.getElementById(label.htmlFor) : null)
                || label.querySelector('input, select, textarea');
            if (target) return target;
        }
        return null;
    }
    return null;
}

function isVisible(el) {
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
}

function fire(el) {
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
}

const el = resolve(locator);
if (!el) return { found: false, done: false };

switch (op.op) {
    case 'probe':
        return { found: true, done: true };
    case 'visible':
        return { found: true, done: isVisible(el) };
    case 'click':
        if (el.disabled) return { found: true, done: false };
        el.scrollIntoView({ block: 'center' });
        el.click();
        return { found: true, done: true };
    case 'check':
        if (el.disabled) return { found: true, done: false };
        el.scrollIntoView({ block: 'center' });
        if (!el.checked) {
            el.checked = true;
            fire(el);
        }
        return { found: true, done: !!el.checked };
    case 'set_value':
        if (el.disabled) return { found: true, done: false };
        el.scrollIntoView({ block: 'center' });
        el.value = op.value;
        fire(el);
        return { found: true, done: true };
    default:
        return { found: true, done: false };
}
"#;

pub const READY_STATE_SCRIPT: &str = "return document.readyState;";
