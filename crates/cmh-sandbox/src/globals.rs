use std::cell::RefCell;
use std::rc::Rc;

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Undefined, Value};

use crate::context::ExecState;
use crate::convert::format_log_line;

/// Global names that must resolve to `undefined` inside the sandbox:
/// host introspection, module loading, dynamic code evaluation, timers,
/// network entry points, binary buffers and shared-memory primitives.
///
/// The engine links some of these, and a global object is always reachable
/// by name, so each is shadowed with an explicit undefined binding instead
/// of relying on the context omitting it.
pub(crate) const DENIED_GLOBALS: &[&str] = &[
    "process",
    "require",
    "module",
    "global",
    "globalThis",
    "self",
    "window",
    "eval",
    "Function",
    "setTimeout",
    "setInterval",
    "setImmediate",
    "clearTimeout",
    "clearInterval",
    "queueMicrotask",
    "fetch",
    "XMLHttpRequest",
    "WebSocket",
    "Worker",
    "Buffer",
    "ArrayBuffer",
    "SharedArrayBuffer",
    "Atomics",
    "DataView",
    "Uint8Array",
    "Int8Array",
    "Uint8ClampedArray",
    "Uint16Array",
    "Int16Array",
    "Uint32Array",
    "Int32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
    "WebAssembly",
];

pub(crate) fn install_denied_sentinels(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    for name in DENIED_GLOBALS {
        globals.set(*name, Undefined)?;
    }
    Ok(())
}

/// `console.log` / `warn` / `error`, each appending one formatted line to
/// the run's log buffer. Nothing reaches the host's stdio.
pub(crate) fn install_console<'js>(
    ctx: &Ctx<'js>,
    state: Rc<RefCell<ExecState>>,
) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    for method in ["log", "warn", "error"] {
        let state = state.clone();
        console.set(
            method,
            Function::new(
                ctx.clone(),
                move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
                    let line = format_log_line(&ctx, &args.0);
                    state.borrow_mut().push_log(line);
                },
            )?,
        )?;
    }
    ctx.globals().set("console", console)?;
    Ok(())
}
