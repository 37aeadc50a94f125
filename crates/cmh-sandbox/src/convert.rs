use rquickjs::{Ctx, Type, Value};

/// Serialize a JS value through the engine's JSON codec into plain data.
///
/// `undefined` normalizes to JSON null. Returns `None` when the value has no
/// JSON representation (functions, symbols, cyclic graphs).
pub(crate) fn js_value_to_json<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> Option<serde_json::Value> {
    if value.is_undefined() || value.is_null() {
        return Some(serde_json::Value::Null);
    }
    let text = ctx.json_stringify(value.clone()).ok()??;
    let text = text.to_string().ok()?;
    serde_json::from_str(&text).ok()
}

/// Parse plain JSON into a JS value inside the context.
pub(crate) fn json_to_js_value<'js>(
    ctx: &Ctx<'js>,
    value: &serde_json::Value,
) -> rquickjs::Result<Value<'js>> {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(_) => "null".to_string(),
    };
    ctx.json_parse(text)
}

/// Render one console/log argument: primitives via their usual textual
/// conversion, compound values via the JSON codec with a generic tag
/// fallback for unserializable graphs.
pub(crate) fn format_js_value<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    match value.type_of() {
        Type::Undefined => "undefined".to_string(),
        Type::Null => "null".to_string(),
        Type::Bool => value
            .as_bool()
            .map(|b| b.to_string())
            .unwrap_or_default(),
        Type::Int => value.as_int().map(|n| n.to_string()).unwrap_or_default(),
        Type::Float => value
            .as_float()
            .map(format_js_number)
            .unwrap_or_default(),
        Type::String => value
            .as_string()
            .and_then(|s| s.to_string().ok())
            .unwrap_or_default(),
        Type::Symbol => "Symbol()".to_string(),
        Type::Function | Type::Constructor => "[function]".to_string(),
        _ => match ctx.json_stringify(value.clone()) {
            Ok(Some(text)) => text.to_string().unwrap_or_else(|_| "[object]".to_string()),
            _ => "[object]".to_string(),
        },
    }
}

/// Integral doubles print without a trailing `.0`, matching JS semantics.
fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Variadic console arguments joined by a single space.
pub(crate) fn format_log_line<'js>(ctx: &Ctx<'js>, args: &[Value<'js>]) -> String {
    args.iter()
        .map(|value| format_js_value(ctx, value))
        .collect::<Vec<_>>()
        .join(" ")
}
