// src/serialize.rs
//
// Serialization of the elaborated model as a tree of name/value pairs.
// Symbols emit their kind, name, type, location, and kind-specific
// fields; integer constants serialize as {width, signed, four_state,
// bits}.

use serde_json::{json, Map, Value};
use sylva_numeric::{ConstantValue, SVInt};
use sylva_sema::symbols::{ScopeId, SymbolId, SymbolKind};
use sylva_sema::Compilation;

/// Serializes the compilation's elaborated model, rooted at the
/// compilation unit.
pub fn to_json(comp: &Compilation) -> Value {
    json!({
        "kind": "compilation unit",
        "name": "$unit",
        "members": scope_members(comp, comp.unit_scope()),
    })
}

fn scope_members(comp: &Compilation, scope: ScopeId) -> Value {
    let members: Vec<Value> = comp
        .scope_members(scope)
        .into_iter()
        .map(|id| symbol_to_json(comp, id))
        .collect();
    Value::Array(members)
}

fn symbol_to_json(comp: &Compilation, id: SymbolId) -> Value {
    let sym = comp.symbol(id);
    let mut out = Map::new();
    out.insert("kind".into(), sym.kind.name().into());
    out.insert("name".into(), sym.name.clone().into());
    if let Some(sm) = comp.source_manager() {
        if let (Some(file), Some(line)) = (sm.get_file_name(sym.loc), sm.get_line_number(sym.loc))
        {
            out.insert("file".into(), file.into());
            out.insert("line".into(), (line as u64).into());
        }
    }

    match &sym.kind {
        SymbolKind::Parameter { is_local, .. } => {
            out.insert("local".into(), (*is_local).into());
            let ty = comp.symbol_type(id);
            out.insert("type".into(), comp.type_display(ty).into());
            out.insert("value".into(), constant_to_json(&comp.parameter_value(id)));
        }
        SymbolKind::Variable { is_const, .. } => {
            out.insert("const".into(), (*is_const).into());
            let ty = comp.symbol_type(id);
            out.insert("type".into(), comp.type_display(ty).into());
        }
        SymbolKind::Net { .. } | SymbolKind::Typedef { .. } | SymbolKind::EnumValue { .. } => {
            let ty = comp.symbol_type(id);
            out.insert("type".into(), comp.type_display(ty).into());
            if let SymbolKind::EnumValue { value, .. } = &sym.kind {
                out.insert("value".into(), svint_to_json(value));
            }
        }
        SymbolKind::Subroutine { is_task, flags, .. } => {
            let ret = comp.subroutine_return_type(id);
            out.insert("task".into(), (*is_task).into());
            out.insert("returnType".into(), comp.type_display(ret).into());
            if flags.is_virtual {
                out.insert("virtual".into(), true.into());
            }
            if flags.is_static {
                out.insert("static".into(), true.into());
            }
            let visibility = if flags.is_local {
                "local"
            } else if flags.is_protected {
                "protected"
            } else {
                "public"
            };
            out.insert("visibility".into(), visibility.into());
            let args: Vec<Value> = comp
                .subroutine_args(id)
                .into_iter()
                .map(|arg| symbol_to_json(comp, arg))
                .collect();
            out.insert("arguments".into(), Value::Array(args));
        }
        SymbolKind::FormalArgument { direction, .. } => {
            let ty = comp.symbol_type(id);
            out.insert("type".into(), comp.type_display(ty).into());
            out.insert("direction".into(), format!("{direction:?}").to_lowercase().into());
        }
        SymbolKind::Instance { definition_name, .. } => {
            out.insert("definition".into(), definition_name.clone().into());
            if let Some(body) = comp.symbol_scope(id) {
                out.insert("body".into(), scope_members(comp, body));
            }
        }
        SymbolKind::Package { .. } | SymbolKind::Class { .. } | SymbolKind::GenerateBlock { .. } => {
            if let Some(scope) = comp.symbol_scope(id) {
                out.insert("members".into(), scope_members(comp, scope));
            }
        }
        _ => {}
    }

    Value::Object(out)
}

fn constant_to_json(value: &ConstantValue) -> Value {
    match value {
        ConstantValue::Invalid => json!({ "error": true }),
        ConstantValue::Int(v) => svint_to_json(v),
        ConstantValue::Real(v) => json!(v),
        ConstantValue::ShortReal(v) => json!(v),
        ConstantValue::Str(s) => json!(s),
        ConstantValue::Null => Value::Null,
        ConstantValue::Unbounded => json!("$"),
        ConstantValue::Array(elems) | ConstantValue::Queue(elems) => {
            Value::Array(elems.iter().map(constant_to_json).collect())
        }
        ConstantValue::Assoc(entries) => Value::Array(
            entries
                .iter()
                .map(|(k, v)| json!({ "key": constant_to_json(k), "value": constant_to_json(v) }))
                .collect(),
        ),
        ConstantValue::Struct(fields) => {
            Value::Array(fields.iter().map(constant_to_json).collect())
        }
    }
}

fn svint_to_json(v: &SVInt) -> Value {
    json!({
        "width": v.width(),
        "signed": v.is_signed(),
        "four_state": v.has_unknown(),
        "bits": v.to_bit_string(),
    })
}
