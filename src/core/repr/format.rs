//! Source-like rendering and structural dumps of `TypeRepr`.

use std::fmt::Write;

use crate::core::repr::model::{
    IdentRepr, MetatypeKind, TupleElementRepr, TupleRepr, TypeRepr, TypeReprKind,
};

pub fn render_type(ty: &TypeRepr) -> String {
    let mut out = String::new();
    render_into(ty, &mut out);
    out
}

fn render_ident(ident: &IdentRepr, out: &mut String) {
    out.push_str(&ident.name);
    if let Some(generic_args) = &ident.generic_args {
        out.push('<');
        for (i, arg) in generic_args.args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            render_into(arg, out);
        }
        out.push('>');
    }
}

fn render_tuple(tuple: &TupleRepr, out: &mut String) {
    out.push('(');
    for (i, elem) in tuple.elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_tuple_element(elem, out);
    }
    out.push(')');
}

fn render_tuple_element(elem: &TupleElementRepr, out: &mut String) {
    match (&elem.first_name, &elem.second_name) {
        (Some((first, _)), Some((second, _))) => {
            let _ = write!(out, "{first} {second}: ");
        }
        (Some((first, _)), None) => {
            let _ = write!(out, "{first}: ");
        }
        _ => {}
    }
    render_into(&elem.ty, out);
}

fn render_into(ty: &TypeRepr, out: &mut String) {
    match &ty.kind {
        TypeReprKind::Ident(ident) => render_ident(ident, out),
        TypeReprKind::Member { base, components } => {
            render_into(base, out);
            for component in components {
                out.push('.');
                render_ident(component, out);
            }
        }
        TypeReprKind::Array { elem, .. } => {
            out.push('[');
            render_into(elem, out);
            out.push(']');
        }
        TypeReprKind::Dictionary { key, value, .. } => {
            out.push('[');
            render_into(key, out);
            out.push_str(": ");
            render_into(value, out);
            out.push(']');
        }
        TypeReprKind::Tuple(tuple) => render_tuple(tuple, out),
        TypeReprKind::Function {
            params,
            async_span,
            throws_span,
            thrown,
            result,
            ..
        } => {
            render_tuple(params, out);
            if async_span.is_some() {
                out.push_str(" async");
            }
            if throws_span.is_some() {
                out.push_str(" throws");
                if let Some(thrown) = thrown {
                    out.push('(');
                    render_into(thrown, out);
                    out.push(')');
                }
            }
            out.push_str(" -> ");
            render_into(result, out);
        }
        TypeReprKind::Optional { base, .. } => {
            render_into(base, out);
            out.push('?');
        }
        TypeReprKind::ImplicitlyUnwrapped { base, .. } => {
            render_into(base, out);
            out.push('!');
        }
        TypeReprKind::Metatype { base, meta, .. } => {
            render_into(base, out);
            out.push_str(match meta {
                MetatypeKind::Type => ".Type",
                MetatypeKind::Protocol => ".Protocol",
            });
        }
        TypeReprKind::Composition { members } => {
            if members.is_empty() {
                out.push_str("Any");
            }
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(" & ");
                }
                render_into(member, out);
            }
        }
        TypeReprKind::Opaque { constraint, .. } => {
            out.push_str("some ");
            render_into(constraint, out);
        }
        TypeReprKind::Existential { constraint, .. } => {
            out.push_str("any ");
            render_into(constraint, out);
        }
        TypeReprKind::Inverse { constraint, .. } => {
            out.push('~');
            render_into(constraint, out);
        }
        TypeReprKind::PackElement { pack, .. } => {
            out.push_str("each ");
            render_into(pack, out);
        }
        TypeReprKind::PackExpansion { pattern, .. } => {
            out.push_str("repeat ");
            render_into(pattern, out);
        }
        TypeReprKind::Vararg { elem, .. } => {
            render_into(elem, out);
            out.push_str("...");
        }
        TypeReprKind::Specifier {
            base, specifier, ..
        } => {
            out.push_str(specifier.as_str());
            out.push(' ');
            render_into(base, out);
        }
        TypeReprKind::Attributed { base, attrs } => {
            for attr in attrs {
                let _ = write!(out, "@{} ", attr.kind.name());
            }
            render_into(base, out);
        }
        TypeReprKind::Error => out.push_str("<<error>>"),
    }
}

/// Indented structural dump, one node per line with its span.
pub fn dump_type(ty: &TypeRepr) -> String {
    let mut out = String::new();
    dump_into(ty, 0, &mut out);
    out
}

fn line(out: &mut String, depth: usize, text: impl AsRef<str>) {
    let _ = writeln!(out, "{}{}", "  ".repeat(depth), text.as_ref());
}

fn dump_ident(ident: &IdentRepr, depth: usize, out: &mut String) {
    line(out, depth, format!("Ident {} @{}", ident.name, ident.name_span));
    if let Some(generic_args) = &ident.generic_args {
        for arg in &generic_args.args {
            dump_into(arg, depth + 1, out);
        }
    }
}

fn dump_into(ty: &TypeRepr, depth: usize, out: &mut String) {
    match &ty.kind {
        TypeReprKind::Ident(ident) => dump_ident(ident, depth, out),
        TypeReprKind::Member { base, components } => {
            line(out, depth, format!("Member @{}", ty.span));
            dump_into(base, depth + 1, out);
            for component in components {
                dump_ident(component, depth + 1, out);
            }
        }
        TypeReprKind::Tuple(tuple) => {
            line(out, depth, format!("Tuple @{}", ty.span));
            for elem in &tuple.elements {
                if let Some((name, _)) = &elem.first_name {
                    line(out, depth + 1, format!("label {name}"));
                }
                dump_into(&elem.ty, depth + 1, out);
            }
        }
        TypeReprKind::Function { params, result, .. } => {
            line(out, depth, format!("Function @{}", ty.span));
            for elem in &params.elements {
                dump_into(&elem.ty, depth + 1, out);
            }
            dump_into(result, depth + 1, out);
        }
        TypeReprKind::Composition { members } if members.is_empty() => {
            line(out, depth, format!("Any @{}", ty.span));
        }
        _ => line(out, depth, format!("{} @{}", render_type(ty), ty.span)),
    }
}
