//! Spelling scalars as source text.

use super::{AliasTable, Kind, Type};

/// Spells a finite float of kind `kind` so that it parses back exactly.
fn numeral(x: f64, kind: Kind) -> String {
    if kind == Kind::Float32 { format!("{:?}", x as f32) } else { format!("{:?}", x) }
}

/// Returns `true` if `x` can be written as a constant without losing anything.
///
/// Constants cannot be infinite or NaN, and a constant `-0` is just `0`.
fn is_plain(x: f64) -> bool { x.is_finite() && !(x == 0.0 && x.is_sign_negative()) }

/// Spells `x` as an expression of float type `type_`.
pub fn float(x: f64, type_: &Type, table: &mut AliasTable) -> String {
    if x.is_nan() {
        table.require("math");
        format!("{}(math.NaN())", type_)
    } else if x.is_infinite() {
        table.require("math");
        format!("{}(math.Inf({}))", type_, if x > 0.0 { 1 } else { -1 })
    } else if !is_plain(x) {
        // Negating a variable, unlike a constant, keeps the sign of zero.
        format!("-[]{}{{0}}[0]", type_)
    } else {
        numeral(x, type_.kind())
    }
}

/// Spells `re + im*i` as an expression of complex type `type_`.
pub fn complex(re: f64, im: f64, type_: &Type, table: &mut AliasTable) -> String {
    let part = if type_.kind() == Kind::Complex64 { Type::Float32 } else { Type::Float64 };
    if is_plain(re) && is_plain(im) {
        let sign = if im.is_sign_negative() { '-' } else { '+' };
        format!("({}{}{}i)", numeral(re, part.kind()), sign, numeral(im.abs(), part.kind()))
    } else {
        let re = float(re, &part, table);
        let im = float(im, &part, table);
        format!("{}(complex({}, {}))", type_, re, im)
    }
}

/// Returns `true` if `c` can appear unescaped in a quoted string.
fn is_printable(c: char) -> bool { c == ' ' || !(c.is_control() || c.is_whitespace()) }

/// Spells `s` as a double-quoted string literal.
pub fn quote(s: &str) -> String {
    let mut ret = String::with_capacity(s.len() + 2);
    ret.push('"');
    for c in s.chars() {
        match c {
            '\u{7}' => ret.push_str("\\a"),
            '\u{8}' => ret.push_str("\\b"),
            '\u{c}' => ret.push_str("\\f"),
            '\n' => ret.push_str("\\n"),
            '\r' => ret.push_str("\\r"),
            '\t' => ret.push_str("\\t"),
            '\u{b}' => ret.push_str("\\v"),
            '\\' => ret.push_str("\\\\"),
            '"' => ret.push_str("\\\""),
            c if is_printable(c) => ret.push(c),
            c if (c as u32) < 0x80 => ret.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) < 0x10000 => ret.push_str(&format!("\\u{:04x}", c as u32)),
            c => ret.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    ret.push('"');
    ret
}

// ----------------------------------------------------------------------------
