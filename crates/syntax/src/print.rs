//! Source printer. Renders nodes as JavaScript expression text, used for
//! cache keys when the host does not supply the original snippet and for
//! diagnostics.

use std::fmt::{self, Write};

use crate::node::{Literal, Node, ObjectMember, PropertyKey, Switch};

const INDENT: &str = "  ";

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => write_quoted(f, s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Format a number the way JavaScript's `String(n)` does: integral values
/// without a fractional part, `0` for negative zero, spelled-out non-finite
/// names, and exponent form (`1e+21`, `1.5e-7`) outside `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else {
        n.to_string()
    }
}

fn write_quoted(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn pad(f: &mut impl Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Node], depth: usize) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_node(f, item, depth)?;
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    match node {
        Node::Literal(lit) => write!(f, "{lit}"),
        Node::Identifier(name) => f.write_str(name),
        Node::Raw(text) => f.write_str(text),
        Node::Call(call) => {
            if matches!(call.callee.as_ref(), Node::Arrow(_) | Node::Binary(_)) {
                f.write_char('(')?;
                write_node(f, &call.callee, depth)?;
                f.write_char(')')?;
            } else {
                write_node(f, &call.callee, depth)?;
            }
            f.write_char('(')?;
            write_list(f, &call.args, depth)?;
            f.write_char(')')
        }
        Node::Member(member) => {
            write_node(f, &member.object, depth)?;
            write!(f, ".{}", member.property)
        }
        Node::Array(items) => {
            f.write_char('[')?;
            write_list(f, items, depth)?;
            f.write_char(']')
        }
        Node::Object(members) => write_object(f, members, depth),
        Node::Binary(bin) => {
            write_operand(f, &bin.left, depth)?;
            write!(f, " {} ", bin.op)?;
            write_operand(f, &bin.right, depth)
        }
        Node::Arrow(body) => match body.as_ref() {
            Node::Switch(switch) => {
                f.write_str("() => {\n")?;
                write_switch(f, switch, depth + 1)?;
                f.write_char('\n')?;
                pad(f, depth)?;
                f.write_char('}')
            }
            Node::Object(_) => {
                f.write_str("() => (")?;
                write_node(f, body, depth)?;
                f.write_char(')')
            }
            other => {
                f.write_str("() => ")?;
                write_node(f, other, depth)
            }
        },
        // A bare selector in expression position becomes an IIFE.
        Node::Switch(switch) => {
            f.write_str("(() => {\n")?;
            write_switch(f, switch, depth + 1)?;
            f.write_char('\n')?;
            pad(f, depth)?;
            f.write_str("})()")
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    if matches!(node, Node::Binary(_) | Node::Arrow(_)) {
        f.write_char('(')?;
        write_node(f, node, depth)?;
        f.write_char(')')
    } else {
        write_node(f, node, depth)
    }
}

fn write_object(f: &mut fmt::Formatter<'_>, members: &[ObjectMember], depth: usize) -> fmt::Result {
    if members.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{ ")?;
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match member {
            ObjectMember::Spread(node) => {
                f.write_str("...")?;
                write_node(f, node, depth)?;
            }
            ObjectMember::Property(prop) => {
                match &prop.key {
                    PropertyKey::Identifier(name) => f.write_str(name)?,
                    PropertyKey::String(name) => write_quoted(f, name)?,
                    PropertyKey::Number(n) => f.write_str(&format_number(*n))?,
                    PropertyKey::Computed(expr) => {
                        f.write_char('[')?;
                        write_node(f, expr, depth)?;
                        f.write_char(']')?;
                    }
                }
                f.write_str(": ")?;
                write_node(f, &prop.value, depth)?;
            }
        }
    }
    f.write_str(" }")
}

fn write_switch(f: &mut fmt::Formatter<'_>, switch: &Switch, depth: usize) -> fmt::Result {
    pad(f, depth)?;
    f.write_str("switch (")?;
    write_node(f, &switch.discriminant, depth)?;
    f.write_str(") {\n")?;
    for arm in &switch.arms {
        pad(f, depth + 1)?;
        write!(f, "case {}: return ", arm.test)?;
        write_node(f, &arm.value, depth + 1)?;
        f.write_str(";\n")?;
    }
    pad(f, depth + 1)?;
    f.write_str("default: return ")?;
    write_node(f, &switch.default, depth + 1)?;
    f.write_str(";\n")?;
    pad(f, depth)?;
    f.write_char('}')
}

#[cfg(test)]
mod tests {
    use crate::node::{Node, SwitchArm};

    #[test]
    fn numbers_print_like_javascript() {
        assert_eq!(super::format_number(24.0), "24");
        assert_eq!(super::format_number(4.5), "4.5");
        assert_eq!(super::format_number(-0.0), "0");
        assert_eq!(super::format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn exponent_form_outside_plain_range() {
        assert_eq!(super::format_number(1e21), "1e+21");
        assert_eq!(super::format_number(-2.5e22), "-2.5e+22");
        assert_eq!(super::format_number(1e-7), "1e-7");
        assert_eq!(super::format_number(1.5e-7), "1.5e-7");
        assert_eq!(super::format_number(0.000001), "0.000001");
        assert_eq!(super::format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn prints_call_with_options_object() {
        let node = Node::call(
            "responsiveValue",
            vec![
                Node::number(24.0),
                Node::object(vec![("token", Node::string("fontSize"))]),
            ],
        );
        assert_eq!(
            node.to_string(),
            r#"responsiveValue(24, { token: "fontSize" })"#
        );
    }

    #[test]
    fn prints_memoized_selector() {
        let selector = Node::switch(
            Node::member(Node::call("currentBreakpoint", vec![]), "name"),
            vec![
                SwitchArm::named("mobile", Node::string("5px")),
                SwitchArm::named("tablet", Node::string("9.5px")),
            ],
            Node::string("24px"),
        );
        let node = Node::call("breakpointMemo", vec![Node::arrow(selector)]);
        let expected = "breakpointMemo(() => {\n  switch (currentBreakpoint().name) {\n    case \"mobile\": return \"5px\";\n    case \"tablet\": return \"9.5px\";\n    default: return \"24px\";\n  }\n})";
        assert_eq!(node.to_string(), expected);
    }

    #[test]
    fn nested_binary_operands_are_parenthesized() {
        let node = Node::binary(
            "*",
            Node::binary("+", Node::ident("a"), Node::number(1.0)),
            Node::number(2.0),
        );
        assert_eq!(node.to_string(), "(a + 1) * 2");
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(Node::string("a\"b\n").to_string(), r#""a\"b\n""#);
    }
}
