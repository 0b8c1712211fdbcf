use vpscale_syntax::{Call, Node, ObjectMember, Property, PropertyKey};

use super::{CompileError, STYLE_HELPER, infer_token};
use crate::scaling::{ScalingEngine, with_unit};

const CALLEE: &str = "responsiveStyle";

/// Compile `responsiveStyle({ ... })`: every numeric-literal property becomes
/// a per-breakpoint value map, everything else passes through.
///
/// ```text
/// responsiveStyle({ fontSize: 24, color: "red" })
///   ⇒ precomputedStyle({ fontSize: { mobile: "12px", ... }, color: "red" })
/// ```
pub fn compile(call: &Call, engine: &mut ScalingEngine) -> Result<Node, CompileError> {
    let members = call
        .args
        .first()
        .ok_or(CompileError::MissingArgument {
            callee: CALLEE,
            index: 0,
        })?
        .as_object()
        .ok_or(CompileError::NotAnObject { callee: CALLEE })?;

    let mut out = Vec::with_capacity(members.len());
    for member in members {
        let rewritten = match member {
            ObjectMember::Property(prop) => match (prop.value.as_number(), prop.key.literal_name()) {
                (Some(value), Some(name)) => ObjectMember::Property(Property {
                    key: prop.key.clone(),
                    value: value_map(engine, value, infer_token(&name))?,
                }),
                _ => member.clone(),
            },
            ObjectMember::Spread(_) => member.clone(),
        };
        out.push(rewritten);
    }

    Ok(Node::call(STYLE_HELPER, vec![Node::Object(out)]))
}

fn value_map(
    engine: &mut ScalingEngine,
    value: f64,
    token: Option<&str>,
) -> Result<Node, CompileError> {
    if !value.is_finite() {
        return Err(CompileError::NonFiniteLiteral(value));
    }
    let unit = engine.unit_for(token);
    let mut entries = Vec::new();
    for (name, scaled) in engine.scale_for_all_breakpoints(value, token) {
        if !scaled.is_finite() {
            return Err(CompileError::NonFiniteResult {
                value,
                breakpoint: name,
            });
        }
        entries.push(ObjectMember::Property(Property {
            key: PropertyKey::named(name),
            value: Node::string(with_unit(scaled, &unit)),
        }));
    }
    Ok(Node::Object(entries))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ResponsiveConfig;

    fn compile_object(object: Node) -> Result<Node, CompileError> {
        let mut engine = ScalingEngine::new(Arc::new(ResponsiveConfig::default()));
        let node = Node::call(CALLEE, vec![object]);
        let call = node.as_call().cloned().unwrap();
        compile(&call, &mut engine)
    }

    fn property<'a>(object: &'a Node, key: &str) -> &'a Node {
        object
            .as_object()
            .unwrap()
            .iter()
            .find_map(|m| match m {
                ObjectMember::Property(p) if p.key.literal_name().as_deref() == Some(key) => {
                    Some(&p.value)
                }
                _ => None,
            })
            .unwrap()
    }

    fn styles(node: &Node) -> &Node {
        assert_eq!(node.callee_name().unwrap(), &STYLE_HELPER);
        &node.as_call().unwrap().args[0]
    }

    #[test]
    fn numeric_properties_become_breakpoint_maps() {
        let node = compile_object(Node::object(vec![
            ("fontSize", Node::number(24.0)),
            ("paddingTop", Node::number(33.0)),
            ("borderRadius", Node::number(200.0)),
            ("width", Node::number(960.0)),
        ]))
        .unwrap();
        let styles = styles(&node);

        // Default config: mobile 390/1920, rounding to 0.5.
        let font = property(styles, "fontSize");
        assert_eq!(property(font, "mobile"), &Node::string("12px"));
        assert_eq!(property(font, "desktop"), &Node::string("24px"));

        // 33 * 0.203125 = 6.703125, step 2 → 6.
        let padding = property(styles, "paddingTop");
        assert_eq!(property(padding, "mobile"), &Node::string("6px"));

        // Radius clamps to 32 except on the identity breakpoint.
        let radius = property(styles, "borderRadius");
        assert_eq!(property(radius, "tablet"), &Node::string("32px"));
        assert_eq!(property(radius, "desktop"), &Node::string("200px"));

        // No token: plain ratio. 960 * 0.4 = 384.
        let width = property(styles, "width");
        assert_eq!(property(width, "tablet"), &Node::string("384px"));
    }

    #[test]
    fn non_numeric_properties_pass_through() {
        let node = compile_object(Node::object(vec![
            ("color", Node::string("red")),
            ("margin", Node::ident("gutter")),
            ("fontSize", Node::number(16.0)),
        ]))
        .unwrap();
        let styles = styles(&node);
        assert_eq!(property(styles, "color"), &Node::string("red"));
        assert_eq!(property(styles, "margin"), &Node::ident("gutter"));
        assert!(property(styles, "fontSize").as_object().is_some());
    }

    #[test]
    fn property_order_and_keys_preserved() {
        let object = Node::Object(vec![
            ObjectMember::Property(Property {
                key: PropertyKey::String("line-height".into()),
                value: Node::number(20.0),
            }),
            ObjectMember::Property(Property {
                key: PropertyKey::Identifier("gap".into()),
                value: Node::number(8.0),
            }),
        ]);
        let node = compile_object(object).unwrap();
        let members = styles(&node).as_object().unwrap();
        let keys: Vec<_> = members
            .iter()
            .map(|m| match m {
                ObjectMember::Property(p) => p.key.clone(),
                ObjectMember::Spread(_) => panic!("unexpected spread"),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                PropertyKey::String("line-height".into()),
                PropertyKey::Identifier("gap".into()),
            ]
        );
    }

    #[test]
    fn non_finite_property_fails_whole_call() {
        let err = compile_object(Node::object(vec![("gap", Node::number(f64::NAN))])).unwrap_err();
        assert!(matches!(err, CompileError::NonFiniteLiteral(v) if v.is_nan()));
    }

    #[test]
    fn non_object_argument_fails() {
        assert_eq!(
            compile_object(Node::ident("styles")),
            Err(CompileError::NotAnObject { callee: CALLEE })
        );
    }
}
