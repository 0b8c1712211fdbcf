use vpscale_syntax::{Atom, Call, Node, SwitchArm};

use super::{ACTIVE_BREAKPOINT_HELPER, CompileError, MEMO_HELPER, literal_token};
use crate::scaling::{ScalingEngine, with_unit};

const CALLEE: &str = "responsiveValue";

/// Compile `responsiveValue(value, { token })` into a memoized selector:
///
/// ```text
/// breakpointMemo(() => {
///   switch (currentBreakpoint().name) {
///     case "mobile": return "5px";
///     ...
///     default: return "24px";
///   }
/// })
/// ```
///
/// One arm per breakpoint name in declaration order; the default arm returns
/// the authored value with the same unit as the named arms.
pub fn compile(call: &Call, engine: &mut ScalingEngine) -> Result<Node, CompileError> {
    let value_node = call.args.first().ok_or(CompileError::MissingArgument {
        callee: CALLEE,
        index: 0,
    })?;
    let value = value_node.as_number().ok_or(CompileError::NotNumeric {
        callee: CALLEE,
        index: 0,
    })?;
    if !value.is_finite() {
        return Err(CompileError::NonFiniteLiteral(value));
    }

    let token = literal_token(call.args.get(1));
    let token = token.as_deref();
    let unit = engine.unit_for(token);

    let arms = engine
        .scale_for_all_breakpoints(value, token)
        .into_iter()
        .map(|(name, scaled)| arm(name, value, scaled, &unit))
        .collect::<Result<Vec<_>, _>>()?;

    let selector = Node::switch(
        Node::member(Node::call(ACTIVE_BREAKPOINT_HELPER, vec![]), "name"),
        arms,
        Node::string(with_unit(value, &unit)),
    );
    Ok(Node::call(MEMO_HELPER, vec![Node::arrow(selector)]))
}

fn arm(name: Atom, value: f64, scaled: f64, unit: &str) -> Result<SwitchArm, CompileError> {
    if !scaled.is_finite() {
        return Err(CompileError::NonFiniteResult {
            value,
            breakpoint: name,
        });
    }
    Ok(SwitchArm::named(name, Node::string(with_unit(scaled, unit))))
}
