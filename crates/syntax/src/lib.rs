pub mod atom;
pub mod build;
pub mod edit;
pub mod node;
pub mod print;

pub use atom::Atom;
pub use edit::{NodeEditor, SlotEditor, SourceLocation};
pub use node::{
    Binary, Call, Literal, Member, Node, ObjectMember, Property, PropertyKey, Switch, SwitchArm,
};
pub use print::format_number;
