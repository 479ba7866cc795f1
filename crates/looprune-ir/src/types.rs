//! Result types of instructions.

use derive_more::Display;

/// The type of the value an instruction produces.
///
/// `Void` marks instructions that produce no value at all.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Type {
    #[display("void")]
    Void,
    #[display("bool")]
    Bool,
    #[display("i32")]
    I32,
    #[display("i64")]
    I64,
    #[display("ref")]
    Ref,
}

impl Type {
    /// Parse a type name as printed by `Display`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "void" => Some(Type::Void),
            "bool" => Some(Type::Bool),
            "i32" => Some(Type::I32),
            "i64" => Some(Type::I64),
            "ref" => Some(Type::Ref),
            _ => None,
        }
    }

    pub fn is_void(self) -> bool {
        self == Type::Void
    }
}
