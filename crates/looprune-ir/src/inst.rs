//! Instruction kinds and their capability queries.
//!
//! The set of kinds is closed: every property an optimization needs
//! (side effects, throwing, relocatability, control flow) is answered by
//! a method on [`InstKind`] rather than by inspecting the kind at each
//! call site.

use derive_more::Display;

/// Arithmetic operators that never trap.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    #[display("add")]
    Add,
    #[display("sub")]
    Sub,
    #[display("mul")]
    Mul,
}

/// Comparison predicates.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum CmpOp {
    #[display("lt")]
    Lt,
    #[display("le")]
    Le,
    #[display("gt")]
    Gt,
    #[display("ge")]
    Ge,
    #[display("eq")]
    Eq,
    #[display("ne")]
    Ne,
}

impl CmpOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lt" => Some(CmpOp::Lt),
            "le" => Some(CmpOp::Le),
            "gt" => Some(CmpOp::Gt),
            "ge" => Some(CmpOp::Ge),
            "eq" => Some(CmpOp::Eq),
            "ne" => Some(CmpOp::Ne),
            _ => None,
        }
    }
}

/// What an instruction does.
///
/// Operand conventions:
/// - `Binary`, `Div`, `Compare`: `[lhs, rhs]`
/// - `LoadField`: `[object]`
/// - `StoreField`: `[object, value]`
/// - `BoundsCheck`: `[index, length]`, produces the checked index
/// - `If`: `[condition]`, first successor is the taken edge
/// - `Return`: `[]` or `[value]`
/// - `Throw`: `[exception]`
/// - `Phi`: one input per predecessor of the owning block, in order
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstKind {
    Const(i64),
    Param(u32),
    Binary(BinaryOp),
    Div,
    Compare(CmpOp),
    LoadField(u32),
    StoreField(u32),
    Call(String),
    BoundsCheck,
    SuspendCheck,
    Goto,
    If,
    Return,
    Throw,
    Phi,
}

impl InstKind {
    /// Writes memory or calls out of the method.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self,
            InstKind::StoreField(_) | InstKind::Call(_) | InstKind::SuspendCheck
        )
    }

    pub fn can_throw(&self) -> bool {
        matches!(
            self,
            InstKind::Div | InstKind::Call(_) | InstKind::BoundsCheck | InstKind::Throw
        )
    }

    /// Whether the instruction may be moved to another block (or dropped
    /// together with its block) without changing program behavior.
    pub fn can_relocate(&self) -> bool {
        matches!(
            self,
            InstKind::Const(_)
                | InstKind::Binary(_)
                | InstKind::Div
                | InstKind::Compare(_)
                | InstKind::LoadField(_)
                | InstKind::BoundsCheck
        )
    }

    /// Runtime bookkeeping with no program-visible effect.
    pub fn is_barrier(&self) -> bool {
        matches!(self, InstKind::SuspendCheck)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Goto | InstKind::If | InstKind::Return | InstKind::Throw
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi)
    }

    /// Whether the instruction can be deleted once nothing uses its result.
    pub fn is_removable_if_unused(&self) -> bool {
        !self.has_side_effects()
            && !self.can_throw()
            && !self.is_terminator()
            && !self.is_barrier()
            && !matches!(self, InstKind::Param(_))
    }

    /// Text-format opcode, without immediates.
    pub fn mnemonic(&self) -> String {
        match self {
            InstKind::Const(_) => "const".to_owned(),
            InstKind::Param(_) => "param".to_owned(),
            InstKind::Binary(op) => op.to_string(),
            InstKind::Div => "div".to_owned(),
            InstKind::Compare(op) => format!("cmp.{op}"),
            InstKind::LoadField(_) => "load.field".to_owned(),
            InstKind::StoreField(_) => "store.field".to_owned(),
            InstKind::Call(_) => "call".to_owned(),
            InstKind::BoundsCheck => "bounds_check".to_owned(),
            InstKind::SuspendCheck => "suspend_check".to_owned(),
            InstKind::Goto => "goto".to_owned(),
            InstKind::If => "if".to_owned(),
            InstKind::Return => "return".to_owned(),
            InstKind::Throw => "throw".to_owned(),
            InstKind::Phi => "phi".to_owned(),
        }
    }
}
