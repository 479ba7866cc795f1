//! Raw (unresolved) parse structures and winnow combinators for the graph
//! text format.
//!
//! This module is the "stage 1" parser: text → `Raw*` structs. Names are
//! kept as borrowed slices; resolution happens in the builder.

use winnow::ascii;
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

// ============================================================================
// Error type
// ============================================================================

/// Parse error for the graph text format.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Raw (unresolved) AST structures
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct RawGraph<'a> {
    pub name: String,
    pub blocks: Vec<RawBlock<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawBlock<'a> {
    pub label: &'a str,
    pub successors: Vec<&'a str>,
    pub insts: Vec<RawInst<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawInst<'a> {
    pub result: Option<&'a str>,
    pub opcode: &'a str,
    pub immediate: Option<RawImmediate>,
    pub operands: Vec<RawOperand<'a>>,
    pub ty: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawImmediate {
    Int(i64),
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawOperand<'a> {
    Value(&'a str),
    /// `[%value, ^pred]`
    PhiInput(&'a str, &'a str),
}

// ============================================================================
// Winnow parsers
// ============================================================================

/// Skip whitespace, newlines and `//` line comments.
pub(crate) fn ws(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_ascii_whitespace())
            .void()
            .parse_next(input)?;
        if !input.starts_with("//") {
            return Ok(());
        }
        take_till(0.., '\n').void().parse_next(input)?;
    }
}

/// Skip spaces and tabs only; instructions end at the line break.
pub(crate) fn hspace(input: &mut &str) -> ModalResult<()> {
    take_while(0.., [' ', '\t']).void().parse_next(input)
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
pub(crate) fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Parse an opcode: an identifier with optional `.suffix` parts
/// (`cmp.lt`, `load.field`).
pub(crate) fn opcode<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (ident, repeat::<_, _, (), _, _>(0.., ('.', ident)))
        .take()
        .parse_next(input)
}

/// Parse a value reference: %name or %number
pub(crate) fn value_ref<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '%',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
    .parse_next(input)
}

/// Parse a block label: ^bbN or ^name
pub(crate) fn block_label<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '^',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
    .parse_next(input)
}

/// Parse a symbol reference: @name
pub(crate) fn symbol_ref(input: &mut &str) -> ModalResult<String> {
    preceded(
        '@',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    )
    .map(|s: &str| s.to_owned())
    .parse_next(input)
}

fn immediate(input: &mut &str) -> ModalResult<RawImmediate> {
    alt((
        ascii::dec_int.map(RawImmediate::Int),
        symbol_ref.map(RawImmediate::Symbol),
    ))
    .parse_next(input)
}

/// Parse a phi input: `[%v, ^bb]`
fn phi_input<'a>(input: &mut &'a str) -> ModalResult<RawOperand<'a>> {
    delimited(
        ('[', hspace),
        (
            terminated(value_ref, (hspace, ',', hspace)),
            terminated(block_label, hspace),
        ),
        ']',
    )
    .map(|(value, pred)| RawOperand::PhiInput(value, pred))
    .parse_next(input)
}

fn operand<'a>(input: &mut &'a str) -> ModalResult<RawOperand<'a>> {
    alt((value_ref.map(RawOperand::Value), phi_input)).parse_next(input)
}

/// Parse one instruction line:
/// `[%res =] opcode [immediate] [operand, ...] [: type]`
pub(crate) fn raw_inst<'a>(input: &mut &'a str) -> ModalResult<RawInst<'a>> {
    let result = opt(terminated(value_ref, (hspace, '=', hspace))).parse_next(input)?;
    let opcode = terminated(opcode, hspace).parse_next(input)?;
    let immediate = opt(terminated(immediate, hspace)).parse_next(input)?;
    let operands: Vec<RawOperand<'a>> =
        separated(0.., terminated(operand, hspace), (',', hspace)).parse_next(input)?;
    let ty = opt(preceded((':', hspace), ident)).parse_next(input)?;
    hspace.parse_next(input)?;
    Ok(RawInst {
        result,
        opcode,
        immediate,
        operands,
        ty,
    })
}

/// Parse a block: `^label [-> ^succ, ...]:` followed by its instructions.
pub(crate) fn raw_block<'a>(input: &mut &'a str) -> ModalResult<RawBlock<'a>> {
    let label = terminated(block_label, hspace).parse_next(input)?;
    let successors: Option<Vec<&'a str>> = opt(preceded(
        ("->", hspace),
        separated(1.., terminated(block_label, hspace), (',', hspace)),
    ))
    .parse_next(input)?;
    ':'.parse_next(input)?;
    ws.parse_next(input)?;
    let insts: Vec<RawInst<'a>> = repeat(0.., terminated(raw_inst, ws)).parse_next(input)?;
    Ok(RawBlock {
        label,
        successors: successors.unwrap_or_default(),
        insts,
    })
}

/// Parse a whole graph: `graph @name { blocks }`
pub(crate) fn raw_graph<'a>(input: &mut &'a str) -> ModalResult<RawGraph<'a>> {
    ("graph", ws).parse_next(input)?;
    let name = terminated(symbol_ref, ws).parse_next(input)?;
    ('{', ws).parse_next(input)?;
    let blocks: Vec<RawBlock<'a>> = repeat(0.., terminated(raw_block, ws)).parse_next(input)?;
    '}'.parse_next(input)?;
    Ok(RawGraph { name, blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_inst() {
        let inst = raw_inst.parse("%3 = cmp.lt %1, %2 : bool").unwrap();
        assert_eq!(inst.result, Some("3"));
        assert_eq!(inst.opcode, "cmp.lt");
        assert_eq!(inst.immediate, None);
        assert_eq!(
            inst.operands,
            vec![RawOperand::Value("1"), RawOperand::Value("2")]
        );
        assert_eq!(inst.ty, Some("bool"));
    }

    #[test]
    fn parse_immediates() {
        let inst = raw_inst.parse("%0 = const -5 : i64").unwrap();
        assert_eq!(inst.immediate, Some(RawImmediate::Int(-5)));

        let inst = raw_inst.parse("call @sink %4").unwrap();
        assert_eq!(inst.result, None);
        assert_eq!(inst.immediate, Some(RawImmediate::Symbol("sink".to_owned())));
        assert_eq!(inst.operands, vec![RawOperand::Value("4")]);
        assert_eq!(inst.ty, None);
    }

    #[test]
    fn parse_phi_inputs() {
        let inst = raw_inst.parse("%1 = phi [%0, ^bb0], [ %3 , ^bb2 ] : i32").unwrap();
        assert_eq!(
            inst.operands,
            vec![
                RawOperand::PhiInput("0", "bb0"),
                RawOperand::PhiInput("3", "bb2"),
            ]
        );
    }

    #[test]
    fn instructions_stop_at_line_break() {
        let block = raw_block
            .parse("^bb0 -> ^bb1:\n  goto\n")
            .unwrap();
        assert_eq!(block.successors, vec!["bb1"]);
        assert_eq!(block.insts.len(), 1);

        // `goto` must not swallow the value on the next line.
        let mut input = "^bb0:\n  goto\n  %1 = const 1 : i32\n^bb1:\n  return\n";
        let block = raw_block.parse_next(&mut input).unwrap();
        assert_eq!(block.insts.len(), 2);
        assert!(block.insts[0].operands.is_empty());
        assert!(input.starts_with("^bb1"));
    }

    #[test]
    fn comments_are_skipped() {
        let graph = raw_graph
            .parse("graph @f { // entry\n^bb0:\n  // nothing\n  return\n}")
            .unwrap();
        assert_eq!(graph.name, "f");
        assert_eq!(graph.blocks.len(), 1);
        assert_eq!(graph.blocks[0].insts[0].opcode, "return");
    }
}
