//! Rendering of syntax trees back to script text.
//!
//! A tree serializes under any notation, not just the one it was parsed
//! with; constructs the target notation does not support are written as
//! their expansion. Re-parsing the output under the same notation yields
//! a tree with the same expansion as the original.

use cubescript_notation::{Move, Notation, Symbol, Syntax};

use crate::ast::{CORNER_FACES, EDGE_FACES, Leaf, Node, NodeKind, PartFamily, PermutationCycle};
use crate::error::PrintError;

impl Node {
    /// Renders the subtree as script text under the given notation.
    pub fn serialize(&self, notation: &Notation) -> Result<String, PrintError> {
        let mut printer = Printer {
            notation,
            out: String::new(),
        };
        printer.write_node(self)?;
        Ok(printer.out)
    }
}

struct Printer<'n> {
    notation: &'n Notation,
    out: String,
}

/// The begin/end/delimiter/operator token roles of a binary composite.
fn begin_symbol(composite: Symbol) -> Symbol {
    match composite {
        Symbol::Commutation => Symbol::CommutationBegin,
        Symbol::Rotation => Symbol::RotationBegin,
        _ => Symbol::ConjugationBegin,
    }
}

fn end_symbol(composite: Symbol) -> Symbol {
    match composite {
        Symbol::Commutation => Symbol::CommutationEnd,
        Symbol::Rotation => Symbol::RotationEnd,
        _ => Symbol::ConjugationEnd,
    }
}

fn delimiter_symbols(composite: Symbol) -> [Symbol; 2] {
    match composite {
        Symbol::Commutation => [Symbol::CommutationDelimiter, Symbol::CommutationOperator],
        Symbol::Rotation => [Symbol::RotationDelimiter, Symbol::RotationOperator],
        _ => [Symbol::ConjugationDelimiter, Symbol::ConjugationOperator],
    }
}

impl Printer<'_> {
    /// Writes the first token of the symbol, or nothing when the notation
    /// does not define one.
    fn write_token(&mut self, symbol: Symbol) {
        if let Some(token) = self.notation.token(symbol) {
            self.out.push_str(token);
        }
    }

    fn write_infix_token(&mut self, composite: Symbol) {
        let [delimiter, operator] = delimiter_symbols(composite);
        match self.notation.token(operator) {
            Some(token) => self.out.push_str(token),
            None => self.write_token(delimiter),
        }
    }

    fn write_delimiter_token(&mut self, composite: Symbol) {
        let [delimiter, operator] = delimiter_symbols(composite);
        match self.notation.token(delimiter) {
            Some(token) => self.out.push_str(token),
            None => self.write_token(operator),
        }
    }

    fn write_node(&mut self, node: &Node) -> Result<(), PrintError> {
        match &node.kind {
            NodeKind::Sequence(children) => self.write_children(children),
            NodeKind::Grouping(children) => {
                self.write_token(Symbol::GroupingBegin);
                self.write_children(children)?;
                self.write_token(Symbol::GroupingEnd);
                Ok(())
            }
            NodeKind::Inversion(children) => self.write_unary(node, Symbol::Inversion, children),
            NodeKind::Reflection(children) => self.write_unary(node, Symbol::Reflection, children),
            NodeKind::Repetition { count, operands } => self.write_repetition(*count, operands),
            NodeKind::Conjugation { conjugator, conjugated } => {
                self.write_binary(Symbol::Conjugation, conjugator, conjugated)
            }
            NodeKind::Commutation { commutator, commutated } => {
                self.write_binary(Symbol::Commutation, commutator, commutated)
            }
            NodeKind::Rotation { rotator, rotated } => {
                self.write_binary(Symbol::Rotation, rotator, rotated)
            }
            NodeKind::Permutation(cycle) => self.write_permutation(cycle),
            NodeKind::Move(mv) => self.write_move(*mv),
            NodeKind::Macro { name, expansion } => {
                if self.notation.macro_body(name).is_some() {
                    self.out.push_str(name);
                    Ok(())
                } else {
                    self.write_node(expansion)
                }
            }
            NodeKind::Nop => {
                self.write_token(Symbol::Nop);
                Ok(())
            }
        }
    }

    fn write_children(&mut self, children: &[Node]) -> Result<(), PrintError> {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            self.write_node(child)?;
        }
        Ok(())
    }

    /// Writes the node as its expansion, for notations that do not
    /// support the construct.
    fn write_expansion(&mut self, node: &Node) -> Result<(), PrintError> {
        for (i, leaf) in node.expand(false).iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            match leaf {
                Leaf::Move(mv) => self.write_move(*mv)?,
                Leaf::Permutation(cycle) => self.write_permutation(cycle)?,
            }
        }
        Ok(())
    }

    /// Writes an operand that must read back as a single statement,
    /// wrapping multi-statement sequences in grouping tokens.
    fn write_grouped_operand(&mut self, node: &Node) -> Result<(), PrintError> {
        match &node.kind {
            NodeKind::Sequence(children) if children.len() == 1 => self.write_node(&children[0]),
            NodeKind::Sequence(children) => {
                self.write_token(Symbol::GroupingBegin);
                self.write_children(children)?;
                self.write_token(Symbol::GroupingEnd);
                Ok(())
            }
            _ => self.write_node(node),
        }
    }

    fn write_unary(
        &mut self,
        node: &Node,
        composite: Symbol,
        children: &[Node],
    ) -> Result<(), PrintError> {
        if !self.notation.is_supported(composite) {
            return self.write_expansion(node);
        }
        let (operator, begin, end) = match composite {
            Symbol::Reflection => (
                Symbol::ReflectionOperator,
                Symbol::ReflectionBegin,
                Symbol::ReflectionEnd,
            ),
            _ => (
                Symbol::InversionOperator,
                Symbol::InversionBegin,
                Symbol::InversionEnd,
            ),
        };
        match self.notation.syntax(composite) {
            Syntax::Prefix => {
                self.write_token(operator);
                self.write_wrapped_children(children)
            }
            Syntax::Suffix => {
                self.write_wrapped_children(children)?;
                self.write_token(operator);
                Ok(())
            }
            Syntax::Circumfix => {
                self.write_token(begin);
                self.write_children(children)?;
                self.write_token(end);
                Ok(())
            }
            _ => self.write_expansion(node),
        }
    }

    /// Writes the child list of a unary operator so that it reads back as
    /// one statement.
    fn write_wrapped_children(&mut self, children: &[Node]) -> Result<(), PrintError> {
        if children.len() == 1 {
            self.write_node(&children[0])
        } else {
            self.write_token(Symbol::GroupingBegin);
            self.write_children(children)?;
            self.write_token(Symbol::GroupingEnd);
            Ok(())
        }
    }

    fn write_repetition(&mut self, count: u32, operands: &[Node]) -> Result<(), PrintError> {
        if !self.notation.is_supported(Symbol::Repetition) {
            // Write the operand `count` times.
            for i in 0..count {
                if i > 0 {
                    self.out.push(' ');
                }
                self.write_children(operands)?;
            }
            return Ok(());
        }
        match self.notation.syntax(Symbol::Repetition) {
            Syntax::Prefix => {
                self.write_token(Symbol::RepetitionBegin);
                self.out.push_str(&count.to_string());
                self.write_token(Symbol::RepetitionEnd);
                self.write_wrapped_children(operands)
            }
            Syntax::Suffix => {
                self.write_suffix_repetition_operand(operands)?;
                self.write_token(Symbol::RepetitionBegin);
                self.out.push_str(&count.to_string());
                self.write_token(Symbol::RepetitionEnd);
                Ok(())
            }
            Syntax::Preinfix => {
                self.out.push_str(&count.to_string());
                self.out.push(' ');
                self.write_infix_token(Symbol::Repetition);
                self.out.push(' ');
                self.write_wrapped_children(operands)
            }
            Syntax::Postinfix => {
                self.write_wrapped_children(operands)?;
                self.out.push(' ');
                self.write_infix_token(Symbol::Repetition);
                self.out.push(' ');
                self.out.push_str(&count.to_string());
                Ok(())
            }
            _ => {
                for i in 0..count {
                    if i > 0 {
                        self.out.push(' ');
                    }
                    self.write_children(operands)?;
                }
                Ok(())
            }
        }
    }

    /// A suffixed repeat count merges into a preceding move token when
    /// the notation has no repetition-begin marker, so anything that is
    /// not already bracketed is wrapped in a grouping.
    fn write_suffix_repetition_operand(&mut self, operands: &[Node]) -> Result<(), PrintError> {
        let self_delimiting = operands.len() == 1
            && matches!(
                operands[0].kind,
                NodeKind::Grouping(_) | NodeKind::Permutation(_)
            );
        if self_delimiting && self.notation.token(Symbol::RepetitionBegin).is_none() {
            return self.write_children(operands);
        }
        if self.notation.token(Symbol::RepetitionBegin).is_some() {
            return self.write_wrapped_children(operands);
        }
        self.write_token(Symbol::GroupingBegin);
        self.write_children(operands)?;
        self.write_token(Symbol::GroupingEnd);
        Ok(())
    }

    fn write_binary(
        &mut self,
        composite: Symbol,
        head: &Node,
        body: &Node,
    ) -> Result<(), PrintError> {
        let supported = self.notation.is_supported(composite)
            && self.notation.syntax(composite) != Syntax::Primary;
        if !supported {
            // Write the construct as its expansion.
            let kind = match composite {
                Symbol::Commutation => NodeKind::Commutation {
                    commutator: Box::new(head.clone()),
                    commutated: Box::new(body.clone()),
                },
                Symbol::Rotation => NodeKind::Rotation {
                    rotator: Box::new(head.clone()),
                    rotated: Box::new(body.clone()),
                },
                _ => NodeKind::Conjugation {
                    conjugator: Box::new(head.clone()),
                    conjugated: Box::new(body.clone()),
                },
            };
            return self.write_expansion(&Node::new(kind, 0, 0));
        }
        let begin = begin_symbol(composite);
        let end = end_symbol(composite);
        match self.notation.syntax(composite) {
            Syntax::Prefix => {
                self.write_token(begin);
                self.write_node(head)?;
                self.write_token(end);
                self.write_grouped_operand(body)
            }
            Syntax::Suffix => {
                self.write_grouped_operand(body)?;
                self.write_token(begin);
                self.write_node(head)?;
                self.write_token(end);
                Ok(())
            }
            Syntax::Precircumfix => {
                self.write_token(begin);
                self.write_node(head)?;
                self.write_delimiter_token(composite);
                self.write_node(body)?;
                self.write_token(end);
                Ok(())
            }
            Syntax::Postcircumfix => {
                self.write_token(begin);
                self.write_node(body)?;
                self.write_delimiter_token(composite);
                self.write_node(head)?;
                self.write_token(end);
                Ok(())
            }
            Syntax::Preinfix => {
                self.write_grouped_operand(head)?;
                self.out.push(' ');
                self.write_infix_token(composite);
                self.out.push(' ');
                self.write_grouped_operand(body)
            }
            Syntax::Postinfix => {
                self.write_grouped_operand(body)?;
                self.out.push(' ');
                self.write_infix_token(composite);
                self.out.push(' ');
                self.write_grouped_operand(head)
            }
            // Unreachable: the builder rejects every other placement for
            // binary composites.
            _ => Ok(()),
        }
    }

    fn write_move(&mut self, mv: Move) -> Result<(), PrintError> {
        let n = self.notation;
        if let Some(token) = n.move_token(mv) {
            self.out.push_str(token);
            return Ok(());
        }
        if mv.angle().abs() == 2 {
            // A half turn reads the same in either direction.
            if let Some(token) = n.move_token(mv.with_angle(-mv.angle())) {
                self.out.push_str(token);
                return Ok(());
            }
            // Or as two quarter turns.
            for angle in [mv.angle() / 2, -mv.angle() / 2] {
                if let Some(token) = n.move_token(mv.with_angle(angle)) {
                    let token = token.to_owned();
                    self.out.push_str(&token);
                    self.out.push(' ');
                    self.out.push_str(&token);
                    return Ok(());
                }
            }
        } else if n.is_supported(Symbol::Inversion) {
            // Write the opposite twist under an inversion operator.
            if let (Some(token), Some(invertor)) = (
                n.move_token(mv.inverse()),
                n.token(Symbol::InversionOperator),
            ) {
                match n.syntax(Symbol::Inversion) {
                    Syntax::Prefix => {
                        self.out.push_str(invertor);
                        self.out.push_str(token);
                        return Ok(());
                    }
                    Syntax::Suffix => {
                        self.out.push_str(token);
                        self.out.push_str(invertor);
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
        Err(PrintError::NoTokenForMove(mv))
    }

    fn write_permutation(&mut self, cycle: &PermutationCycle) -> Result<(), PrintError> {
        let n = self.notation;
        if !n.is_supported(Symbol::Permutation) {
            return Ok(());
        }
        let syntax = n.syntax(Symbol::Permutation);

        let sign_symbol = match (cycle.family, cycle.sign) {
            (PartFamily::Corner, 1) => Some(Symbol::PermutationMinus),
            (PartFamily::Corner, 2) => Some(Symbol::PermutationPlus),
            (PartFamily::Edge, 1) => Some(Symbol::PermutationPlus),
            (PartFamily::Side, 1) => Some(Symbol::PermutationMinus),
            (PartFamily::Side, 2) => Some(Symbol::PermutationPlusPlus),
            (PartFamily::Side, 3) => Some(Symbol::PermutationPlus),
            _ => None,
        };

        match syntax {
            Syntax::Prefix => {
                if let Some(s) = sign_symbol {
                    self.write_token(s);
                }
                self.write_token(Symbol::PermutationBegin);
            }
            Syntax::Precircumfix => {
                self.write_token(Symbol::PermutationBegin);
                if let Some(s) = sign_symbol {
                    self.write_token(s);
                }
            }
            _ => self.write_token(Symbol::PermutationBegin),
        }

        let even = cycle.layer_count % 2 == 0;
        for (i, item) in cycle.items.iter().enumerate() {
            if i > 0 {
                self.write_token(Symbol::PermutationDelimiter);
            }
            match cycle.family {
                PartFamily::Corner => {
                    let faces = CORNER_FACES[item.location % 8];
                    let ori = item.orientation;
                    let order: [usize; 3] = if ori >= 3 {
                        [
                            (6 - ori) as usize % 3,
                            (5 - ori) as usize % 3,
                            (7 - ori) as usize % 3,
                        ]
                    } else {
                        [
                            (3 - ori) as usize % 3,
                            (4 - ori) as usize % 3,
                            (5 - ori) as usize % 3,
                        ]
                    };
                    for idx in order {
                        self.write_face(faces[idx]);
                    }
                }
                PartFamily::Edge => {
                    let faces = EDGE_FACES[item.location % 12];
                    let ori = (item.orientation & 1) as usize;
                    self.write_face(faces[ori]);
                    self.write_face(faces[(1 + ori) % 2]);
                    let part = item.location / 12;
                    if even {
                        self.out.push_str(&(part + 1).to_string());
                    } else if item.location >= 12 {
                        self.out.push_str(&part.to_string());
                    }
                }
                PartFamily::Side => {
                    let orient_sign = match item.orientation {
                        1 => Some(Symbol::PermutationMinus),
                        2 => Some(Symbol::PermutationPlusPlus),
                        3 => Some(Symbol::PermutationPlus),
                        _ => None,
                    };
                    if syntax != Syntax::Suffix {
                        if let Some(s) = orient_sign {
                            self.write_token(s);
                        }
                    }
                    self.write_face(item.location % 6);
                    if syntax == Syntax::Suffix {
                        if let Some(s) = orient_sign {
                            self.write_token(s);
                        }
                    }
                    let part = item.location / 6;
                    if even {
                        self.out.push_str(&(part + 1).to_string());
                    } else if item.location >= 6 {
                        self.out.push_str(&part.to_string());
                    }
                }
            }
        }

        match syntax {
            Syntax::Postcircumfix => {
                if let Some(s) = sign_symbol {
                    self.write_token(s);
                }
                self.write_token(Symbol::PermutationEnd);
            }
            Syntax::Suffix => {
                self.write_token(Symbol::PermutationEnd);
                if let Some(s) = sign_symbol {
                    self.write_token(s);
                }
            }
            _ => self.write_token(Symbol::PermutationEnd),
        }
        Ok(())
    }

    fn write_face(&mut self, face: usize) {
        const FACE_SYMBOLS: [Symbol; 6] = [
            Symbol::FaceR,
            Symbol::FaceU,
            Symbol::FaceF,
            Symbol::FaceL,
            Symbol::FaceD,
            Symbol::FaceB,
        ];
        self.write_token(FACE_SYMBOLS[face]);
    }
}
