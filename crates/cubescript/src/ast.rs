//! Abstract syntax tree of a parsed script.
//!
//! The tree is a closed tagged union: every construct the grammar can
//! produce is a [`NodeKind`] variant, and the interpreter, the expander
//! and the printer are pattern matches over it. Every node carries the
//! half-open byte span of the source text it was parsed from; a parent's
//! span always encloses its children's spans.
//!
//! A finished tree is immutable. Applying it to a [`Cube`] and expanding
//! it to primitive [`Leaf`] moves never mutate the tree.

use std::fmt;

use cubescript_cube::Cube;
use cubescript_notation::Move;

/// Part family addressed by a permutation cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PartFamily {
    /// Corner parts (three faces per member).
    Corner,
    /// Edge parts (two faces per member).
    Edge,
    /// Side parts (one face per member).
    Side,
}

impl PartFamily {
    /// Returns the orientation modulus of the family.
    pub fn modulus(self) -> i32 {
        match self {
            PartFamily::Corner => 3,
            PartFamily::Edge => 2,
            PartFamily::Side => 4,
        }
    }
}

impl fmt::Display for PartFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartFamily::Corner => write!(f, "corner"),
            PartFamily::Edge => write!(f, "edge"),
            PartFamily::Side => write!(f, "side"),
        }
    }
}

/// One member of a permutation cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PermItem {
    /// Location index of the member within its family.
    pub location: usize,
    /// Orientation of the member relative to the cycle start.
    ///
    /// For corners this ranges over 0..6, where values ≥ 3 mark the
    /// anticlockwise reading of the same three faces.
    pub orientation: i32,
}

/// A single permutation-and-orientation cycle of same-family parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermutationCycle {
    /// The part family the cycle permutes.
    pub family: PartFamily,
    /// Orientation delta applied to the whole cycle, `0..modulus`.
    pub sign: i32,
    /// The cycle members in source order.
    pub items: Vec<PermItem>,
    /// Layer count of the puzzle the cycle is written for.
    pub layer_count: u8,
}

impl PermutationCycle {
    /// Applies the cycle to a cube, forward or inverted.
    pub fn apply(&self, cube: &mut dyn Cube, inverse: bool) {
        if self.items.is_empty() {
            return;
        }
        let modulo = self.family.modulus();
        let (mut loc, mut orient) = match self.family {
            PartFamily::Corner => (cube.corner_locations(), cube.corner_orientations()),
            PartFamily::Edge => (cube.edge_locations(), cube.edge_orientations()),
            PartFamily::Side => (cube.side_locations(), cube.side_orientations()),
        };
        if inverse {
            self.permute_inverse(&mut loc, &mut orient, modulo);
        } else {
            self.permute_forward(&mut loc, &mut orient, modulo);
        }
        match self.family {
            PartFamily::Corner => cube.set_corners(&loc, &orient),
            PartFamily::Edge => cube.set_edges(&loc, &orient),
            PartFamily::Side => cube.set_sides(&loc, &orient),
        }
    }

    fn permute_forward(&self, loc: &mut [usize], orient: &mut [i32], modulo: i32) {
        let seq = &self.items;

        // Adjust the orientation of the parts.
        for i in 0..seq.len() - 1 {
            let delta = seq[i + 1].orientation - seq[i].orientation;
            orient[seq[i].location] = (delta + orient[seq[i].location]).rem_euclid(modulo);
        }
        let last = seq.len() - 1;
        let delta = self.sign - seq[last].orientation + seq[0].orientation;
        orient[seq[last].location] = (delta + orient[seq[last].location]).rem_euclid(modulo);

        // Adjust the location of the parts.
        let temp_loc = loc[seq[last].location];
        let temp_orient = orient[seq[last].location];
        for i in (1..seq.len()).rev() {
            loc[seq[i].location] = loc[seq[i - 1].location];
            orient[seq[i].location] = orient[seq[i - 1].location];
        }
        loc[seq[0].location] = temp_loc;
        orient[seq[0].location] = temp_orient;
    }

    fn permute_inverse(&self, loc: &mut [usize], orient: &mut [i32], modulo: i32) {
        let seq = &self.items;

        // Adjust the orientation of the parts.
        for i in (1..seq.len()).rev() {
            let delta = seq[i - 1].orientation - seq[i].orientation;
            orient[seq[i].location] = (delta + orient[seq[i].location]).rem_euclid(modulo);
        }
        let last = seq.len() - 1;
        let delta = -self.sign + seq[last].orientation - seq[0].orientation;
        orient[seq[0].location] = (delta + orient[seq[0].location]).rem_euclid(modulo);

        // Adjust the location of the parts.
        let temp_loc = loc[seq[0].location];
        let temp_orient = orient[seq[0].location];
        for i in 1..seq.len() {
            loc[seq[i - 1].location] = loc[seq[i].location];
            orient[seq[i - 1].location] = orient[seq[i].location];
        }
        loc[seq[last].location] = temp_loc;
        orient[seq[last].location] = temp_orient;
    }

    /// Returns the inverted cycle: the member sequence is reversed around
    /// its first member and the sign is negated within the family's
    /// modulus.
    pub fn inverse(&self) -> Self {
        let mut items = Vec::with_capacity(self.items.len());
        if let Some(&first) = self.items.first() {
            items.push(first);
        }
        items.extend(self.items.iter().skip(1).rev().copied());

        let mut sign = self.sign;
        match self.family {
            PartFamily::Side | PartFamily::Corner => {
                if sign != 0 {
                    let modulo = self.family.modulus();
                    sign = modulo - sign;
                    for item in items.iter_mut().skip(1) {
                        item.orientation = (sign + item.orientation).rem_euclid(modulo);
                    }
                }
            }
            PartFamily::Edge => {
                if sign != 0 {
                    for item in items.iter_mut().skip(1) {
                        item.orientation ^= sign;
                    }
                }
            }
        }

        Self {
            family: self.family,
            sign,
            items,
            layer_count: self.layer_count,
        }
    }
}

impl fmt::Display for PermutationCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Permutation{{sign:{}", capitalized(self.family), self.sign)?;
        for (i, item) in self.items.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            write!(f, "{sep}{}:{}", item.location, item.orientation)?;
        }
        write!(f, "}}")
    }
}

fn capitalized(family: PartFamily) -> &'static str {
    match family {
        PartFamily::Corner => "Corner",
        PartFamily::Edge => "Edge",
        PartFamily::Side => "Side",
    }
}

/// A primitive statement produced by [`Node::expand`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Leaf {
    /// A primitive twist.
    Move(Move),
    /// A permutation cycle.
    Permutation(PermutationCycle),
}

impl Leaf {
    /// Applies the leaf to a cube.
    pub fn apply(&self, cube: &mut dyn Cube) {
        match self {
            Leaf::Move(mv) => cube.transform(mv.axis(), mv.layer_mask(), mv.angle()),
            Leaf::Permutation(cycle) => cycle.apply(cube, false),
        }
    }
}

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Start of the source span, inclusive.
    pub start: usize,
    /// End of the source span, exclusive.
    pub end: usize,
    /// The construct this node represents.
    pub kind: NodeKind,
}

/// The closed set of script constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A sequence of statements; the root of every parse.
    Sequence(Vec<Node>),
    /// An explicit parenthesized sequence.
    Grouping(Vec<Node>),
    /// Inversion of the children.
    Inversion(Vec<Node>),
    /// Reflection of the children.
    Reflection(Vec<Node>),
    /// Repetition of the children.
    Repetition {
        /// Number of repetitions, never zero.
        count: u32,
        /// The repeated statements.
        operands: Vec<Node>,
    },
    /// Conjugation `A B A'`.
    Conjugation {
        /// The conjugator `A`.
        conjugator: Box<Node>,
        /// The conjugated statement `B`.
        conjugated: Box<Node>,
    },
    /// Commutation `A B A' B'`.
    Commutation {
        /// The commutator `A`.
        commutator: Box<Node>,
        /// The commutated statement `B`.
        commutated: Box<Node>,
    },
    /// Rotated statement `A' B A`.
    Rotation {
        /// The rotator `A`.
        rotator: Box<Node>,
        /// The rotated statement `B`.
        rotated: Box<Node>,
    },
    /// A permutation-cycle statement.
    Permutation(PermutationCycle),
    /// A primitive twist.
    Move(Move),
    /// A macro reference together with its resolved expansion.
    Macro {
        /// The referenced macro name.
        name: String,
        /// The expansion of the macro body, re-spanned to the reference.
        expansion: Box<Node>,
    },
    /// A statement without effect.
    Nop,
}

impl Node {
    /// Creates a node.
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        Self { start, end, kind }
    }

    /// Returns the children of sequence-like nodes.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Sequence(c)
            | NodeKind::Grouping(c)
            | NodeKind::Inversion(c)
            | NodeKind::Reflection(c)
            | NodeKind::Repetition { operands: c, .. } => c,
            _ => &[],
        }
    }

    /// Overwrites the spans of this node and all of its descendants.
    /// Used to attribute macro expansions to the reference site.
    pub(crate) fn respan(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
        match &mut self.kind {
            NodeKind::Sequence(c)
            | NodeKind::Grouping(c)
            | NodeKind::Inversion(c)
            | NodeKind::Reflection(c)
            | NodeKind::Repetition { operands: c, .. } => {
                for child in c {
                    child.respan(start, end);
                }
            }
            NodeKind::Conjugation { conjugator: a, conjugated: b }
            | NodeKind::Commutation { commutator: a, commutated: b }
            | NodeKind::Rotation { rotator: a, rotated: b } => {
                a.respan(start, end);
                b.respan(start, end);
            }
            NodeKind::Macro { expansion, .. } => expansion.respan(start, end),
            NodeKind::Permutation(_) | NodeKind::Move(_) | NodeKind::Nop => {}
        }
    }

    /// Applies the effect of this subtree to a cube.
    ///
    /// With `inverse` set, the transform is applied in reversed order with
    /// every twist negated, so that `apply(cube, false)` followed by
    /// `apply(cube, true)` is the identity.
    pub fn apply(&self, cube: &mut dyn Cube, inverse: bool) {
        match &self.kind {
            NodeKind::Sequence(children) | NodeKind::Grouping(children) => {
                apply_sequence(children, cube, inverse);
            }
            NodeKind::Inversion(children) => apply_sequence(children, cube, !inverse),
            NodeKind::Reflection(_) => {
                for leaf in self.expand(inverse) {
                    leaf.apply(cube);
                }
            }
            NodeKind::Repetition { count, operands } => {
                for _ in 0..*count {
                    apply_sequence(operands, cube, inverse);
                }
            }
            NodeKind::Conjugation { conjugator, conjugated } => {
                conjugator.apply(cube, false);
                conjugated.apply(cube, inverse);
                conjugator.apply(cube, true);
            }
            NodeKind::Commutation { commutator, commutated } => {
                if inverse {
                    commutated.apply(cube, false);
                    commutator.apply(cube, false);
                    commutated.apply(cube, true);
                    commutator.apply(cube, true);
                } else {
                    commutator.apply(cube, false);
                    commutated.apply(cube, false);
                    commutator.apply(cube, true);
                    commutated.apply(cube, true);
                }
            }
            NodeKind::Rotation { rotator, rotated } => {
                rotator.apply(cube, true);
                rotated.apply(cube, inverse);
                rotator.apply(cube, false);
            }
            NodeKind::Permutation(cycle) => cycle.apply(cube, inverse),
            NodeKind::Move(mv) => {
                let mv = if inverse { mv.inverse() } else { *mv };
                cube.transform(mv.axis(), mv.layer_mask(), mv.angle());
            }
            NodeKind::Macro { expansion, .. } => expansion.apply(cube, inverse),
            NodeKind::Nop => {}
        }
    }

    /// Expands the subtree to the equivalent sequence of primitive
    /// leaves, with every composite construct and macro flattened.
    ///
    /// The returned sequence is freshly built on every call. Replaying it
    /// leaf by leaf through [`Leaf::apply`] has the same effect as calling
    /// [`Node::apply`] on this node.
    pub fn expand(&self, inverse: bool) -> Vec<Leaf> {
        let mut out = Vec::new();
        self.expand_into(inverse, &mut out);
        out
    }

    fn expand_into(&self, inverse: bool, out: &mut Vec<Leaf>) {
        match &self.kind {
            NodeKind::Sequence(children) | NodeKind::Grouping(children) => {
                expand_sequence(children, inverse, out);
            }
            NodeKind::Inversion(children) => expand_sequence(children, !inverse, out),
            NodeKind::Reflection(children) => {
                let mut inner = Vec::new();
                expand_sequence(children, inverse, &mut inner);
                for leaf in inner {
                    match leaf {
                        Leaf::Move(mv) => out.push(Leaf::Move(mv.reflected())),
                        other => out.push(other),
                    }
                }
            }
            NodeKind::Repetition { count, operands } => {
                for _ in 0..*count {
                    expand_sequence(operands, inverse, out);
                }
            }
            NodeKind::Conjugation { conjugator, conjugated } => {
                conjugator.expand_into(false, out);
                conjugated.expand_into(inverse, out);
                conjugator.expand_into(true, out);
            }
            NodeKind::Commutation { commutator, commutated } => {
                if inverse {
                    commutated.expand_into(false, out);
                    commutator.expand_into(false, out);
                    commutated.expand_into(true, out);
                    commutator.expand_into(true, out);
                } else {
                    commutator.expand_into(false, out);
                    commutated.expand_into(false, out);
                    commutator.expand_into(true, out);
                    commutated.expand_into(true, out);
                }
            }
            NodeKind::Rotation { rotator, rotated } => {
                rotator.expand_into(true, out);
                rotated.expand_into(inverse, out);
                rotator.expand_into(false, out);
            }
            NodeKind::Permutation(cycle) => {
                let cycle = if inverse { cycle.inverse() } else { cycle.clone() };
                out.push(Leaf::Permutation(cycle));
            }
            NodeKind::Move(mv) => {
                let mv = if inverse { mv.inverse() } else { *mv };
                out.push(Leaf::Move(mv));
            }
            NodeKind::Macro { expansion, .. } => expansion.expand_into(inverse, out),
            NodeKind::Nop => {}
        }
    }
}

fn apply_sequence(children: &[Node], cube: &mut dyn Cube, inverse: bool) {
    if inverse {
        for child in children.iter().rev() {
            child.apply(cube, true);
        }
    } else {
        for child in children {
            child.apply(cube, false);
        }
    }
}

fn expand_sequence(children: &[Node], inverse: bool, out: &mut Vec<Leaf>) {
    if inverse {
        for child in children.iter().rev() {
            child.expand_into(true, out);
        }
    } else {
        for child in children {
            child.expand_into(false, out);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Sequence(c) => write_tree(f, "Sequence", c),
            NodeKind::Grouping(c) => write_tree(f, "Grouping", c),
            NodeKind::Inversion(c) => write_tree(f, "Inversion", c),
            NodeKind::Reflection(c) => write_tree(f, "Reflection", c),
            NodeKind::Repetition { count, operands } => {
                write!(f, "Repetition{{{count},")?;
                for child in operands {
                    write!(f, " {child}")?;
                }
                write!(f, " }}")
            }
            NodeKind::Conjugation { conjugator, conjugated } => {
                write!(f, "Conjugation{{ {conjugator}, {conjugated} }}")
            }
            NodeKind::Commutation { commutator, commutated } => {
                write!(f, "Commutation{{ {commutator}, {commutated} }}")
            }
            NodeKind::Rotation { rotator, rotated } => {
                write!(f, "Rotation{{ {rotator}, {rotated} }}")
            }
            NodeKind::Permutation(cycle) => write!(f, "{cycle}"),
            NodeKind::Move(mv) => write!(f, "{mv}"),
            NodeKind::Macro { name, expansion } => write!(f, "Macro{{{name}, {expansion} }}"),
            NodeKind::Nop => write!(f, "NOP"),
        }
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, name: &str, children: &[Node]) -> fmt::Result {
    write!(f, "{name}{{")?;
    for child in children {
        write!(f, " {child}")?;
    }
    write!(f, " }}")
}

/// Face triples of the eight corner locations, as canonical face indices
/// in clockwise sticker order (R=0, U=1, F=2, L=3, D=4, B=5).
pub(crate) const CORNER_FACES: [[usize; 3]; 8] = [
    [1, 0, 2], // urf
    [4, 2, 0], // dfr
    [1, 5, 0], // ubr
    [4, 0, 5], // drb
    [1, 3, 5], // ulb
    [4, 5, 3], // dbl
    [1, 2, 3], // ufl
    [4, 3, 2], // dlf
];

/// Face pairs of the twelve edge locations, as canonical face indices.
pub(crate) const EDGE_FACES: [[usize; 2]; 12] = [
    [1, 0], // ur
    [0, 2], // rf
    [4, 0], // dr
    [5, 1], // bu
    [0, 5], // rb
    [5, 4], // bd
    [1, 3], // ul
    [3, 5], // lb
    [4, 3], // dl
    [2, 1], // fu
    [3, 2], // lf
    [2, 4], // fd
];

#[cfg(test)]
mod tests {
    use cubescript_cube::{Cube as _, RubiksCube};
    use pretty_assertions::assert_eq;

    use super::*;

    fn mv(axis: u8, mask: u32, angle: i32) -> Node {
        Node::new(NodeKind::Move(Move::new(3, axis, mask, angle)), 0, 0)
    }

    #[test]
    fn apply_then_inverse_apply_is_identity() {
        let node = Node::new(
            NodeKind::Sequence(vec![mv(0, 4, 1), mv(1, 4, 1), mv(2, 1, -2)]),
            0,
            0,
        );
        let mut cube = RubiksCube::new();
        node.apply(&mut cube, false);
        assert!(!cube.is_solved());
        node.apply(&mut cube, true);
        assert!(cube.is_solved());
    }

    #[test]
    fn commutation_identity() {
        let node = Node::new(
            NodeKind::Commutation {
                commutator: Box::new(mv(0, 4, 1)),
                commutated: Box::new(mv(1, 4, 1)),
            },
            0,
            0,
        );
        let mut cube = RubiksCube::new();
        node.apply(&mut cube, false);
        node.apply(&mut cube, true);
        assert!(cube.is_solved());
    }

    #[test]
    fn expand_replays_like_apply() {
        let node = Node::new(
            NodeKind::Conjugation {
                conjugator: Box::new(mv(1, 7, 1)),
                conjugated: Box::new(Node::new(
                    NodeKind::Repetition {
                        count: 2,
                        operands: vec![Node::new(
                            NodeKind::Inversion(vec![mv(0, 4, 1), mv(1, 4, 1)]),
                            0,
                            0,
                        )],
                    },
                    0,
                    0,
                )),
            },
            0,
            0,
        );
        for inverse in [false, true] {
            let mut direct = RubiksCube::new();
            node.apply(&mut direct, inverse);
            let mut replayed = RubiksCube::new();
            for leaf in node.expand(inverse) {
                leaf.apply(&mut replayed);
            }
            assert_eq!(direct, replayed, "inverse = {inverse}");
        }
    }

    #[test]
    fn expand_is_idempotent() {
        let node = Node::new(
            NodeKind::Commutation {
                commutator: Box::new(mv(0, 4, 1)),
                commutated: Box::new(mv(1, 2, 1)),
            },
            0,
            0,
        );
        assert_eq!(node.expand(false), node.expand(false));
        assert_eq!(node.expand(true), node.expand(true));
    }

    #[test]
    fn inversion_reverses_and_negates() {
        let node = Node::new(NodeKind::Inversion(vec![mv(0, 4, 1), mv(1, 4, 2)]), 0, 0);
        let leaves = node.expand(false);
        assert_eq!(
            leaves,
            vec![
                Leaf::Move(Move::new(3, 1, 4, -2)),
                Leaf::Move(Move::new(3, 0, 4, -1)),
            ]
        );
    }

    #[test]
    fn reflection_mirrors_layer_masks() {
        let node = Node::new(NodeKind::Reflection(vec![mv(0, 4, 1), mv(1, 3, 1)]), 0, 0);
        let leaves = node.expand(false);
        assert_eq!(
            leaves,
            vec![
                Leaf::Move(Move::new(3, 0, 1, 1)),
                Leaf::Move(Move::new(3, 1, 6, 1)),
            ]
        );
    }

    #[test]
    fn permutation_cycle_inverse_round_trips() {
        let cycle = PermutationCycle {
            family: PartFamily::Corner,
            sign: 2,
            items: vec![
                PermItem { location: 0, orientation: 0 },
                PermItem { location: 2, orientation: 2 },
                PermItem { location: 3, orientation: 0 },
            ],
            layer_count: 3,
        };
        let mut cube = RubiksCube::new();
        cycle.apply(&mut cube, false);
        assert!(!cube.is_solved());
        cycle.apply(&mut cube, true);
        assert!(cube.is_solved());

        let mut via_inverse = RubiksCube::new();
        cycle.apply(&mut via_inverse, false);
        cycle.inverse().apply(&mut via_inverse, false);
        assert!(via_inverse.is_solved());
    }
}
