//! The built-in notation (Superset ENG) for 2×2 through 7×7 cubes.

use crate::{Move, Notation, NotationBuilder, NotationError, Symbol, Syntax};

impl Notation {
    /// Returns the built-in notation for a cube with the given layer count
    /// (2..=7).
    ///
    /// Face twists use the letters R, U, F, L, D, B with the half-turn
    /// suffix `2`; the prefixes M, T, C, S, W, N, V select mid-layer,
    /// tier, whole-cube, slice, wide, n-th-layer and verge variants, with
    /// numbered and ranged forms generated from the layer count.
    pub fn default_notation(layer_count: u8) -> Result<Self, NotationError> {
        let mut b = NotationBuilder::new(layer_count)?;

        b.add_token(Symbol::Nop, "·")?;
        b.add_token(Symbol::Nop, ".")?;
        b.add_token(Symbol::FaceR, "r")?;
        b.add_token(Symbol::FaceU, "u")?;
        b.add_token(Symbol::FaceF, "f")?;
        b.add_token(Symbol::FaceL, "l")?;
        b.add_token(Symbol::FaceD, "d")?;
        b.add_token(Symbol::FaceB, "b")?;
        b.add_token(Symbol::PermutationPlus, "+")?;
        b.add_token(Symbol::PermutationMinus, "-")?;
        b.add_token(Symbol::PermutationPlusPlus, "++")?;
        b.add_token(Symbol::PermutationBegin, "(")?;
        b.add_token(Symbol::PermutationEnd, ")")?;
        b.add_token(Symbol::PermutationDelimiter, ",")?;
        b.add_token(Symbol::InversionOperator, "'")?;
        b.add_token(Symbol::InversionOperator, "-")?;
        b.add_token(Symbol::ReflectionOperator, "*")?;
        b.add_token(Symbol::GroupingBegin, "(")?;
        b.add_token(Symbol::GroupingEnd, ")")?;
        b.add_token(Symbol::CommutationBegin, "[")?;
        b.add_token(Symbol::CommutationEnd, "]")?;
        b.add_token(Symbol::CommutationDelimiter, ",")?;
        b.add_token(Symbol::ConjugationBegin, "<")?;
        b.add_token(Symbol::ConjugationEnd, ">")?;
        b.add_token(Symbol::RotationBegin, "<")?;
        b.add_token(Symbol::RotationEnd, ">'")?;
        b.add_token(Symbol::MultiLineCommentBegin, "/*")?;
        b.add_token(Symbol::MultiLineCommentEnd, "*/")?;
        b.add_token(Symbol::SingleLineCommentBegin, "//")?;

        let lc = layer_count as u32;
        let all = (1u32 << lc) - 1;
        let outer = 1u32 << (lc - 1);
        let inner = 1u32;
        let mid_layer = lc / 2;

        for angle in 1..=2i32 {
            let suffix = if angle == 1 { "" } else { "2" };

            // Face twists
            add_moves(&mut b, layer_count, outer, inner, angle, "", suffix)?;

            // Cube rotations
            add_moves(&mut b, layer_count, all, all, angle, "C", suffix)?;

            // Mid-layer twists
            for layer in 0..lc.saturating_sub(2) {
                let run = (1u32 << (layer + 1)) - 1;
                let inner_middle = if lc % 2 == 0 {
                    run << (mid_layer - (layer + 1) / 2 - (layer + 1) % 2)
                } else {
                    run << (mid_layer - (layer + 1) / 2)
                };
                let outer_middle = reversed(inner_middle, lc);
                if inner_middle == all {
                    continue;
                }
                if layer == 0 {
                    add_moves(&mut b, layer_count, outer_middle, inner_middle, angle, "M", suffix)?;
                }
                let name = format!("M{}", layer + 1);
                add_moves(&mut b, layer_count, outer_middle, inner_middle, angle, &name, suffix)?;
            }

            // Wide twists
            let wide = all ^ (inner | outer);
            if wide != 0 {
                add_moves(&mut b, layer_count, wide, wide, angle, "W", suffix)?;
            }

            // Tier twists
            for layer in 0..lc {
                let inner_tier = (1u32 << (layer + 1)) - 1;
                let outer_tier = reversed(inner_tier, lc);
                if layer == 1 {
                    add_moves(&mut b, layer_count, outer_tier, inner_tier, angle, "T", suffix)?;
                }
                let name = format!("T{}", layer + 1);
                add_moves(&mut b, layer_count, outer_tier, inner_tier, angle, &name, suffix)?;
            }

            // N-th layer twists
            for layer in 0..lc - 1 {
                let inner_layer = 1u32 << layer;
                let outer_layer = reversed(inner_layer, lc);
                if layer == 1 {
                    add_moves(&mut b, layer_count, outer_layer, inner_layer, angle, "N", suffix)?;
                }
                let name = format!("N{}", layer + 1);
                add_moves(&mut b, layer_count, outer_layer, inner_layer, angle, &name, suffix)?;
            }

            // N-th layer range twists
            for from in 1..lc.saturating_sub(2) {
                let inner_from = (1u32 << from) - 1;
                let outer_from = reversed(inner_from, lc);
                for to in from..lc - 1 {
                    let inner_to = (1u32 << (to + 1)) - 1;
                    let outer_to = reversed(inner_to, lc);
                    let name = format!("N{}-{}", from + 1, to + 1);
                    add_moves(
                        &mut b,
                        layer_count,
                        outer_to ^ outer_from,
                        inner_to ^ inner_from,
                        angle,
                        &name,
                        suffix,
                    )?;
                }
            }

            // Verge twists (tier twists without the face layer)
            for layer in 1..lc - 1 {
                let inner_tier = ((1u32 << (layer + 1)) - 1) << 1;
                let outer_tier = reversed(inner_tier, lc);
                if layer == 1 {
                    add_moves(&mut b, layer_count, outer_tier, inner_tier, angle, "V", suffix)?;
                }
                let name = format!("V{}", layer + 1);
                add_moves(&mut b, layer_count, outer_tier, inner_tier, angle, &name, suffix)?;
            }

            // Slice twists
            for layer in 0..mid_layer {
                let inner_tier = (1u32 << (layer + 1)) - 1;
                let outer_tier = all ^ ((1u32 << (lc - layer - 1)) - 1);
                let slice = inner_tier | outer_tier;
                if slice == all {
                    continue;
                }
                if layer == 0 {
                    add_moves(&mut b, layer_count, slice, slice, angle, "S", suffix)?;
                }
                let name = format!("S{}", layer + 1);
                add_moves(&mut b, layer_count, slice, slice, angle, &name, suffix)?;
            }

            // Slice range twists
            for from in 1..lc.saturating_sub(2) {
                let inner_from = (1u32 << from) - 1;
                let outer_from = all ^ ((1u32 << (lc - from)) - 1);
                for to in from..lc - 1 {
                    let inner_to = (1u32 << (to + 1)) - 1;
                    let outer_to = all ^ ((1u32 << (lc - to - 1)) - 1);
                    let name = format!("S{}-{}", from + 1, to + 1);
                    add_moves(
                        &mut b,
                        layer_count,
                        all ^ (outer_to ^ outer_from),
                        all ^ (inner_to ^ inner_from),
                        angle,
                        &name,
                        suffix,
                    )?;
                }
            }
        }

        b.put_syntax(Symbol::Commutation, Syntax::Precircumfix)?;
        b.put_syntax(Symbol::Conjugation, Syntax::Prefix)?;
        b.put_syntax(Symbol::Rotation, Syntax::Prefix)?;
        b.put_syntax(Symbol::Grouping, Syntax::Circumfix)?;
        b.put_syntax(Symbol::Permutation, Syntax::Precircumfix)?;
        b.put_syntax(Symbol::Repetition, Syntax::Suffix)?;
        b.put_syntax(Symbol::Reflection, Syntax::Suffix)?;
        b.put_syntax(Symbol::Inversion, Syntax::Suffix)?;
        b.put_syntax(Symbol::Move, Syntax::Primary)?;
        b.put_syntax(Symbol::Nop, Syntax::Primary)?;

        Ok(b.build())
    }
}

/// Reverses the low `layer_count` bits of a layer mask.
fn reversed(mask: u32, layer_count: u32) -> u32 {
    mask.reverse_bits() >> (32 - layer_count)
}

/// Registers the six face variants of one move family.
///
/// R, U and F turn the layers selected by `outer`; L, D and B turn the
/// layers selected by `inner` in the opposite direction.
fn add_moves(
    b: &mut NotationBuilder,
    layer_count: u8,
    outer: u32,
    inner: u32,
    angle: i32,
    prefix: &str,
    suffix: &str,
) -> Result<(), NotationError> {
    b.add_move(Move::new(layer_count, 0, outer, angle), &format!("{prefix}R{suffix}"))?;
    b.add_move(Move::new(layer_count, 1, outer, angle), &format!("{prefix}U{suffix}"))?;
    b.add_move(Move::new(layer_count, 2, outer, angle), &format!("{prefix}F{suffix}"))?;
    b.add_move(Move::new(layer_count, 0, inner, -angle), &format!("{prefix}L{suffix}"))?;
    b.add_move(Move::new(layer_count, 1, inner, -angle), &format!("{prefix}D{suffix}"))?;
    b.add_move(Move::new(layer_count, 2, inner, -angle), &format!("{prefix}B{suffix}"))?;
    Ok(())
}
