//! Rendering a cube state as permutation cycles.
//!
//! The inverse of permutation parsing: the state of a [`Cube`] is
//! described as corner, edge and side permutation cycles under a
//! [`Notation`]. Re-parsing the string and applying it to a solved cube
//! reproduces the state.

use cubescript_cube::Cube;
use cubescript_notation::{Notation, Symbol, Syntax};

use crate::ast::{CORNER_FACES, EDGE_FACES};

struct Tokens {
    faces: [String; 6],
    plus: String,
    plusplus: String,
    minus: String,
    begin: String,
    end: String,
    delimiter: String,
    syntax: Syntax,
    even: bool,
}

impl Tokens {
    fn from_notation(cube: &dyn Cube, notation: &Notation) -> Self {
        let token = |symbol: Symbol| notation.token(symbol).unwrap_or_default().to_owned();
        Self {
            faces: [
                token(Symbol::FaceR),
                token(Symbol::FaceU),
                token(Symbol::FaceF),
                token(Symbol::FaceL),
                token(Symbol::FaceD),
                token(Symbol::FaceB),
            ],
            plus: token(Symbol::PermutationPlus),
            plusplus: token(Symbol::PermutationPlusPlus),
            minus: token(Symbol::PermutationMinus),
            begin: token(Symbol::PermutationBegin),
            end: token(Symbol::PermutationEnd),
            delimiter: token(Symbol::PermutationDelimiter),
            syntax: notation.syntax(Symbol::Permutation),
            even: cube.layer_count() % 2 == 0,
        }
    }

    /// Assembles one cycle with its sign placed per the configured
    /// syntax.
    fn cycle(&self, items: &str, sign: &str) -> String {
        match self.syntax {
            Syntax::Prefix => format!("{sign}{}{items}{}", self.begin, self.end),
            Syntax::Suffix => format!("{}{items}{}{sign}", self.begin, self.end),
            Syntax::Postcircumfix => format!("{}{items}{sign}{}", self.begin, self.end),
            _ => format!("{}{sign}{items}{}", self.begin, self.end),
        }
    }
}

/// Renders the state of `cube` as permutation cycles under `notation`.
///
/// Corner, edge and side cycles are emitted on separate lines, in this
/// order; a solved cube renders as an empty cycle.
pub fn to_permutation_string(cube: &dyn Cube, notation: &Notation) -> String {
    let tokens = Tokens::from_notation(cube, notation);

    let mut sections = Vec::new();
    for section in [
        corner_cycles(cube, &tokens),
        edge_cycles(cube, &tokens),
        side_cycles(cube, &tokens),
    ] {
        if !section.is_empty() {
            sections.push(section);
        }
    }
    if sections.is_empty() {
        return format!("{}{}", tokens.begin, tokens.end);
    }
    sections.join("\n")
}

/// Walks the permutation cycle through `loc` that starts at part `start`.
fn collect_cycle(loc: &[usize], visited: &mut [bool], start: usize) -> Vec<usize> {
    let mut cycle = Vec::new();
    let mut j = start;
    while !visited[j] {
        visited[j] = true;
        cycle.push(j);
        // The part that occupies location j moves here next.
        let mut k = 0;
        while loc[k] != j {
            k += 1;
        }
        j = k;
    }
    cycle
}

fn corner_cycles(cube: &dyn Cube, tokens: &Tokens) -> String {
    let loc = cube.corner_locations();
    let orient = cube.corner_orientations();
    let mut visited = vec![false; loc.len()];
    let mut out = String::new();

    for i in 0..loc.len() {
        if visited[i] || (loc[i] == i && orient[i] == 0) {
            continue;
        }
        let mut cycle = collect_cycle(&loc, &mut visited, i);
        // Start the written cycle at the member whose content is the
        // smallest location.
        let start = (0..cycle.len())
            .min_by_key(|&k| loc[cycle[k]])
            .unwrap_or(0);
        cycle.rotate_left(start);

        let mut items = String::new();
        let mut prev_orient = 0;
        for (k, &j) in cycle.iter().enumerate() {
            if k != 0 {
                items.push_str(&tokens.delimiter);
                prev_orient = (prev_orient + orient[j]) % 3;
            }
            let faces = CORNER_FACES[j % 8];
            for idx in 0..3 {
                items.push_str(&tokens.faces[faces[(idx + 3 - prev_orient as usize) % 3]]);
            }
        }
        prev_orient = (prev_orient + orient[cycle[0]]) % 3;
        let sign = match prev_orient {
            1 => tokens.minus.as_str(),
            2 => tokens.plus.as_str(),
            _ => "",
        };

        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&tokens.cycle(&items, sign));
    }
    out
}

fn edge_cycles(cube: &dyn Cube, tokens: &Tokens) -> String {
    let loc = cube.edge_locations();
    let orient = cube.edge_orientations();
    let mut visited = vec![false; loc.len()];
    let mut out = String::new();
    let mut previous_cycle_start = usize::MAX;

    for i in 0..loc.len() {
        if visited[i] || (loc[i] == i && orient[i] == 0) {
            continue;
        }
        let mut cycle = collect_cycle(&loc, &mut visited, i);
        // Prefer starting at the edge the previous cycle started at, so
        // that related cycles read alike.
        let start = (0..cycle.len())
            .find(|&k| cycle[k] % 12 == previous_cycle_start)
            .unwrap_or(0);
        cycle.rotate_left(start);
        previous_cycle_start = cycle[0] % 12;

        let mut items = String::new();
        let mut prev_orient = 0;
        for (k, &j) in cycle.iter().enumerate() {
            if k != 0 {
                items.push_str(&tokens.delimiter);
                prev_orient ^= orient[j];
            }
            let faces = EDGE_FACES[j % 12];
            if prev_orient == 1 {
                items.push_str(&tokens.faces[faces[1]]);
                items.push_str(&tokens.faces[faces[0]]);
            } else {
                items.push_str(&tokens.faces[faces[0]]);
                items.push_str(&tokens.faces[faces[1]]);
            }
            if tokens.even {
                items.push_str(&(j / 12 + 1).to_string());
            } else if j >= 12 {
                items.push_str(&(j / 12).to_string());
            }
        }
        let sign = if (prev_orient ^ orient[cycle[0]]) == 1 {
            tokens.plus.as_str()
        } else {
            ""
        };

        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&tokens.cycle(&items, sign));
    }
    out
}

fn side_cycles(cube: &dyn Cube, tokens: &Tokens) -> String {
    let loc = cube.side_locations();
    let orient = cube.side_orientations();
    let mut out = String::new();
    if loc.is_empty() {
        return out;
    }
    let parts_per_face = loc.len() / 6;

    // First pass: cycles that stay on a single face of the cube.
    // Second pass: everything else.
    for single_face_pass in [true, false] {
        let mut visited = vec![false; loc.len()];
        for by_face in 0..6 {
            for by_part in 0..parts_per_face {
                let i = by_part + by_face * parts_per_face;
                if visited[i] || (loc[i] == i && orient[i] == 0) {
                    continue;
                }
                let mut cycle = collect_cycle(&loc, &mut visited, i);
                let on_single_face = cycle.iter().all(|&j| j % 6 == i % 6);
                if on_single_face != single_face_pass {
                    continue;
                }
                let start = (0..cycle.len()).min_by_key(|&k| cycle[k]).unwrap_or(0);
                cycle.rotate_left(start);

                let mut items = String::new();
                let mut prev_orient = 0;
                for (k, &j) in cycle.iter().enumerate() {
                    if k != 0 {
                        items.push_str(&tokens.delimiter);
                        prev_orient = (prev_orient + orient[j]) % 4;
                    }
                    let orient_sign = side_orient_sign(tokens, prev_orient);
                    if tokens.syntax != Syntax::Suffix {
                        items.push_str(orient_sign);
                    }
                    items.push_str(&tokens.faces[j % 6]);
                    if tokens.syntax == Syntax::Suffix {
                        items.push_str(orient_sign);
                    }
                    if tokens.even {
                        items.push_str(&(j / 6 + 1).to_string());
                    } else if j >= 6 {
                        items.push_str(&(j / 6).to_string());
                    }
                }
                prev_orient = (prev_orient + orient[cycle[0]]) % 4;
                let sign = side_orient_sign(tokens, prev_orient);

                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&tokens.cycle(&items, sign));
            }
        }
    }
    out
}

fn side_orient_sign(tokens: &Tokens, orientation: i32) -> &str {
    match orientation {
        1 => tokens.minus.as_str(),
        2 => tokens.plusplus.as_str(),
        3 => tokens.plus.as_str(),
        _ => "",
    }
}
