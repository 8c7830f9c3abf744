use crate::Cube;

/// Reference 3×3×3 cube.
///
/// State is held as location and orientation arrays for the 8 corner
/// parts, 12 edge parts and 6 side stickers. Twists are built from the
/// nine elementary face and mid-layer turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubiksCube {
    corner_loc: [usize; 8],
    corner_orient: [i32; 8],
    edge_loc: [usize; 12],
    edge_orient: [i32; 12],
    side_loc: [usize; 6],
    side_orient: [i32; 6],
}

impl Default for RubiksCube {
    fn default() -> Self {
        Self::new()
    }
}

impl RubiksCube {
    /// Creates a solved cube.
    pub fn new() -> Self {
        Self {
            corner_loc: [0, 1, 2, 3, 4, 5, 6, 7],
            corner_orient: [0; 8],
            edge_loc: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            edge_orient: [0; 12],
            side_loc: [0, 1, 2, 3, 4, 5],
            side_orient: [0; 6],
        }
    }

    fn twist_r(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [0, 1, 3, 2], [1, 2, 1, 2], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [0, 1, 2, 4], [1, 1, 1, 1], 2);
        self.side_orient[0] = (self.side_orient[0] + 3) % 4;
    }

    fn twist_u(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [0, 2, 4, 6], [0, 0, 0, 0], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [0, 3, 6, 9], [1, 1, 1, 1], 2);
        self.side_orient[1] = (self.side_orient[1] + 3) % 4;
    }

    fn twist_f(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [6, 7, 1, 0], [1, 2, 1, 2], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [9, 10, 11, 1], [1, 1, 1, 1], 2);
        self.side_orient[2] = (self.side_orient[2] + 3) % 4;
    }

    fn twist_l(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [6, 4, 5, 7], [2, 1, 2, 1], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [6, 7, 8, 10], [1, 1, 1, 1], 2);
        self.side_orient[3] = (self.side_orient[3] + 3) % 4;
    }

    fn twist_d(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [7, 5, 3, 1], [0, 0, 0, 0], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [2, 11, 8, 5], [1, 1, 1, 1], 2);
        self.side_orient[4] = (self.side_orient[4] + 3) % 4;
    }

    fn twist_b(&mut self) {
        four_cycle(&mut self.corner_loc, &mut self.corner_orient, [2, 3, 5, 4], [1, 2, 1, 2], 3);
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [3, 4, 5, 7], [1, 1, 1, 1], 2);
        self.side_orient[5] = (self.side_orient[5] + 3) % 4;
    }

    fn twist_mr(&mut self) {
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [3, 9, 11, 5], [1, 1, 1, 1], 2);
        four_cycle(&mut self.side_loc, &mut self.side_orient, [2, 4, 5, 1], [2, 3, 2, 1], 4);
    }

    fn twist_mu(&mut self) {
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [1, 4, 7, 10], [1, 1, 1, 1], 2);
        four_cycle(&mut self.side_loc, &mut self.side_orient, [3, 2, 0, 5], [2, 1, 2, 3], 4);
    }

    fn twist_mf(&mut self) {
        four_cycle(&mut self.edge_loc, &mut self.edge_orient, [0, 6, 8, 2], [1, 1, 1, 1], 2);
        four_cycle(&mut self.side_loc, &mut self.side_orient, [0, 1, 3, 4], [1, 2, 3, 2], 4);
    }

    /// Repeats an elementary twist. The elementary twists are all
    /// clockwise quarter turns, so a counterclockwise turn is three of
    /// them.
    fn repeat(&mut self, times: usize, twist: fn(&mut Self)) {
        for _ in 0..times {
            twist(self);
        }
    }
}

impl Cube for RubiksCube {
    fn layer_count(&self) -> u8 {
        3
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn is_solved(&self) -> bool {
        *self == Self::new()
    }

    fn transform(&mut self, axis: u8, layer_mask: u32, angle: i32) {
        if angle == 0 {
            return;
        }
        // -2 and 2 are the same half turn.
        let an = if angle == -2 { 2 } else { angle };

        if layer_mask & 1 != 0 {
            // left, down, back
            let twist: fn(&mut Self) = match axis {
                0 => Self::twist_l,
                1 => Self::twist_d,
                _ => Self::twist_b,
            };
            let times = match an {
                -1 => 1,
                1 => 3,
                _ => 2,
            };
            self.repeat(times, twist);
        }
        if layer_mask & 2 != 0 {
            // mid-layer
            let twist: fn(&mut Self) = match axis {
                0 => Self::twist_mr,
                1 => Self::twist_mu,
                _ => Self::twist_mf,
            };
            let times = match an {
                1 => 1,
                -1 => 3,
                _ => 2,
            };
            self.repeat(times, twist);
        }
        if layer_mask & 4 != 0 {
            // right, up, front
            let twist: fn(&mut Self) = match axis {
                0 => Self::twist_r,
                1 => Self::twist_u,
                _ => Self::twist_f,
            };
            let times = match an {
                1 => 1,
                -1 => 3,
                _ => 2,
            };
            self.repeat(times, twist);
        }
    }

    fn corner_locations(&self) -> Vec<usize> {
        self.corner_loc.to_vec()
    }

    fn corner_orientations(&self) -> Vec<i32> {
        self.corner_orient.to_vec()
    }

    fn set_corners(&mut self, locations: &[usize], orientations: &[i32]) {
        self.corner_loc.copy_from_slice(locations);
        self.corner_orient.copy_from_slice(orientations);
    }

    fn edge_locations(&self) -> Vec<usize> {
        self.edge_loc.to_vec()
    }

    fn edge_orientations(&self) -> Vec<i32> {
        self.edge_orient.to_vec()
    }

    fn set_edges(&mut self, locations: &[usize], orientations: &[i32]) {
        self.edge_loc.copy_from_slice(locations);
        self.edge_orient.copy_from_slice(orientations);
    }

    fn side_locations(&self) -> Vec<usize> {
        self.side_loc.to_vec()
    }

    fn side_orientations(&self) -> Vec<i32> {
        self.side_orient.to_vec()
    }

    fn set_sides(&mut self, locations: &[usize], orientations: &[i32]) {
        self.side_loc.copy_from_slice(locations);
        self.side_orient.copy_from_slice(orientations);
    }
}

/// Cycles four parts `l1 → l2 → l3 → l4 → l1` and adds the given
/// orientation deltas modulo `modulo`.
fn four_cycle<const N: usize>(
    loc: &mut [usize; N],
    orient: &mut [i32; N],
    [l1, l2, l3, l4]: [usize; 4],
    [o1, o2, o3, o4]: [i32; 4],
    modulo: i32,
) {
    let swap = loc[l1];
    loc[l1] = loc[l2];
    loc[l2] = loc[l3];
    loc[l3] = loc[l4];
    loc[l4] = swap;

    let swap = orient[l1];
    orient[l1] = (orient[l2] + o1) % modulo;
    orient[l2] = (orient[l3] + o2) % modulo;
    orient[l3] = (orient[l4] + o3) % modulo;
    orient[l4] = (swap + o4) % modulo;
}
