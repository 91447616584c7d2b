//! Shrinking heuristic
//!
//! Variables sitting at a bound whose gradient is beyond the current maximal violation
//! on the opposite side cannot enter a working set before the violation shrinks, so they
//! are moved past the active boundary until the gradient is reconstructed.

use crate::solver::smo::{AlphaStatus, SolverVariant};

/// Maximal violations observed over the active set
///
/// The standard variant tracks one pair for the whole problem; the nu variant tracks
/// one pair per label because its two equality constraints decouple the classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShrinkThresholds {
    Standard {
        gmax1: f64,
        gmax2: f64,
    },
    Nu {
        gmax1: f64,
        gmax2: f64,
        gmax3: f64,
        gmax4: f64,
    },
}

impl ShrinkThresholds {
    /// Scan the first `active_size` variables
    pub fn compute(
        variant: SolverVariant,
        y: &[i8],
        g: &[f64],
        status: &[AlphaStatus],
        active_size: usize,
    ) -> Self {
        match variant {
            SolverVariant::Standard => {
                let mut gmax1 = f64::NEG_INFINITY;
                let mut gmax2 = f64::NEG_INFINITY;
                for i in 0..active_size {
                    let (ascent, descent) = if y[i] == 1 {
                        (&mut gmax1, &mut gmax2)
                    } else {
                        (&mut gmax2, &mut gmax1)
                    };
                    if status[i] != AlphaStatus::UpperBound && -g[i] >= *ascent {
                        *ascent = -g[i];
                    }
                    if status[i] != AlphaStatus::LowerBound && g[i] >= *descent {
                        *descent = g[i];
                    }
                }
                ShrinkThresholds::Standard { gmax1, gmax2 }
            }
            SolverVariant::Nu => {
                let mut gmax1 = f64::NEG_INFINITY;
                let mut gmax2 = f64::NEG_INFINITY;
                let mut gmax3 = f64::NEG_INFINITY;
                let mut gmax4 = f64::NEG_INFINITY;
                for i in 0..active_size {
                    if status[i] != AlphaStatus::UpperBound {
                        if y[i] == 1 {
                            gmax1 = gmax1.max(-g[i]);
                        } else {
                            gmax4 = gmax4.max(-g[i]);
                        }
                    }
                    if status[i] != AlphaStatus::LowerBound {
                        if y[i] == 1 {
                            gmax2 = gmax2.max(g[i]);
                        } else {
                            gmax3 = gmax3.max(g[i]);
                        }
                    }
                }
                ShrinkThresholds::Nu {
                    gmax1,
                    gmax2,
                    gmax3,
                    gmax4,
                }
            }
        }
    }

    /// Largest combined violation; compared against `10 * eps` to trigger unshrinking
    pub fn max_violation(&self) -> f64 {
        match *self {
            ShrinkThresholds::Standard { gmax1, gmax2 } => gmax1 + gmax2,
            ShrinkThresholds::Nu {
                gmax1,
                gmax2,
                gmax3,
                gmax4,
            } => (gmax1 + gmax2).max(gmax3 + gmax4),
        }
    }

    /// Whether a variable can be removed from the active set
    pub fn should_shrink(&self, y: i8, g: f64, status: AlphaStatus) -> bool {
        let positive = y == 1;
        match (*self, status) {
            (_, AlphaStatus::Free) => false,
            (ShrinkThresholds::Standard { gmax1, gmax2 }, AlphaStatus::UpperBound) => {
                -g > if positive { gmax1 } else { gmax2 }
            }
            (ShrinkThresholds::Standard { gmax1, gmax2 }, AlphaStatus::LowerBound) => {
                g > if positive { gmax2 } else { gmax1 }
            }
            (ShrinkThresholds::Nu { gmax1, gmax4, .. }, AlphaStatus::UpperBound) => {
                -g > if positive { gmax1 } else { gmax4 }
            }
            (ShrinkThresholds::Nu { gmax2, gmax3, .. }, AlphaStatus::LowerBound) => {
                g > if positive { gmax2 } else { gmax3 }
            }
        }
    }
}
