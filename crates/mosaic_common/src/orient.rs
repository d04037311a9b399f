//! Macro orientation states and mirror transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight rotation/mirror states a hard macro can occupy.
///
/// `R*` are counterclockwise rotations; `MX`/`MY` are mirrors about the X and
/// Y axes, and `MX90`/`MY90` mirror after a 90-degree rotation. The
/// floorplanner only ever applies axis flips, which walk between these states
/// via [`flipped_x`](Self::flipped_x) and [`flipped_y`](Self::flipped_y).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// No rotation or mirroring.
    #[default]
    R0,
    /// 90-degree rotation.
    R90,
    /// 180-degree rotation.
    R180,
    /// 270-degree rotation.
    R270,
    /// Mirror about the X axis.
    MX,
    /// Mirror about the Y axis.
    MY,
    /// Mirror about the X axis after a 90-degree rotation.
    MX90,
    /// Mirror about the Y axis after a 90-degree rotation.
    MY90,
}

impl Orientation {
    /// Returns the orientation after mirroring about the X axis.
    pub fn flipped_x(self) -> Self {
        match self {
            Orientation::R0 => Orientation::MX,
            Orientation::MX => Orientation::R0,
            Orientation::MY => Orientation::R180,
            Orientation::R180 => Orientation::MY,
            Orientation::R90 => Orientation::MX90,
            Orientation::MX90 => Orientation::R90,
            Orientation::MY90 => Orientation::R270,
            Orientation::R270 => Orientation::MY90,
        }
    }

    /// Returns the orientation after mirroring about the Y axis.
    pub fn flipped_y(self) -> Self {
        match self {
            Orientation::R0 => Orientation::MY,
            Orientation::MY => Orientation::R0,
            Orientation::MX => Orientation::R180,
            Orientation::R180 => Orientation::MX,
            Orientation::R90 => Orientation::MY90,
            Orientation::MY90 => Orientation::R90,
            Orientation::MX90 => Orientation::R270,
            Orientation::R270 => Orientation::MX90,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::R0 => "R0",
            Orientation::R90 => "R90",
            Orientation::R180 => "R180",
            Orientation::R270 => "R270",
            Orientation::MX => "MX",
            Orientation::MY => "MY",
            Orientation::MX90 => "MX90",
            Orientation::MY90 => "MY90",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Orientation; 8] = [
        Orientation::R0,
        Orientation::R90,
        Orientation::R180,
        Orientation::R270,
        Orientation::MX,
        Orientation::MY,
        Orientation::MX90,
        Orientation::MY90,
    ];

    #[test]
    fn default_is_r0() {
        assert_eq!(Orientation::default(), Orientation::R0);
    }

    #[test]
    fn flip_x_is_involution() {
        for o in ALL {
            assert_eq!(o.flipped_x().flipped_x(), o);
        }
    }

    #[test]
    fn flip_y_is_involution() {
        for o in ALL {
            assert_eq!(o.flipped_y().flipped_y(), o);
        }
    }

    #[test]
    fn flip_both_axes_is_half_turn() {
        assert_eq!(Orientation::R0.flipped_x().flipped_y(), Orientation::R180);
        assert_eq!(Orientation::R180.flipped_x().flipped_y(), Orientation::R0);
    }

    #[test]
    fn flips_commute() {
        for o in ALL {
            assert_eq!(o.flipped_x().flipped_y(), o.flipped_y().flipped_x());
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(format!("{}", Orientation::R0), "R0");
        assert_eq!(format!("{}", Orientation::MX90), "MX90");
    }

    #[test]
    fn serde_roundtrip() {
        for o in ALL {
            let json = serde_json::to_string(&o).unwrap();
            let restored: Orientation = serde_json::from_str(&json).unwrap();
            assert_eq!(o, restored);
        }
    }
}
