//! Axis

/// Coordinate axis used to split kd-tree nodes and index vectors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl From<usize> for Axis {
    fn from(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("invalid axis value {}", i),
        }
    }
}

impl From<u8> for Axis {
    fn from(i: u8) -> Self {
        Axis::from(i as usize)
    }
}

impl From<Axis> for u8 {
    fn from(axis: Axis) -> Self {
        axis as u8
    }
}

impl From<Axis> for usize {
    fn from(axis: Axis) -> usize {
        axis as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_index() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from(usize::from(axis)), axis);
            assert_eq!(Axis::from(u8::from(axis)), axis);
        }
    }

    #[test]
    #[should_panic]
    fn invalid_axis_panics() {
        let _ = Axis::from(3_usize);
    }
}
