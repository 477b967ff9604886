//! BSDF Flags

use bitflags::bitflags;

bitflags! {
    /// Scattering lobes that are active at a surface point, or requested
    /// from / reported by a BSDF sample.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BsdfFlags: u32 {
        const NONE = 0;
        const SPECULAR = 1;
        const GLOSSY = 1 << 1;
        const DIFFUSE = 1 << 2;
        const DISPERSIVE = 1 << 3;
        const REFLECT = 1 << 4;
        const TRANSMIT = 1 << 5;
        const FILTER = 1 << 6;
        const EMIT = 1 << 7;
        const VOLUMETRIC = 1 << 8;

        const ALL_SPECULAR = Self::SPECULAR.bits() | Self::REFLECT.bits() | Self::TRANSMIT.bits();
        const ALL_GLOSSY = Self::GLOSSY.bits() | Self::REFLECT.bits() | Self::TRANSMIT.bits();
        const ALL = Self::SPECULAR.bits()
            | Self::GLOSSY.bits()
            | Self::DIFFUSE.bits()
            | Self::DISPERSIVE.bits()
            | Self::REFLECT.bits()
            | Self::TRANSMIT.bits()
            | Self::FILTER.bits();
    }
}

impl BsdfFlags {
    /// Returns true if any of the flags in `other` are set.
    ///
    /// * `other` - Flags to test.
    #[inline]
    pub fn matches(&self, other: Self) -> bool {
        self.intersects(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_lobe() {
        for f in [
            BsdfFlags::SPECULAR,
            BsdfFlags::GLOSSY,
            BsdfFlags::DIFFUSE,
            BsdfFlags::DISPERSIVE,
            BsdfFlags::REFLECT,
            BsdfFlags::TRANSMIT,
            BsdfFlags::FILTER,
        ] {
            assert!(BsdfFlags::ALL.contains(f));
        }
        assert!(!BsdfFlags::ALL.matches(BsdfFlags::EMIT | BsdfFlags::VOLUMETRIC));
    }

    #[test]
    fn matches_any_bit() {
        let f = BsdfFlags::DIFFUSE | BsdfFlags::REFLECT;
        assert!(f.matches(BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY));
        assert!(!f.matches(BsdfFlags::SPECULAR | BsdfFlags::FILTER));
        assert!(!BsdfFlags::NONE.matches(BsdfFlags::ALL));
    }
}
