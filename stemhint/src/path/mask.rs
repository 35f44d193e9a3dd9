//! Hint activation masks.

use super::Dimension;

/// Set of active stems.
///
/// One bit per horizontal stem followed by one bit per vertical stem, in
/// the order of the path's stem lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HintMask {
    pub h: Vec<bool>,
    pub v: Vec<bool>,
}

impl HintMask {
    /// Creates an empty mask for the given stem counts.
    pub fn new(h_count: usize, v_count: usize) -> Self {
        Self {
            h: vec![false; h_count],
            v: vec![false; v_count],
        }
    }

    /// Creates a mask with the given stem indices set. Indices out of range
    /// are ignored.
    pub fn from_indices(
        h_count: usize,
        v_count: usize,
        h: impl IntoIterator<Item = usize>,
        v: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut mask = Self::new(h_count, v_count);
        h.into_iter()
            .for_each(|ix| mask.set(Dimension::Horizontal, ix, true));
        v.into_iter()
            .for_each(|ix| mask.set(Dimension::Vertical, ix, true));
        mask
    }

    fn bits(&self, dim: Dimension) -> &[bool] {
        match dim {
            Dimension::Horizontal => &self.h,
            Dimension::Vertical => &self.v,
        }
    }

    pub fn get(&self, dim: Dimension, index: usize) -> bool {
        self.bits(dim).get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, dim: Dimension, index: usize, value: bool) {
        let bits = match dim {
            Dimension::Horizontal => &mut self.h,
            Dimension::Vertical => &mut self.v,
        };
        if let Some(bit) = bits.get_mut(index) {
            *bit = value;
        }
    }

    /// Indices of the active stems in one dimension.
    pub fn indices(&self, dim: Dimension) -> impl Iterator<Item = usize> + '_ {
        self.bits(dim)
            .iter()
            .enumerate()
            .filter_map(|(ix, bit)| bit.then_some(ix))
    }

    /// Number of active stems.
    pub fn count(&self) -> usize {
        self.h.iter().chain(&self.v).filter(|bit| **bit).count()
    }

    /// Number of stems described by the mask.
    pub fn len(&self) -> usize {
        self.h.len() + self.v.len()
    }

    /// Returns true if no stem is active.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Packs the mask as in a Type 2 `hintmask` operand: most significant
    /// bit first, horizontal stems before vertical stems, padded to a whole
    /// byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.len().div_ceil(8)];
        for (ix, _) in self
            .h
            .iter()
            .chain(&self.v)
            .enumerate()
            .filter(|(_, bit)| **bit)
        {
            bytes[ix / 8] |= 0x80 >> (ix % 8);
        }
        bytes
    }

    /// Inverse of [`HintMask::to_bytes`]. Missing bytes read as zero.
    pub fn from_bytes(bytes: &[u8], h_count: usize, v_count: usize) -> Self {
        let bit = |ix: usize| {
            bytes
                .get(ix / 8)
                .map(|byte| byte & (0x80 >> (ix % 8)) != 0)
                .unwrap_or(false)
        };
        Self {
            h: (0..h_count).map(bit).collect(),
            v: (h_count..h_count + v_count).map(bit).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_msb_first() {
        let mask = HintMask::from_indices(3, 1, [0, 2], [0]);
        assert_eq!(mask.to_bytes(), vec![0b1011_0000]);
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn pack_spans_bytes() {
        let mask = HintMask::from_indices(6, 4, [5], [1, 3]);
        assert_eq!(mask.to_bytes(), vec![0b0000_0101, 0b0100_0000]);
        assert_eq!(HintMask::from_bytes(&mask.to_bytes(), 6, 4), mask);
    }

    #[test]
    fn out_of_range_indices_ignored() {
        let mask = HintMask::from_indices(2, 2, [0, 7], [9]);
        assert_eq!(mask.count(), 1);
        assert!(mask.get(Dimension::Horizontal, 0));
        assert!(!mask.get(Dimension::Vertical, 9));
        assert_eq!(mask.indices(Dimension::Horizontal).collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn empty_mask() {
        let mask = HintMask::new(0, 0);
        assert!(mask.is_empty());
        assert!(mask.to_bytes().is_empty());
    }
}
