/// Returns the mask necessary to access the bit at `index` of a `width` bit wide word,
/// counting from the most significant bit.
///
/// # Example
///
/// ```
/// # use circuitsim::data_structures::msb_mask_64;
/// let word = 0b0100u64;
///
/// assert_eq!(word & msb_mask_64(1, 4) != 0, true);
/// assert_eq!(word & msb_mask_64(3, 4) != 0, false);
/// ```
///
/// # Panics
///
/// Panics if `index` >= `width` or `width` > 64.
pub fn msb_mask_64(index: usize, width: usize) -> u64 {
    assert!(
        index < width && width <= 64,
        "Tried to access bit:{} of a {} bit word",
        index,
        width
    );
    1 << (width - 1 - index)
}

/// Data structure that allows for iterating over the lowest `width` bits of a [u64],
/// most significant bit first.
///
/// This is the order in which bit strings are written, so `BitIter::new(0b0110, 4)`
/// yields the bits of `"0110"`.
///
/// # Example
/// ```
/// # use circuitsim::data_structures::BitIter;
/// let mut bits = BitIter::new(0b101u64, 4);
///
/// assert_eq!(bits.next().unwrap(), false);
/// assert_eq!(bits.next().unwrap(), true);
/// assert_eq!(bits.next().unwrap(), false);
/// assert_eq!(bits.next().unwrap(), true);
///
/// assert_eq!(bits.next(), None);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitIter {
    item: u64,
    width: usize,
    i: usize,
}
impl BitIter {
    /// Returns a new [BitIter] which will iterate over the lowest `width` bits of `item`.
    ///
    /// # Panics
    ///
    /// Will panic if `width` > 64.
    pub fn new(item: u64, width: usize) -> Self {
        assert!(
            width <= 64,
            "Item too big to bit iterate, width: {}",
            width
        );

        Self { item, width, i: 0 }
    }

    /// Returns true if the bits left to iterate are all 0.
    ///
    /// # Example
    /// ```
    /// # use circuitsim::data_structures::BitIter;
    /// let zero = BitIter::new(0b1000, 3);
    /// assert_eq!(zero.is_zero(), true);
    ///
    /// let non_zero = BitIter::new(0b0100, 3);
    /// assert_eq!(non_zero.is_zero(), false);
    /// ```
    pub fn is_zero(&self) -> bool {
        self.clone().all(|bit| !bit)
    }
}

impl Iterator for BitIter {
    type Item = bool;
    fn next(&mut self) -> Option<Self::Item> {
        if self.i == self.width {
            return None;
        }

        let result = self.item & msb_mask_64(self.i, self.width) != 0;
        self.i += 1;

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.width - self.i;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BitIter {}
