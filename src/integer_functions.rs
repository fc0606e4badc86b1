/// A module containing operations on integers interpreted as fixed-basis
/// digit strings. The dynamic program stores the degree vector of a bag as
/// one of these integers with basis 3, so that a whole per-bag state fits
/// into a hashable key.
pub mod integer_functions {

    /// Defining the type Mapping to distinguish packed digit strings from
    /// normal u64 variables.
    pub type Mapping = u64;

    /// Given the integer function f of basis n, apply returns the digit with
    /// significance s. This is achieved by shifting all digits s positions to
    /// the right and then taking the rest of the division by n, which removes
    /// the more significant digits.
    pub fn apply(n: Mapping, f: Mapping, s: Mapping) -> Mapping {
        (f / n.pow(s as u32)) % n
    }

    /// Given the integer function f of basis n, extend increases the number
    /// of digits by one. All digits with significance s or higher are shifted
    /// one position to the left, then the digit with significance s is set
    /// to v.
    pub fn extend(n: Mapping, f: Mapping, s: Mapping, v: Mapping) -> Mapping {
        let r = f % n.pow(s as u32);
        let l = f - r;
        (n * l) + n.pow(s as u32) * v + r
    }

    /// Returns the number of distinct digit strings of length d over basis n.
    /// These strings are exactly the integers {0, 1, ..., max_mappings - 1}.
    pub fn max_mappings(d: Mapping, n: Mapping) -> Mapping {
        n.pow(d as u32)
    }

    /// Unpacks the first len digits of the integer function f of basis n into
    /// a vector, least significant digit first. Unlike a division loop this
    /// keeps trailing zero digits, which matters because a degree vector may
    /// legitimately end in zeros.
    pub fn to_vec(n: Mapping, f: Mapping, len: usize) -> Vec<Mapping> {
        (0..len).map(|s| apply(n, f, s as Mapping)).collect()
    }
}
