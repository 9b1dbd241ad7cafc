use crate::complex::Complex;

/// Squared bailout radius. `|z|² > 4` is the same test as `|z| > 2`.
pub const BAILOUT_NORM_SQ: f64 = 4.0;

/// Escape-time count for `z ← z² + c` starting from `z = 0`.
///
/// Returns the number of iterations that stayed inside the bailout radius
/// before the orbit escaped, or `max_iter` if it never escaped (the
/// "presumed in the set" sentinel). A point that escapes on its very first
/// step therefore yields `0`.
///
/// Pure: no shared state, safe to call from any number of threads.
#[inline]
pub fn escape_count(c: Complex, max_iter: u32) -> u32 {
    let mut z = Complex::ZERO;
    for n in 0..max_iter {
        z = z.square_add(c);
        if z.norm_sq() > BAILOUT_NORM_SQ {
            return n;
        }
    }
    max_iter
}
