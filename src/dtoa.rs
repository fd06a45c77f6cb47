//! Number-to-string conversion (§6.1.6.1.20 `Number::toString`).
//!
//! The double is decomposed into a [`DiyFp`] (`f * 2^e` with an explicit
//! hidden bit), its rounding boundaries are computed as normalized `DiyFp`s,
//! and the shortest digit string lying strictly inside (or, for even
//! significands, on) those boundaries is generated with exact big-integer
//! arithmetic. The result is then laid out per the ECMAScript rules for
//! plain, fractional and exponential notation.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};

const SIGNIFICAND_SIZE: i32 = 52;
const EXPONENT_BIAS: i32 = 0x3FF + SIGNIFICAND_SIZE;
const DENORMAL_EXPONENT: i32 = -EXPONENT_BIAS + 1;
const HIDDEN_BIT: u64 = 1 << SIGNIFICAND_SIZE;
const SIGNIFICAND_MASK: u64 = HIDDEN_BIT - 1;
const EXPONENT_MASK: u64 = 0x7FF0_0000_0000_0000;

/// Largest integer magnitude printed through the direct base-10 path.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A binary floating point value `f * 2^e` with a full 64-bit significand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiyFp {
    pub f: u64,
    pub e: i32,
}

impl DiyFp {
    /// Decomposes a finite, positive double. Denormals keep their raw
    /// significand and the minimum exponent; normals get the hidden bit.
    pub fn from_f64(v: f64) -> Self {
        let bits = v.to_bits();
        let biased_e = ((bits & EXPONENT_MASK) >> SIGNIFICAND_SIZE) as i32;
        let significand = bits & SIGNIFICAND_MASK;
        if biased_e == 0 {
            DiyFp {
                f: significand,
                e: DENORMAL_EXPONENT,
            }
        } else {
            DiyFp {
                f: significand + HIDDEN_BIT,
                e: biased_e - EXPONENT_BIAS,
            }
        }
    }

    /// Shifts the significand left until its top bit is set.
    pub fn normalize(self) -> Self {
        debug_assert!(self.f != 0);
        let shift = self.f.leading_zeros();
        DiyFp {
            f: self.f << shift,
            e: self.e - shift as i32,
        }
    }

    /// Returns the lower and upper rounding boundaries of `v` (the midpoints
    /// to the neighbouring doubles), both sharing the exponent of the
    /// normalized upper boundary.
    pub fn normalized_boundaries(v: f64) -> (DiyFp, DiyFp) {
        let w = DiyFp::from_f64(v);
        let m_plus = DiyFp {
            f: (w.f << 1) + 1,
            e: w.e - 1,
        }
        .normalize();
        // At a power of two the next lower double is half as far away.
        let lower_boundary_is_closer = w.f == HIDDEN_BIT && w.e != DENORMAL_EXPONENT;
        let m_minus = if lower_boundary_is_closer {
            DiyFp {
                f: (w.f << 2) - 1,
                e: w.e - 2,
            }
        } else {
            DiyFp {
                f: (w.f << 1) - 1,
                e: w.e - 1,
            }
        };
        let m_minus = DiyFp {
            f: m_minus.f << (m_minus.e - m_plus.e),
            e: m_plus.e,
        };
        (m_minus, m_plus)
    }
}

/// Shortest digits of a finite positive double: `0.d1d2...dn * 10^point`.
pub(crate) struct Decimal {
    pub digits: Vec<u8>,
    pub point: i32,
}

fn pow10(k: u32) -> BigUint {
    BigUint::from(10u32).pow(k)
}

/// Generates the shortest digit string that rounds back to `v`, choosing the
/// candidate closest to `v` (ties to an even last digit).
pub(crate) fn shortest_digits(v: f64) -> Decimal {
    debug_assert!(v.is_finite() && v > 0.0);
    let w = DiyFp::from_f64(v);
    let (m_minus, m_plus) = DiyFp::normalized_boundaries(v);
    let exponent = m_plus.e;
    let value = BigUint::from(w.f) << (w.e - exponent) as usize;
    let low = BigUint::from(m_minus.f);
    let high = BigUint::from(m_plus.f);
    let mut margin_low = &value - &low;
    let mut margin_high = &high - &value;
    let mut r = value;
    let mut s = BigUint::one();
    if exponent >= 0 {
        r <<= exponent as usize;
        margin_low <<= exponent as usize;
        margin_high <<= exponent as usize;
    } else {
        s <<= (-exponent) as usize;
    }

    // Boundaries round to `v` under round-half-even only when f is even.
    let inclusive = w.f % 2 == 0;

    let mut k = v.log10().ceil() as i32;
    if k >= 0 {
        s *= pow10(k as u32);
    } else {
        let scale = pow10((-k) as u32);
        r *= &scale;
        margin_low *= &scale;
        margin_high *= &scale;
    }

    let too_low = |r: &BigUint, m: &BigUint, s: &BigUint| {
        let high = r + m;
        if inclusive { &high >= s } else { &high > s }
    };
    while too_low(&r, &margin_high, &s) {
        s *= 10u32;
        k += 1;
    }
    loop {
        let high10 = (&r + &margin_high) * 10u32;
        let fits = if inclusive { high10 < s } else { high10 <= s };
        if !fits {
            break;
        }
        r *= 10u32;
        margin_low *= 10u32;
        margin_high *= 10u32;
        k -= 1;
    }

    let mut digits = Vec::with_capacity(17);
    loop {
        r *= 10u32;
        margin_low *= 10u32;
        margin_high *= 10u32;
        let digit = (&r / &s).to_u8().unwrap_or(0);
        r %= &s;
        let within_low = if inclusive {
            r <= margin_low
        } else {
            r < margin_low
        };
        let within_high = too_low(&r, &margin_high, &s);
        match (within_low, within_high) {
            (false, false) => digits.push(digit),
            (true, false) => {
                digits.push(digit);
                break;
            }
            (false, true) => {
                digits.push(digit + 1);
                break;
            }
            (true, true) => {
                let twice = &r << 1usize;
                let round_up = match twice.cmp(&s) {
                    std::cmp::Ordering::Less => false,
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Equal => digit % 2 == 1,
                };
                digits.push(if round_up { digit + 1 } else { digit });
                break;
            }
        }
    }

    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    Decimal { digits, point: k }
}

fn push_digits(out: &mut String, digits: &[u8]) {
    out.extend(digits.iter().map(|d| char::from(b'0' + d)));
}

fn push_exponent(out: &mut String, exponent: i32) {
    out.push('e');
    out.push(if exponent < 0 { '-' } else { '+' });
    out.push_str(&exponent.unsigned_abs().to_string());
}

/// Lays out `0.digits * 10^point` following §6.1.6.1.20 steps 6-12.
fn layout(decimal: &Decimal, out: &mut String) {
    let digits = &decimal.digits;
    let k = digits.len() as i32;
    let n = decimal.point;
    if k <= n && n <= 21 {
        push_digits(out, digits);
        out.extend(std::iter::repeat_n('0', (n - k) as usize));
    } else if 0 < n && n <= 21 {
        push_digits(out, &digits[..n as usize]);
        out.push('.');
        push_digits(out, &digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-n) as usize));
        push_digits(out, digits);
    } else {
        push_digits(out, &digits[..1]);
        if k > 1 {
            out.push('.');
            push_digits(out, &digits[1..]);
        }
        push_exponent(out, n - 1);
    }
}

/// Converts a double to its ECMAScript string form.
pub fn number_to_string(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        return (v as i64).to_string();
    }
    let mut out = String::with_capacity(25);
    if v < 0.0 {
        out.push('-');
    }
    layout(&shortest_digits(v.abs()), &mut out);
    out
}
