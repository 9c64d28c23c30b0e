/// `n!` as a float; anything past `170!` overflows to infinity.
pub fn factorial(n: u64) -> f64 {
    if n > 170 {
        return f64::INFINITY;
    }
    (2..=n).fold(1., |acc, k| acc * k as f64)
}

pub fn max_array(xs: &[f64]) -> f64 {
    xs.iter().fold(f64::NEG_INFINITY, |m, &x| m.max(x))
}

pub fn min_array(xs: &[f64]) -> f64 {
    xs.iter().fold(f64::INFINITY, |m, &x| m.min(x))
}

/// Remainder that takes the sign of the divisor, `a - b * floor(a / b)`.
pub fn floored_rem(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0. && (r < 0.) != (b < 0.) {
        r + b
    } else {
        r
    }
}

/// Round to `digits` decimal places (negative values round to tens, hundreds, ...), ties to even.
pub fn round_to(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let scale = 10f64.powi(digits.saturating_abs());
    if !scale.is_finite() {
        return if digits > 0 { x } else { 0f64.copysign(x) };
    }
    if digits >= 0 {
        let scaled = x * scale;
        if scaled.is_finite() {
            scaled.round_ties_even() / scale
        } else {
            x
        }
    } else {
        (x / scale).round_ties_even() * scale
    }
}
