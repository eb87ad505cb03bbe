//! Number formatting shared by the dashboard views.

/// `39512223` -> `"39,512,223"`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

const SI_PREFIXES: [&str; 7] = ["", "k", "M", "G", "T", "P", "E"];

/// Axis-tick abbreviation with two significant digits and an SI prefix:
/// `39512223.0` -> `"40M"`, `1234.0` -> `"1.2k"`.
pub fn si_two_digits(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // Round to two significant digits first so 999_600 becomes 1.0M, not 1000k.
    let exponent = magnitude.log10().floor() as i32;
    let step = 10f64.powi(exponent - 1);
    let rounded = (magnitude / step).round() * step;
    let exponent = rounded.log10().floor() as i32;

    let tier = (exponent.max(0) / 3).min(SI_PREFIXES.len() as i32 - 1);
    let scaled = rounded / 1000f64.powi(tier);
    let decimals = (1 - (exponent - tier * 3)).max(0) as usize;

    format!("{sign}{scaled:.decimals$}{}", SI_PREFIXES[tier as usize])
}
