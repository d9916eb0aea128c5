//! `printf`-style formatting for the `printf` and `sprintf` built-ins.

use crate::value::Scalar;

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Spec {
    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    /// Pad `body` to the field width; zero padding goes between sign and digits
    fn pad(&self, sign: &str, body: String, zero_allowed: bool) -> String {
        let len = sign.chars().count() + body.chars().count();
        let Some(width) = self.width.filter(|w| *w > len) else {
            return format!("{}{}", sign, body);
        };
        let fill = width - len;

        if self.left {
            format!("{}{}{}", sign, body, " ".repeat(fill))
        } else if self.zero && zero_allowed {
            format!("{}{}{}", sign, "0".repeat(fill), body)
        } else {
            format!("{}{}{}", " ".repeat(fill), sign, body)
        }
    }
}

/// Format `args` according to `format`.
///
/// Supports `%%`, the flags `- + space # 0`, a width, a precision and the
/// conversions `s d i f F e E g G o x X c`. Missing arguments format as an
/// empty string or zero; unknown conversions are copied through.
pub fn sprintf(format: &str, args: &[Scalar]) -> String {
    let mut result = String::with_capacity(format.len());
    let mut chars = format.char_indices().peekable();
    let mut arg_idx = 0;
    let empty = Scalar::empty();

    while let Some((start, ch)) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }

        if matches!(chars.peek(), Some((_, '%'))) {
            chars.next();
            result.push('%');
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&(_, c)) = chars.peek() {
            match c {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '#' => spec.alternate = true,
                '0' => spec.zero = true,
                _ => break,
            }
            chars.next();
        }

        spec.width = read_digits(&mut chars);
        if matches!(chars.peek(), Some((_, '.'))) {
            chars.next();
            spec.precision = Some(read_digits(&mut chars).unwrap_or(0));
        }

        let Some((end, conversion)) = chars.next() else {
            result.push_str(&format[start..]);
            break;
        };

        if !"sdifFeEgGoxXc".contains(conversion) {
            result.push_str(&format[start..end + conversion.len_utf8()]);
            continue;
        }

        let arg = args.get(arg_idx).unwrap_or(&empty);
        arg_idx += 1;
        result.push_str(&format_one(&spec, conversion, arg));
    }

    result
}

fn read_digits(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits.parse().ok()
}

fn format_one(spec: &Spec, conversion: char, arg: &Scalar) -> String {
    match conversion {
        's' => {
            let s = arg.as_str();
            let body = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.to_string(),
            };
            spec.pad("", body, false)
        }
        'c' => {
            let body = match arg.as_number() {
                Some(n) => char::from_u32(n as u32).map(String::from).unwrap_or_default(),
                None => arg.as_str().chars().next().map(String::from).unwrap_or_default(),
            };
            spec.pad("", body, false)
        }
        'd' | 'i' => {
            let n = arg.to_number().trunc() as i64;
            let mut digits = n.unsigned_abs().to_string();
            if let Some(p) = spec.precision
                && digits.len() < p
            {
                digits = format!("{}{}", "0".repeat(p - digits.len()), digits);
            }
            spec.pad(spec.sign(n < 0), digits, spec.precision.is_none())
        }
        'o' | 'x' | 'X' => {
            let n = arg.to_number().trunc() as i64 as u64;
            let (digits, prefix) = match conversion {
                'o' => (format!("{:o}", n), "0"),
                'x' => (format!("{:x}", n), "0x"),
                _ => (format!("{:X}", n), "0X"),
            };
            let prefix = if spec.alternate && n != 0 { prefix } else { "" };
            spec.pad(prefix, digits, spec.precision.is_none())
        }
        'f' | 'F' => {
            let n = arg.to_number();
            let body = format!("{:.*}", spec.precision.unwrap_or(6), n.abs());
            spec.pad(spec.sign(n.is_sign_negative() && n != 0.0), body, n.is_finite())
        }
        'e' | 'E' => {
            let n = arg.to_number();
            let body = exponential(n.abs(), spec.precision.unwrap_or(6), conversion == 'E');
            spec.pad(spec.sign(n.is_sign_negative() && n != 0.0), body, n.is_finite())
        }
        _ => {
            let n = arg.to_number();
            let body = general(n.abs(), spec.precision.unwrap_or(6), spec.alternate, conversion == 'G');
            spec.pad(spec.sign(n.is_sign_negative() && n != 0.0), body, n.is_finite())
        }
    }
}

/// `d.ddde+XX` with at least two exponent digits
fn exponential(n: f64, precision: usize, upper: bool) -> String {
    if !n.is_finite() {
        return format!("{}", n);
    }
    let text = format!("{:.*e}", precision, n);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exponent.abs())
}

/// `%g`: exponential when the exponent is below -4 or at least the precision
fn general(n: f64, precision: usize, alternate: bool, upper: bool) -> String {
    if !n.is_finite() {
        return format!("{}", n);
    }
    let precision = precision.max(1);
    let exponent = if n == 0.0 {
        0
    } else {
        let text = format!("{:.*e}", precision - 1, n);
        text.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let body = if exponent < -4 || exponent >= precision as i32 {
        exponential(n, precision - 1, upper)
    } else {
        format!("{:.*}", (precision as i32 - 1 - exponent) as usize, n)
    };

    if alternate {
        body
    } else {
        strip_trailing_zeros(&body)
    }
}

fn strip_trailing_zeros(body: &str) -> String {
    let (mantissa, suffix) = match body.find(['e', 'E']) {
        Some(i) => body.split_at(i),
        None => (body, ""),
    };
    if !mantissa.contains('.') {
        return body.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, suffix)
}
