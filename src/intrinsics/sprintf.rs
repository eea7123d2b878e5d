//! `printf`/`sprintf` format-string rendering (spec.md §6), and
//! [`format_one`], the single-conversion helper `Value::to_str_fmt` uses
//! for CONVFMT/OFMT number-to-string rendering.

use crate::error::{Error, ErrorKind, Position};
use crate::value::Value;

struct Spec {
    flag_minus: bool,
    flag_plus: bool,
    flag_space: bool,
    flag_zero: bool,
    flag_hash: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conv: char,
}

fn parse_spec(chars: &[char], i: &mut usize, args: &[Value], argi: &mut usize) -> Result<Spec, Error> {
    let mut flag_minus = false;
    let mut flag_plus = false;
    let mut flag_space = false;
    let mut flag_zero = false;
    let mut flag_hash = false;
    loop {
        match chars.get(*i) {
            Some('-') => {
                flag_minus = true;
                *i += 1;
            }
            Some('+') => {
                flag_plus = true;
                *i += 1;
            }
            Some(' ') => {
                flag_space = true;
                *i += 1;
            }
            Some('0') => {
                flag_zero = true;
                *i += 1;
            }
            Some('#') => {
                flag_hash = true;
                *i += 1;
            }
            _ => break,
        }
    }
    let width = parse_numeric_field(chars, i, args, argi);
    let precision = if chars.get(*i) == Some(&'.') {
        *i += 1;
        Some(parse_numeric_field(chars, i, args, argi).unwrap_or(0))
    } else {
        None
    };
    let conv = *chars.get(*i).ok_or_else(|| {
        Error::with_detail(ErrorKind::FmtChr, "format string ends in '%'", Position::NONE)
    })?;
    *i += 1;
    Ok(Spec {
        flag_minus,
        flag_plus,
        flag_space,
        flag_zero,
        flag_hash,
        width,
        precision,
        conv,
    })
}

/// A `*` pulls its value from the next argument; otherwise a literal
/// run of digits.
fn parse_numeric_field(chars: &[char], i: &mut usize, args: &[Value], argi: &mut usize) -> Option<usize> {
    if chars.get(*i) == Some(&'*') {
        *i += 1;
        let v = args.get(*argi).map_or(0, Value::to_int);
        *argi += 1;
        Some(v.max(0) as usize)
    } else {
        let start = *i;
        while matches!(chars.get(*i), Some(c) if c.is_ascii_digit()) {
            *i += 1;
        }
        if *i == start {
            None
        } else {
            chars[start..*i].iter().collect::<String>().parse().ok()
        }
    }
}

fn pad(s: String, spec: &Spec) -> String {
    let Some(width) = spec.width else { return s };
    if s.chars().count() >= width {
        return s;
    }
    let fill = width - s.chars().count();
    if spec.flag_minus {
        s + &" ".repeat(fill)
    } else if spec.flag_zero && matches!(spec.conv, 'd' | 'i' | 'o' | 'x' | 'X' | 'u' | 'e' | 'E' | 'f' | 'F' | 'g' | 'G')
    {
        // zero-pad after any leading sign.
        if let Some(stripped) = s.strip_prefix('-') {
            format!("-{}{}", "0".repeat(fill), stripped)
        } else if let Some(stripped) = s.strip_prefix('+') {
            format!("+{}{}", "0".repeat(fill), stripped)
        } else {
            "0".repeat(fill) + &s
        }
    } else {
        " ".repeat(fill) + &s
    }
}

fn sign_prefix(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.flag_plus {
        "+"
    } else if spec.flag_space {
        " "
    } else {
        ""
    }
}

fn render_int(v: i64, spec: &Spec, radix: u32, upper: bool) -> String {
    let negative = v < 0 && radix == 10;
    let mag: u64 = if radix == 10 {
        v.unsigned_abs()
    } else {
        v as u64
    };
    let mut digits = match radix {
        8 => format!("{:o}", mag),
        16 if upper => format!("{:X}", mag),
        16 => format!("{:x}", mag),
        _ => format!("{}", mag),
    };
    if let Some(prec) = spec.precision {
        if digits.len() < prec {
            digits = "0".repeat(prec - digits.len()) + &digits;
        }
        if prec == 0 && mag == 0 {
            digits.clear();
        }
    }
    if spec.flag_hash && radix == 16 && mag != 0 {
        digits = format!("0{}{}", if upper { 'X' } else { 'x' }, digits);
    } else if spec.flag_hash && radix == 8 && !digits.starts_with('0') {
        digits = format!("0{}", digits);
    }
    format!("{}{}", sign_prefix(negative, spec), digits)
}

fn render_float(f: f64, spec: &Spec) -> String {
    let prec = spec.precision.unwrap_or(6);
    let negative = f.is_sign_negative();
    let mag = f.abs();
    let body = match spec.conv {
        'f' | 'F' => format!("{:.*}", prec, mag),
        'e' | 'E' => {
            let s = format!("{:.*e}", prec, mag);
            normalize_exponent(&s, spec.conv == 'E')
        }
        'g' | 'G' => render_g(mag, prec.max(1), spec.conv == 'G', spec.flag_hash),
        _ => format!("{}", mag),
    };
    format!("{}{}", sign_prefix(negative, spec), body)
}

/// Rust's `{:e}` prints `1.5e2`; C's `%e` prints `1.500000e+02` (two-digit,
/// signed exponent).
fn normalize_exponent(s: &str, upper: bool) -> String {
    let Some(epos) = s.find('e') else { return s.to_string() };
    let (mantissa, exp) = (&s[..epos], &s[epos + 1..]);
    let exp_val: i32 = exp.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, if exp_val < 0 { '-' } else { '+' }, exp_val.abs())
}

fn render_g(mag: f64, prec: usize, upper: bool, keep_trailing: bool) -> String {
    if mag == 0.0 {
        return "0".to_string();
    }
    let exp = mag.log10().floor() as i32;
    let s = if exp < -4 || exp >= prec as i32 {
        let s = format!("{:.*e}", prec.saturating_sub(1), mag);
        normalize_exponent(&s, upper)
    } else {
        let decimals = (prec as i32 - 1 - exp).max(0) as usize;
        format!("{:.*}", decimals, mag)
    };
    if keep_trailing || !s.contains('.') {
        s
    } else {
        let s = s.trim_end_matches('0').to_string();
        s.strip_suffix('.').map(str::to_string).unwrap_or(s)
    }
}

fn render_char(v: &Value) -> String {
    match v {
        Value::Str(s) | Value::NumericStr(s, _) => s.as_str().chars().next().map(String::from).unwrap_or_default(),
        other => char::from_u32(other.to_int() as u32).map(String::from).unwrap_or_default(),
    }
}

fn render_string(v: &Value, spec: &Spec) -> String {
    let s = v.to_str();
    match spec.precision {
        Some(p) => s.as_str().chars().take(p).collect(),
        None => s.as_str().to_string(),
    }
}

/// Full `printf`/`sprintf` rendering: scans `fmt` consuming one `args`
/// entry per conversion (`%%` consumes none).
pub fn format(fmt: &str, args: &[Value]) -> Result<String, Error> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut argi = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        if chars.get(i) == Some(&'%') {
            out.push('%');
            i += 1;
            continue;
        }
        let spec = parse_spec(&chars, &mut i, args, &mut argi)?;
        let rendered = match spec.conv {
            'd' | 'i' => {
                let v = args.get(argi).map_or(0, Value::to_int);
                argi += 1;
                render_int(v, &spec, 10, false)
            }
            'o' => {
                let v = args.get(argi).map_or(0, Value::to_int);
                argi += 1;
                render_int(v, &spec, 8, false)
            }
            'x' => {
                let v = args.get(argi).map_or(0, Value::to_int);
                argi += 1;
                render_int(v, &spec, 16, false)
            }
            'X' => {
                let v = args.get(argi).map_or(0, Value::to_int);
                argi += 1;
                render_int(v, &spec, 16, true)
            }
            'u' => {
                let v = args.get(argi).map_or(0, Value::to_int);
                argi += 1;
                render_int(v, &spec, 10, false)
            }
            'c' => {
                let v = args.get(argi).cloned().unwrap_or(Value::Nil);
                argi += 1;
                render_char(&v)
            }
            's' => {
                let v = args.get(argi).cloned().unwrap_or(Value::Nil);
                argi += 1;
                render_string(&v, &spec)
            }
            'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
                let v = args.get(argi).map_or(0.0, Value::to_flt);
                argi += 1;
                render_float(v, &spec)
            }
            other => {
                return Err(Error::with_detail(
                    ErrorKind::FmtChr,
                    format!("unknown format conversion '%{}'", other),
                    Position::NONE,
                ))
            }
        };
        out.push_str(&pad(rendered, &spec));
    }
    Ok(out)
}

/// Render one numeric value through a single-conversion format string (as
/// used for CONVFMT/OFMT, e.g. `"%.6g"`). Falls back to the plain value on
/// a malformed format string rather than propagating an error, matching
/// `awk`'s permissive CONVFMT handling.
#[must_use]
pub fn format_one(fmt: &str, value: f64) -> String {
    format(fmt, std::slice::from_ref(&Value::Flt(value))).unwrap_or_else(|_| value.to_string())
}
