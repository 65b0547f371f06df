//! Query string tokenizer and value parsers.

use alloc::string::String;
use alloc::vec::Vec;

use super::ParseWarning;
use super::color::parse_color;
use super::grid_options::GridOptions;
use crate::fit::FitPolicy;

/// Parse a query string into options + warnings.
pub(crate) fn parse_query(query: &str) -> (GridOptions, Vec<ParseWarning>) {
    let mut opts = GridOptions::new();
    let mut warnings = Vec::new();

    for pair in split_query(query) {
        let (raw_key, raw_value) = split_pair(pair);
        let key = percent_decode(&raw_key).to_ascii_lowercase();
        let value = percent_decode(&raw_value);
        dispatch_key(&key, &value, &mut opts, &mut warnings);
    }

    (opts, warnings)
}

fn dispatch_key(key: &str, value: &str, opts: &mut GridOptions, warnings: &mut Vec<ParseWarning>) {
    match key {
        "rows" => set_int(&mut opts.rows, "rows", key, value, warnings),
        "cols" | "columns" => set_int(&mut opts.cols, "cols", key, value, warnings),
        "gap" | "spacing" => set_int(&mut opts.gap, "gap", key, value, warnings),
        "w" | "width" => set_int(&mut opts.width, "width", key, value, warnings),
        "h" | "height" => set_int(&mut opts.height, "height", key, value, warnings),
        "quality" => set_int(&mut opts.quality, "quality", key, value, warnings),

        "bg" | "bgcolor" | "background" => match parse_color(value) {
            Some(c) => set_or_warn(&mut opts.background, c, key, value, warnings),
            None => warnings.push(ParseWarning::ValueInvalid {
                key: "background",
                value: String::from(value),
                reason: "expected #hex, rgb()/rgba() or a CSS color name",
            }),
        },

        "fit" | "mode" => match parse_fit(value) {
            Some(f) => set_or_warn(&mut opts.fit, f, key, value, warnings),
            None => warnings.push(ParseWarning::ValueInvalid {
                key: "fit",
                value: String::from(value),
                reason: "expected cover|contain",
            }),
        },

        "format" => match parse_format(value) {
            Some(f) => set_or_warn(&mut opts.format, String::from(f), key, value, warnings),
            None => warnings.push(ParseWarning::ValueInvalid {
                key: "format",
                value: String::from(value),
                reason: "expected png|jpg|jpeg",
            }),
        },

        _ => warnings.push(ParseWarning::KeyNotRecognized {
            key: String::from(key),
            value: String::from(value),
        }),
    }
}

/// Parse an integer into `field`, warning on junk or duplicates.
///
/// Negative and oversized values parse fine; range checks happen when the
/// options are applied, so they can be clamped.
fn set_int(
    field: &mut Option<i64>,
    name: &'static str,
    key: &str,
    value: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    match parse_i64(value) {
        Some(v) => set_or_warn(field, v, key, value, warnings),
        None => warnings.push(ParseWarning::ValueInvalid {
            key: name,
            value: String::from(value),
            reason: "expected an integer",
        }),
    }
}

/// Set a field, warning on duplicate.
fn set_or_warn<T>(
    field: &mut Option<T>,
    parsed: T,
    key: &str,
    value: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    if field.is_some() {
        warnings.push(ParseWarning::DuplicateKey {
            key: String::from(key),
            value: String::from(value),
        });
    }
    *field = Some(parsed);
}

// ---- Value parsers ----

/// Integer, accepting a trailing `px` and rounding decimals.
fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    let s = s.strip_suffix("px").unwrap_or(s).trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    // Saturating cast; rounds half away from zero.
    Some(if f < 0.0 { (f - 0.5) as i64 } else { (f + 0.5) as i64 })
}

fn parse_fit(s: &str) -> Option<FitPolicy> {
    match s.trim().to_ascii_lowercase().as_str() {
        "cover" | "crop" | "fill" => Some(FitPolicy::Cover),
        "contain" | "pad" | "fit" => Some(FitPolicy::Contain),
        _ => None,
    }
}

/// Normalize a format value to an extension.
fn parse_format(s: &str) -> Option<&'static str> {
    match s.trim().to_ascii_lowercase().as_str() {
        "png" | "image/png" => Some("png"),
        "jpg" | "jpeg" | "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

// ---- Query string tokenizer ----

/// Split query string on '&'.
fn split_query(query: &str) -> impl Iterator<Item = &str> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query.split('&').filter(|s| !s.is_empty())
}

/// Split a single "key=value" pair on the first '='.
fn split_pair(pair: &str) -> (String, String) {
    match pair.split_once('=') {
        Some((k, v)) => (String::from(k), String::from(v)),
        None => (String::from(pair), String::new()),
    }
}

/// Percent-decode a URL component. Also handles '+' as space.
///
/// Decodes to bytes first so multi-byte UTF-8 sequences survive; invalid
/// sequences are replaced.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvasColor;

    #[test]
    fn parse_basic_grid() {
        let (opts, warnings) = parse_query("rows=3&cols=4&gap=12");
        assert!(warnings.is_empty());
        assert_eq!(opts.rows, Some(3));
        assert_eq!(opts.cols, Some(4));
        assert_eq!(opts.gap, Some(12));
    }

    #[test]
    fn parse_aliases_and_leading_question_mark() {
        let (opts, warnings) = parse_query("?columns=2&spacing=4&width=900&height=700");
        assert!(warnings.is_empty());
        assert_eq!(opts.cols, Some(2));
        assert_eq!(opts.gap, Some(4));
        assert_eq!((opts.width, opts.height), (Some(900), Some(700)));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let (opts, _) = parse_query("ROWS=2&Cols=5");
        assert_eq!((opts.rows, opts.cols), (Some(2), Some(5)));
    }

    #[test]
    fn px_suffix_and_decimals() {
        let (opts, warnings) = parse_query("gap=8px&w=799.6&h=-3");
        assert!(warnings.is_empty());
        assert_eq!(opts.gap, Some(8));
        assert_eq!(opts.width, Some(800));
        assert_eq!(opts.height, Some(-3));
    }

    #[test]
    fn invalid_integer_warns() {
        let (opts, warnings) = parse_query("rows=many");
        assert_eq!(opts.rows, None);
        assert_eq!(
            warnings,
            [ParseWarning::ValueInvalid {
                key: "rows",
                value: String::from("many"),
                reason: "expected an integer",
            }]
        );
    }

    #[test]
    fn duplicate_key_last_wins() {
        let (opts, warnings) = parse_query("rows=2&rows=5");
        assert_eq!(opts.rows, Some(5));
        assert_eq!(
            warnings,
            [ParseWarning::DuplicateKey {
                key: String::from("rows"),
                value: String::from("5"),
            }]
        );
    }

    #[test]
    fn unknown_key_warns() {
        let (_, warnings) = parse_query("zoom=2");
        assert!(matches!(
            &warnings[..],
            [ParseWarning::KeyNotRecognized { key, .. }] if key == "zoom"
        ));
    }

    #[test]
    fn background_hex_and_encoded_hash() {
        let (opts, warnings) = parse_query("bg=%23ff000080");
        assert!(warnings.is_empty());
        assert_eq!(
            opts.background,
            Some(CanvasColor::Srgb {
                r: 255,
                g: 0,
                b: 0,
                a: 128
            })
        );
    }

    #[test]
    fn background_functional_with_spaces() {
        let (opts, warnings) = parse_query("background=rgb(1,+2,+3)");
        assert!(warnings.is_empty());
        assert_eq!(opts.background, Some(CanvasColor::rgb(1, 2, 3)));
    }

    #[test]
    fn invalid_background_warns() {
        let (opts, warnings) = parse_query("bg=notacolor");
        assert_eq!(opts.background, None);
        assert!(matches!(
            warnings[0],
            ParseWarning::ValueInvalid {
                key: "background",
                ..
            }
        ));
    }

    #[test]
    fn fit_and_format() {
        let (opts, warnings) = parse_query("fit=contain&format=image/jpeg&quality=80");
        assert!(warnings.is_empty());
        assert_eq!(opts.fit, Some(FitPolicy::Contain));
        assert_eq!(opts.format.as_deref(), Some("jpg"));
        assert_eq!(opts.quality, Some(80));

        let (_, warnings) = parse_query("format=webp&fit=stretch");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn percent_decode_cases() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%C3%A9"), "é");
    }
}
