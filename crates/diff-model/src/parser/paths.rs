//! Path token handling for diff headers.
//!
//! Git quotes paths containing special characters (`"a/with \"quote\""`,
//! octal escapes for non-ASCII bytes) and leaves everything else bare, which
//! makes `diff --git a/x y b/x y` ambiguous. These helpers resolve both cases.

/// Path that stands for "no file" in `---`/`+++` lines.
pub const DEV_NULL: &str = "/dev/null";

/// Split the remainder of a `diff --git ` line into its old and new path
/// tokens, without stripping prefixes.
pub fn split_header_paths(rest: &str) -> Option<(String, String)> {
    if rest.contains('\0') {
        let mut tokens = rest.split('\0').filter(|t| !t.is_empty());
        let old = tokens.next()?;
        let new = tokens.next()?;
        return Some((unquote(old), unquote(new)));
    }

    if rest.starts_with('"') {
        let (old, remainder) = parse_quoted(rest)?;
        let new = remainder.strip_prefix(' ').unwrap_or(remainder);
        if new.is_empty() {
            return None;
        }
        return Some((old, unquote(new)));
    }

    if rest.ends_with('"') {
        for (pos, _) in rest.match_indices(" \"") {
            if let Some((new, tail)) = parse_quoted(&rest[pos + 1..]) {
                if tail.is_empty() {
                    return Some((rest[..pos].to_string(), new));
                }
            }
        }
    }

    split_unquoted(rest).map(|(old, new)| (old.to_string(), new.to_string()))
}

/// Both tokens unquoted: prefer the split where both sides name the same
/// path, then the first " b/", then the first space.
fn split_unquoted(rest: &str) -> Option<(&str, &str)> {
    let len = rest.len();
    if len % 2 == 1 && rest.is_char_boundary(len / 2) {
        let mid = len / 2;
        if rest.as_bytes()[mid] == b' ' {
            let (old, new) = (&rest[..mid], &rest[mid + 1..]);
            if strip_any_prefix(old) == strip_any_prefix(new) {
                return Some((old, new));
            }
        }
    }

    if let Some(pos) = rest.find(" b/") {
        return Some((&rest[..pos], &rest[pos + 1..]));
    }

    rest.split_once(' ')
}

fn strip_any_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

/// Parse the path of a `--- ` or `+++ ` line: unquote it and drop a
/// tab-separated timestamp if present.
pub fn marker_path(raw: &str) -> String {
    if raw.starts_with('"') {
        if let Some((path, _)) = parse_quoted(raw) {
            return path;
        }
    }
    let path = raw.split('\t').next().unwrap_or(raw);
    path.trim_end().to_string()
}

/// Remove a conventional side prefix (`a/` or `b/`) from a path token.
pub fn strip_side_prefix(path: String, prefix: &str) -> String {
    match path.strip_prefix(prefix) {
        Some(stripped) => stripped.to_string(),
        None => path,
    }
}

/// Unquote a token if it is a quoted C-style string, otherwise return it as is.
pub fn unquote(token: &str) -> String {
    if token.starts_with('"') {
        if let Some((path, tail)) = parse_quoted(token) {
            if tail.trim().is_empty() {
                return path;
            }
        }
    }
    token.to_string()
}

/// Parse a quoted string at the start of `input` (which must begin with `"`).
///
/// Returns the unescaped contents and the rest of the input after the
/// closing quote.
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let decoded = String::from_utf8_lossy(&out).into_owned();
                return Some((decoded, &body[i + 1..]));
            }
            b'\\' => {
                let next = *bytes.get(i + 1)?;
                match next {
                    b'0'..=b'7' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 {
                            match bytes.get(i + 1 + digits) {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xff) as u8);
                        i += 1 + digits;
                        continue;
                    }
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'r' => out.push(b'\r'),
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'v' => out.push(0x0b),
                    other => out.push(other),
                }
                i += 2;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_paths() {
        assert_eq!(
            split_header_paths("a/src/main.rs b/src/main.rs"),
            Some(("a/src/main.rs".into(), "b/src/main.rs".into()))
        );
    }

    #[test]
    fn test_split_paths_with_spaces() {
        assert_eq!(
            split_header_paths("a/my file.txt b/my file.txt"),
            Some(("a/my file.txt".into(), "b/my file.txt".into()))
        );
        // Renamed, so the halves differ: fall back to the " b/" separator
        assert_eq!(
            split_header_paths("a/old name.txt b/new.txt"),
            Some(("a/old name.txt".into(), "b/new.txt".into()))
        );
    }

    #[test]
    fn test_split_quoted_paths() {
        assert_eq!(
            split_header_paths(r#""a/tab\there" "b/tab\there""#),
            Some(("a/tab\there".into(), "b/tab\there".into()))
        );
        assert_eq!(
            split_header_paths(r#"a/plain "b/quo\"te""#),
            Some(("a/plain".into(), "b/quo\"te".into()))
        );
    }

    #[test]
    fn test_octal_escapes_decode_utf8() {
        // "é" is 0xC3 0xA9
        assert_eq!(unquote(r#""caf\303\251.txt""#), "café.txt");
    }

    #[test]
    fn test_nul_separated_tokens() {
        assert_eq!(
            split_header_paths("a/x\0b/y"),
            Some(("a/x".into(), "b/y".into()))
        );
    }

    #[test]
    fn test_marker_path() {
        assert_eq!(marker_path("a/x.txt"), "a/x.txt");
        assert_eq!(marker_path("a/x.txt\t2024-01-01 10:00:00"), "a/x.txt");
        assert_eq!(marker_path(r#""b/sp ace""#), "b/sp ace");
        assert_eq!(marker_path(DEV_NULL), DEV_NULL);
    }

    #[test]
    fn test_strip_side_prefix() {
        assert_eq!(strip_side_prefix("a/src/main.rs".into(), "a/"), "src/main.rs");
        assert_eq!(strip_side_prefix("src/main.rs".into(), "b/"), "src/main.rs");
    }
}
