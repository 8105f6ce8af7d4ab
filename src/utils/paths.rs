//! Path normalization for paths reported by the compiler.

/// Normalize a compiler-reported path
///
/// Backslashes become `/`, repeated separators collapse, and `.`/`..`
/// segments are resolved lexically. A leading `/` or drive prefix is kept.
///
/// # Example
/// ```ignore
/// assert_eq!(normalize_path("C:\\src\\.\\a.ts"), "C:/src/a.ts");
/// ```
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." && !is_drive(last) => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a.ts"), "/a.ts");
        assert_eq!(normalize_path("/p//src/./x/../a.ts"), "/p/src/a.ts");
        assert_eq!(normalize_path("C:\\p\\src\\..\\a.ts"), "C:/p/a.ts");
        assert_eq!(normalize_path("../lib/a.d.ts"), "../lib/a.d.ts");
        assert_eq!(normalize_path("/../a.ts"), "/a.ts");
    }
}
