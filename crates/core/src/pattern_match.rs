//! Pattern matching for LIKE expressions.
//!
//! SQL LIKE has two wildcards:
//! - `%` matches zero or more characters
//! - `_` matches exactly one character
//!
//! Matching is **case-sensitive** and operates on Unicode scalar values.

/// SQL LIKE pattern matching.
///
/// ```
/// use tabula_core::pattern_match::like;
/// assert!(like("hello", "h%o"));
/// assert!(like("hello", "_ello"));
/// assert!(!like("hello", "world"));
/// assert!(!like("Hello", "hello"));
/// ```
pub fn like(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();

    let (mut vi, mut pi) = (0, 0);
    // Position of the last `%` seen and the value index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while vi < v.len() {
        match p.get(pi) {
            Some('%') => {
                backtrack = Some((pi, vi));
                pi += 1;
            }
            Some('_') => {
                vi += 1;
                pi += 1;
            }
            Some(&ch) if ch == v[vi] => {
                vi += 1;
                pi += 1;
            }
            _ => match backtrack {
                // Let the last `%` absorb one more character and retry.
                Some((star_pi, star_vi)) => {
                    backtrack = Some((star_pi, star_vi + 1));
                    pi = star_pi + 1;
                    vi = star_vi + 1;
                }
                None => return false,
            },
        }
    }

    p[pi..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_prefix_suffix_contains() {
        assert!(like("foo", "foo%"));
        assert!(like("foobar", "foo%"));
        assert!(!like("barfoo", "foo%"));

        assert!(like("barfoo", "%foo"));
        assert!(!like("foobar", "%foo"));

        assert!(like("foobar", "%foo%"));
        assert!(like("barfoo", "%foo%"));
        assert!(!like("bar", "%foo%"));
    }

    #[test]
    fn test_like_exact() {
        assert!(like("foo", "foo"));
        assert!(!like("foobar", "foo"));
        assert!(like("", ""));
        assert!(like("", "%"));
        assert!(!like("", "_"));
    }

    #[test]
    fn test_like_underscore() {
        assert!(like("cat", "c_t"));
        assert!(!like("ct", "c_t"));
        assert!(like("cart", "c__t"));
    }

    #[test]
    fn test_like_backtracking() {
        assert!(like("aXbXc", "%X%c"));
        assert!(like("mississippi", "m%iss%pi"));
        assert!(!like("mississippi", "m%iss%px"));
        assert!(like("abcabc", "%abc"));
    }

    #[test]
    fn test_like_unicode_and_case() {
        assert!(like("héllo", "h_llo"));
        assert!(!like("FOO", "foo"));
    }
}
