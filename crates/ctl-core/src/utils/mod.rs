//! Small helpers shared across the crate.

/// Match `value` against `pattern`, where `*` matches any run of characters.
///
/// ```
/// use ctl_core::utils::str_is;
///
/// assert!(str_is("local*", "local-dev"));
/// assert!(!str_is("prod", "production"));
/// ```
pub fn str_is(pattern: &str, value: &str) -> bool {
    if pattern == value {
        return true;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();

    let (mut p, mut v) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star, matched)) = backtrack {
            // let the last star absorb one more character
            p = star + 1;
            v = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// `true` if `value` matches any of `patterns`. See [`str_is`].
pub fn str_is_any<S: AsRef<str>>(patterns: &[S], value: &str) -> bool {
    patterns.iter().any(|pattern| str_is(pattern.as_ref(), value))
}
