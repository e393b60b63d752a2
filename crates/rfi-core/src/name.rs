/// Normalize a keyword or library name for lookups.
///
/// Matching ignores case, spaces, and underscores, so `Log Many`, `log_many`
/// and `LOGMANY` all resolve to the same keyword.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn same_name(a: &str, b: &str) -> bool {
    let mut a = a
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase);
    let mut b = b
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase);
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}
