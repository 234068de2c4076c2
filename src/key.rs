//! Lookup-key derivation for response-code cases and groups.
//!
//! Every function here is pure and total.

/// Suffix stripped from group type names when no other suffix is configured.
pub const DEFAULT_GROUP_SUFFIX: &str = "RespCode";

/// Converts a case name to its lower-snake lookup key.
///
/// An underscore is inserted before every uppercase letter that is not the
/// first character, the result is lowercased and runs of underscores are
/// collapsed.
///
/// ```rust
/// use respcode::key::case_key;
/// assert_eq!(case_key("AppMissingHeaders"), "app_missing_headers");
/// assert_eq!(case_key("user_not_found"), "user_not_found");
/// ```
pub fn case_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
    }
    collapse_underscores(&out)
}

/// Converts a group type name (e.g. `MainRespCode`) to its catalog identifier
/// (e.g. `main`).
///
/// Any leading path (`a::b::`, `A\B\`, `a/b/`) is dropped and `suffix` is
/// stripped case-insensitively before [`case_key`] is applied, so the function
/// is idempotent on its own output.
pub fn group_key(type_name: &str, suffix: &str) -> String {
    let short = type_name
        .rsplit(['\\', '/', ':'])
        .next()
        .unwrap_or(type_name)
        .trim();
    case_key(strip_suffix_ignore_case(short, suffix))
}

/// Strips `suffix` from the end of `name`, ignoring ASCII case.
pub fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() || name.len() < suffix.len() {
        return name;
    }
    let split = name.len() - suffix.len();
    match (name.get(..split), name.get(split..)) {
        (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(suffix) => head,
        _ => name,
    }
}

/// Turns a lookup key into readable text: `user_not_found` → `User not found`.
pub fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn collapse_underscores(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_underscore = false;
    for ch in input.chars() {
        if ch == '_' {
            if previous_underscore {
                continue;
            }
            previous_underscore = true;
        } else {
            previous_underscore = false;
        }
        out.push(ch);
    }
    out
}
