use crate::ClubConfig;

/// Upper-case and collapse every run of whitespace into a single space.
/// Leading/trailing whitespace is collapsed too, not trimmed.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.extend(c.to_uppercase());
            in_space = false;
        }
    }
    out
}

/// Whether `name` belongs to the tracked club: its normalized form contains the
/// normalized form of any configured pattern. Empty names never match, and
/// blank patterns are ignored.
pub fn is_tracked_team(name: &str, config: &ClubConfig) -> bool {
    if name.is_empty() {
        return false;
    }
    let normalized = normalize_name(name);
    config
        .match_patterns()
        .iter()
        // A blank pattern is a substring of every name; skip it instead of tracking everyone.
        .filter(|pattern| !pattern.trim().is_empty())
        .any(|pattern| normalized.contains(&normalize_name(pattern)))
}

/// First `#<digits>` tag in a team name, e.g. "12" for "RM VOLLEY #12".
pub fn category_tag(name: &str) -> Option<&str> {
    name.match_indices('#').find_map(|(idx, _)| {
        let rest = &name[idx + 1..];
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Category label for the team's `#<digits>` tag, or "" when there is no tag or
/// the tag is not configured.
pub fn derive_category(name: &str, config: &ClubConfig) -> String {
    category_tag(name)
        .and_then(|tag| config.category_by_tag.get(tag))
        .cloned()
        .unwrap_or_default()
}
