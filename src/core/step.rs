//! Numbered-list parsing for research plans.
//!
//! Planner and replanner replies are free text; only lines that begin with
//! an enumerator (`1.`, `2)`, `10:`) become steps.

/// Parses a numbered list into step directives.
///
/// Each line is trimmed; lines whose first character is not an ASCII digit
/// are ignored. The leading number, one separator (`.`, `)` or `:`) and the
/// surrounding whitespace are stripped. Lines that are empty after stripping
/// are dropped.
///
/// # Examples
///
/// ```
/// use deepquest::core::parse_numbered_steps;
///
/// let steps = parse_numbered_steps("Plan:\n1. Find sources\n2) Compare them\n");
/// assert_eq!(steps, vec!["Find sources", "Compare them"]);
/// ```
#[must_use]
pub fn parse_numbered_steps(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_step_line).collect()
}

/// Drops repeated steps, keeping each step at its first position.
#[must_use]
pub fn dedup_steps(steps: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(steps.len());
    for step in steps {
        if !unique.contains(&step) {
            unique.push(step);
        }
    }
    unique
}

/// Strips the enumerator from a single plan line.
fn parse_step_line(line: &str) -> Option<String> {
    let line = line.trim();
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest
        .strip_prefix(&['.', ')', ':'][..])
        .unwrap_or(rest)
        .trim();

    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}
