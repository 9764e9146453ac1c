//! Pattern compilation and path matching.
//!
//! Patterns are `/`-separated templates. A segment is either literal text or
//! a placeholder occupying the whole segment:
//!
//! - `{name}` matches one segment (`[^/]+`)
//! - `{name:regex}` matches `regex`, which may span segments (`{rest:.+}`)
//!
//! The matcher is a capability: the registry only sees [`PathMatcher`] and
//! [`CompiledPattern`], so a host can plug in its own template engine.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::ParamVec;

/// Compiles route patterns.
pub trait PathMatcher: Send + Sync {
    /// # Errors
    ///
    /// Returns a human-readable reason when the pattern cannot be compiled.
    fn compile(&self, pattern: &str) -> Result<Box<dyn CompiledPattern>, String>;
}

/// A pattern ready for matching.
pub trait CompiledPattern: Send + Sync + fmt::Debug {
    /// Captured placeholders when `path` matches, `None` otherwise.
    fn captures(&self, path: &str) -> Option<ParamVec>;
}

/// One parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder { name: &'a str, regex: Option<&'a str> },
}

/// Split on `/` outside of braces, so `{id:[0-9]{2}}` stays one segment.
fn split_segments(pattern: &str) -> Result<Vec<&str>, String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in pattern.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced '}}' at byte {i}"))?;
            }
            '/' if depth == 0 => {
                segments.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unclosed '{'".to_string());
    }
    segments.push(&pattern[start..]);
    Ok(segments)
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_segment(segment: &str) -> Result<Segment<'_>, String> {
    if !segment.contains(['{', '}']) {
        return Ok(Segment::Literal(segment));
    }
    let inner = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| format!("placeholder must span the whole segment: '{segment}'"))?;
    let (name, regex) = match inner.split_once(':') {
        Some((name, regex)) if !regex.is_empty() => (name, Some(regex)),
        Some(_) => return Err(format!("empty regex in placeholder '{segment}'")),
        None => (inner, None),
    };
    if !is_valid_name(name) {
        return Err(format!("invalid placeholder name '{name}'"));
    }
    Ok(Segment::Placeholder { name, regex })
}

fn parse(pattern: &str) -> Result<Vec<Segment<'_>>, String> {
    if !pattern.is_empty() && !pattern.starts_with('/') {
        return Err("pattern must be empty or start with '/'".to_string());
    }
    split_segments(pattern)?
        .into_iter()
        .skip(1)
        .map(parse_segment)
        .collect()
}

/// Validation performed at registration time: the pattern must parse and
/// every placeholder regex must compile.
///
/// # Errors
///
/// Returns the reason the pattern is malformed.
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    for segment in parse(pattern)? {
        if let Segment::Placeholder {
            name,
            regex: Some(regex),
        } = segment
        {
            Regex::new(regex).map_err(|e| format!("invalid regex for '{name}': {e}"))?;
        }
    }
    Ok(())
}

/// Default matcher: literal segments are escaped, placeholders become regex
/// groups. Patterns without placeholders are compared as plain strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexPathMatcher;

impl PathMatcher for RegexPathMatcher {
    fn compile(&self, pattern: &str) -> Result<Box<dyn CompiledPattern>, String> {
        let segments = parse(pattern)?;
        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Ok(Box::new(StaticPattern {
                path: normalize_root(pattern).to_string(),
            }));
        }

        // Groups get synthetic names so user regexes with their own groups,
        // or repeated placeholder names, do not shift captures.
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        let mut names: Vec<Arc<str>> = Vec::new();
        for segment in &segments {
            source.push('/');
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Placeholder { name, regex } => {
                    source.push_str(&format!("(?P<p{}>", names.len()));
                    source.push_str(regex.unwrap_or("[^/]+"));
                    source.push(')');
                    names.push(Arc::from(*name));
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| e.to_string())?;
        Ok(Box::new(RegexPattern { regex, names }))
    }
}

fn normalize_root(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[derive(Debug)]
struct StaticPattern {
    path: String,
}

impl CompiledPattern for StaticPattern {
    fn captures(&self, path: &str) -> Option<ParamVec> {
        (normalize_root(path) == self.path).then(ParamVec::new)
    }
}

#[derive(Debug)]
struct RegexPattern {
    regex: Regex,
    names: Vec<Arc<str>>,
}

impl CompiledPattern for RegexPattern {
    fn captures(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(m) = caps.name(&format!("p{i}")) {
                params.push((Arc::clone(name), m.as_str().to_string()));
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> Box<dyn CompiledPattern> {
        RegexPathMatcher.compile(p).unwrap()
    }

    fn param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
        params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn static_patterns_match_exactly() {
        let p = compile("/users");
        assert!(p.captures("/users").is_some());
        assert!(p.captures("/users/1").is_none());
        assert!(p.captures("/Users").is_none());
    }

    #[test]
    fn empty_pattern_is_root() {
        let p = compile("");
        assert!(p.captures("/").is_some());
        assert!(p.captures("").is_some());
    }

    #[test]
    fn placeholders_capture_segments() {
        let p = compile("/users/{id}/posts/{post_id}");
        let params = p.captures("/users/42/posts/7").unwrap();
        assert_eq!(param(&params, "id"), Some("42"));
        assert_eq!(param(&params, "post_id"), Some("7"));
        assert!(p.captures("/users/42/posts").is_none());
    }

    #[test]
    fn regex_placeholders_constrain_matches() {
        let p = compile("/items/{id:[0-9]{1,3}}");
        assert!(p.captures("/items/123").is_some());
        assert!(p.captures("/items/1234").is_none());
        assert!(p.captures("/items/abc").is_none());

        let rest = compile("/files/{path:.+}");
        let params = rest.captures("/files/a/b/c.txt").unwrap();
        assert_eq!(param(&params, "path"), Some("a/b/c.txt"));
    }

    #[test]
    fn literal_segments_are_escaped() {
        let p = compile("/v1.0/{id}");
        assert!(p.captures("/v1.0/x").is_some());
        assert!(p.captures("/v1x0/x").is_none());
    }

    #[test]
    fn user_groups_do_not_shift_captures() {
        let p = compile("/{kind:(a|b)}/{id}");
        let params = p.captures("/b/9").unwrap();
        assert_eq!(param(&params, "kind"), Some("b"));
        assert_eq!(param(&params, "id"), Some("9"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(validate_pattern("users").is_err());
        assert!(validate_pattern("/users/{id").is_err());
        assert!(validate_pattern("/users/id}").is_err());
        assert!(validate_pattern("/users/x{id}").is_err());
        assert!(validate_pattern("/users/{1id}").is_err());
        assert!(validate_pattern("/users/{id:}").is_err());
        assert!(validate_pattern("/x/{id:[}").is_err());
        assert!(validate_pattern("/x/{id:[0-9]+}").is_ok());
        assert!(validate_pattern("/users/{id}").is_ok());
        assert!(validate_pattern("").is_ok());
        assert!(RegexPathMatcher.compile("/x/{id:[}").is_err());
    }
}
