//! Glob to capture-regex translation
//!
//! Rename templates refer to the text matched by each wildcard in an asset
//! pattern (`$1`, `$2`, ...). To recover that text, the glob is rewritten
//! into an anchored regex with one capture group per wildcard construct,
//! numbered left to right:
//!
//! ```text
//! build-*.tar.gz   =>  ^build\-([^/]*)\.tar\.gz$
//! report-??.txt    =>  ^report\-([^/])([^/])\.txt$
//! out/[abc].zip    =>  ^out/([abc])\.zip$
//! ```
//!
//! The rewrite follows the same matching rules as the glob expansion itself
//! (`*` and `?` never cross a path separator, `[!...]` negates a class), so
//! a capture is always exactly the text the wildcard matched. Everything
//! else is matched literally.
//!
//! Template substitution uses positional `$1`, `$2`, ... placeholders. A
//! placeholder ends at the first non-digit, so `release_$1_bundle` refers to
//! capture 1; `${1}` is the equivalent braced form, and `$$` writes a
//! literal dollar.

use glob::Pattern;
use regex::Regex;

use crate::error::DistError;

/// An asset glob compiled together with its capture regex
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    glob: String,
    regex: Regex,
    captures: usize,
}

impl WildcardPattern {
    /// Compile a glob into a pattern with capture groups
    pub fn compile(glob: &str) -> Result<Self, DistError> {
        if let Err(err) = Pattern::new(glob) {
            return Err(DistError::config_error(format!(
                "invalid asset pattern '{}': {}",
                glob, err
            )));
        }

        let (source, captures) = glob_to_regex(glob)?;
        let regex = Regex::new(&source).map_err(|e| {
            DistError::config_error(format!(
                "cannot compile capture pattern for '{}': {}",
                glob, e
            ))
        })?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
            captures,
        })
    }

    /// The original glob
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// The derived capture regex
    pub fn regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of capture groups (one per wildcard)
    pub fn capture_count(&self) -> usize {
        self.captures
    }

    /// Substitute the wildcard captures of `matched` into `template`
    pub fn rename(&self, matched: &str, template: &str) -> Result<String, DistError> {
        let caps = self.regex.captures(matched).ok_or_else(|| {
            DistError::config_error(format!(
                "asset '{}' does not match pattern '{}'",
                matched, self.glob
            ))
        })?;

        let mut name = String::new();
        caps.expand(&normalize_placeholders(template), &mut name);
        Ok(name)
    }
}

/// Rewrite each positional `$N` to `${N}` before capture expansion
///
/// Expansion reads the longest run of `[0-9A-Za-z_]` after `$` as a group
/// name, so an unbraced `$1_x` would look up a group named `1_x` instead of
/// capture 1. `$$` escapes pass through untouched.
fn normalize_placeholders(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 4);
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                out.push_str("$$");
                chars.next();
            }
            Some(c) if c.is_ascii_digit() => {
                out.push_str("${");
                while let Some(c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    out.push(*c);
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Rewrite a glob into an anchored regex, one capture group per wildcard
///
/// Returns the regex source and the number of capture groups.
pub fn glob_to_regex(glob: &str) -> Result<(String, usize), DistError> {
    let chars: Vec<char> = glob.chars().collect();
    let mut regex = String::with_capacity(glob.len() + 8);
    let mut captures = 0;

    regex.push('^');
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    return Err(DistError::config_error(format!(
                        "recursive wildcard '**' is not supported in asset pattern '{}'",
                        glob
                    )));
                }
                regex.push_str("([^/]*)");
                captures += 1;
                i += 1;
            }
            '?' => {
                regex.push_str("([^/])");
                captures += 1;
                i += 1;
            }
            '[' => {
                i = translate_class(&chars, i, glob, &mut regex)? + 1;
                captures += 1;
            }
            ch => {
                regex.push_str(&regex::escape(&ch.to_string()));
                i += 1;
            }
        }
    }
    regex.push('$');

    Ok((regex, captures))
}

/// Translate one `[...]` class, returning the index of its closing bracket
fn translate_class(
    chars: &[char],
    start: usize,
    glob: &str,
    out: &mut String,
) -> Result<usize, DistError> {
    out.push_str("([");

    let mut i = start + 1;
    if chars.get(i) == Some(&'!') {
        out.push('^');
        i += 1;
    }

    // a `]` directly after `[` or `[!` is a member, not the closing bracket
    let mut first = true;
    while let Some(&ch) = chars.get(i) {
        if ch == ']' && !first {
            out.push_str("])");
            return Ok(i);
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            ']' => out.push_str("\\]"),
            '[' => out.push_str("\\["),
            '^' if first => out.push_str("\\^"),
            _ => out.push(ch),
        }
        first = false;
        i += 1;
    }

    Err(DistError::config_error(format!(
        "unclosed character class in asset pattern '{}'",
        glob
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern_has_no_captures() {
        let (regex, captures) = glob_to_regex("app.zip").unwrap();
        assert_eq!(regex, "^app\\.zip$");
        assert_eq!(captures, 0);
    }

    #[test]
    fn test_star_becomes_capture() {
        let (regex, captures) = glob_to_regex("build-*.tar.gz").unwrap();
        assert_eq!(regex, "^build\\-([^/]*)\\.tar\\.gz$");
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_question_mark_captures_one_character() {
        let (regex, captures) = glob_to_regex("report-??.txt").unwrap();
        assert_eq!(regex, "^report\\-([^/])([^/])\\.txt$");
        assert_eq!(captures, 2);
    }

    #[test]
    fn test_character_class() {
        let (regex, captures) = glob_to_regex("out/[abc].zip").unwrap();
        assert_eq!(regex, "^out/([abc])\\.zip$");
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_negated_class() {
        let (regex, _) = glob_to_regex("[!0-9]*.log").unwrap();
        assert_eq!(regex, "^([^0-9])([^/]*)\\.log$");
    }

    #[test]
    fn test_class_with_leading_bracket_member() {
        // `]` right after `[` is a member of the class
        let (regex, captures) = glob_to_regex("[]a]x").unwrap();
        assert_eq!(regex, "^([\\]a])x$");
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_wildcards_do_not_cross_separators() {
        let pattern = WildcardPattern::compile("dist/*.zip").unwrap();
        assert!(pattern.regex_str().contains("[^/]"));

        let caps = Regex::new(pattern.regex_str()).unwrap();
        assert!(caps.is_match("dist/app.zip"));
        assert!(!caps.is_match("dist/nested/app.zip"));
    }

    #[test]
    fn test_recursive_wildcard_is_rejected() {
        let err = glob_to_regex("dist/**/*.zip").unwrap_err();
        assert!(err.to_string().contains("recursive wildcard"));
    }

    #[test]
    fn test_unclosed_class_is_rejected() {
        assert!(glob_to_regex("file[abc").is_err());
        assert!(WildcardPattern::compile("file[abc").is_err());
    }

    #[test]
    fn test_compile_rejects_invalid_glob() {
        // glob syntax validation runs before the rewrite
        let err = WildcardPattern::compile("a/**b").unwrap_err();
        assert!(err.to_string().contains("invalid asset pattern"));
    }

    #[test]
    fn test_rename_substitutes_capture() {
        let pattern = WildcardPattern::compile("build-*.tar.gz").unwrap();
        let name = pattern
            .rename("build-linux.tar.gz", "release-$1.tar.gz")
            .unwrap();
        assert_eq!(name, "release-linux.tar.gz");
    }

    #[test]
    fn test_rename_with_multiple_captures() {
        let pattern = WildcardPattern::compile("?-*.zip").unwrap();
        let name = pattern.rename("a-beta.zip", "$2_$1.zip").unwrap();
        assert_eq!(name, "beta_a.zip");
    }

    #[test]
    fn test_rename_repeats_placeholder() {
        let pattern = WildcardPattern::compile("*.bin").unwrap();
        let name = pattern.rename("core.bin", "$1-$1").unwrap();
        assert_eq!(name, "core-core");
    }

    #[test]
    fn test_rename_with_braced_placeholder() {
        let pattern = WildcardPattern::compile("v*.txt").unwrap();
        let name = pattern.rename("v42.txt", "build${1}final.txt").unwrap();
        assert_eq!(name, "build42final.txt");
    }

    #[test]
    fn test_rename_placeholder_followed_by_underscore() {
        // `_` must not extend the placeholder into a group name
        let pattern = WildcardPattern::compile("build-*.tar.gz").unwrap();
        let name = pattern
            .rename("build-linux.tar.gz", "release_$1_bundle.tar.gz")
            .unwrap();
        assert_eq!(name, "release_linux_bundle.tar.gz");
    }

    #[test]
    fn test_rename_literal_dollar_escape() {
        let pattern = WildcardPattern::compile("*.bin").unwrap();
        let name = pattern.rename("core.bin", "$$1-$1.bin").unwrap();
        assert_eq!(name, "$1-core.bin");
    }

    #[test]
    fn test_normalize_placeholders() {
        assert_eq!(normalize_placeholders("release-$1.zip"), "release-${1}.zip");
        assert_eq!(normalize_placeholders("$2_$1"), "${2}_${1}");
        assert_eq!(normalize_placeholders("a${12}b$3c"), "a${12}b${3}c");
        assert_eq!(normalize_placeholders("$$1 plain $"), "$$1 plain $");
    }

    #[test]
    fn test_rename_requires_matching_text() {
        let pattern = WildcardPattern::compile("build-*.tar.gz").unwrap();
        let err = pattern.rename("other.zip", "release-$1.tar.gz").unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_capture_count() {
        let pattern = WildcardPattern::compile("[ab]-*-?.zip").unwrap();
        assert_eq!(pattern.capture_count(), 3);
    }
}
