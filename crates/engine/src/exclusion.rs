//! Directory-name exclusion patterns.
//!
//! Patterns use the `fnmatch` dialect and are matched against a bare
//! directory name, never a full path. Matching is case-sensitive. Only `*`,
//! `?`, `[...]` and `[!...]` are special; braces, backslashes, a leading `^`
//! inside brackets and an unclosed `[` are all literal.

use albumsync_core::{SyncError, SyncResult};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled, ordered set of exclusion globs.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl ExclusionSet {
    pub fn new<I, S>(patterns: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(&fnmatch_to_glob(pattern))
                .case_insensitive(false)
                .literal_separator(false)
                .backslash_escape(true)
                .build()
                .map_err(|source| SyncError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|source| SyncError::Pattern {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self { patterns, set })
    }

    /// An empty set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    /// The first configured pattern matching `name`, for log context.
    pub fn matching_pattern(&self, name: &str) -> Option<&str> {
        self.set
            .matches(name)
            .into_iter()
            .min()
            .map(|i| self.patterns[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Rewrite an `fnmatch` pattern into an equivalent globset pattern compiled
/// with `backslash_escape(true)`.
///
/// Bracket scanning follows `fnmatch`: an optional `!`, then a `]` that is
/// part of the set, then everything up to the next `]`. With no closing `]`
/// the `[` is an ordinary character.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                // Runs of stars mean the same thing and globset is picky about `**`.
                if !out.ends_with('*') {
                    out.push('*');
                }
            }
            '?' => out.push('?'),
            '[' => {
                let mut j = i;
                if j < n && chars[j] == '!' {
                    j += 1;
                }
                if j < n && chars[j] == ']' {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }
                if j >= n {
                    out.push_str("\\[");
                    continue;
                }
                let body: String = chars[i..j].iter().collect();
                i = j + 1;
                push_class(&mut out, &body);
            }
            '\\' | '{' | '}' | ']' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Emit one closed bracket expression. globset reads a leading `^` as
/// negation where `fnmatch` reads it as a literal, so it is moved to the
/// end of the set, ahead of any trailing `-`. Inside brackets globset takes
/// `\` literally, as `fnmatch` does.
fn push_class(out: &mut String, body: &str) {
    let Some(rest) = body.strip_prefix('^') else {
        out.push('[');
        out.push_str(body);
        out.push(']');
        return;
    };

    let (rest, dash) = match rest.strip_suffix('-') {
        Some(rest) => (rest, true),
        None => (rest, false),
    };
    // `!` cannot lead either, or globset negates the set.
    let (members, bang) = match rest.strip_prefix('!') {
        Some(members) => (members, true),
        None => (rest, false),
    };

    if members.is_empty() {
        let mut literals = vec!["^"];
        if bang {
            literals.push("!");
        }
        if dash {
            literals.push("-");
        }
        if literals.len() == 1 {
            out.push('^');
        } else {
            out.push('{');
            out.push_str(&literals.join(","));
            out.push('}');
        }
        return;
    }

    out.push('[');
    out.push_str(members);
    if bang {
        out.push('!');
    }
    out.push('^');
    if dash {
        out.push('-');
    }
    out.push(']');
}
