//! Glob pattern matching for key listings
//!
//! Supported syntax:
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `\x` matches `x` literally (so `\*` is a literal star)
//! - anything else matches itself
//!
//! Matching is iterative with a single backtrack point (the most recent
//! `*`), so it runs in O(pattern × key) worst case. It walks the key in
//! place and does not allocate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

/// A compiled glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    tokens: Vec<Token>,

    /// Literal characters before the first wildcard
    prefix: String,
}

impl GlobPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            let token = match c {
                // A trailing backslash has nothing to escape and stands for itself.
                '\\' => Token::Literal(chars.next().unwrap_or('\\')),
                '?' => Token::AnyOne,
                '*' => {
                    if tokens.last() == Some(&Token::AnyRun) {
                        continue;
                    }
                    Token::AnyRun
                }
                other => Token::Literal(other),
            };
            tokens.push(token);
        }

        let prefix = tokens
            .iter()
            .map_while(|t| match t {
                Token::Literal(c) => Some(*c),
                _ => None,
            })
            .collect();

        Self { tokens, prefix }
    }

    /// Literal text every matching key starts with
    pub fn literal_prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether the pattern contains `*` or `?`
    pub fn has_wildcards(&self) -> bool {
        self.tokens.iter().any(|t| !matches!(t, Token::Literal(_)))
    }

    /// Test a key against the pattern
    pub fn matches(&self, key: &str) -> bool {
        let tokens = &self.tokens;

        let mut t = 0;
        // Byte offset into `key`, always on a char boundary
        let mut k = 0;
        // (token index after the last `*`, key offset that `*` has consumed up to)
        let mut backtrack: Option<(usize, usize)> = None;

        while let Some(c) = key[k..].chars().next() {
            match tokens.get(t) {
                Some(Token::AnyRun) => {
                    t += 1;
                    backtrack = Some((t, k));
                }
                Some(Token::AnyOne) => {
                    t += 1;
                    k += c.len_utf8();
                }
                Some(Token::Literal(l)) if *l == c => {
                    t += 1;
                    k += c.len_utf8();
                }
                _ => {
                    let Some((after_star, consumed)) = backtrack else {
                        return false;
                    };
                    let Some(swallowed) = key[consumed..].chars().next() else {
                        return false;
                    };
                    // Let the `*` swallow one more character and retry.
                    t = after_star;
                    k = consumed + swallowed.len_utf8();
                    backtrack = Some((after_star, k));
                }
            }
        }

        tokens[t..].iter().all(|tok| *tok == Token::AnyRun)
    }
}
