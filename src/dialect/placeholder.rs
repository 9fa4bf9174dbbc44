//! Neutral placeholder rewriting
//!
//! Statements are assembled with [`MARK`] for every bound value. Dialects
//! whose drivers want a different syntax rewrite the markers here, in one
//! pass, without parsing SQL: the caller guarantees the marker never occurs
//! inside a literal or identifier.

use crate::dialect::tables::MARK;
use std::borrow::Cow;
use std::fmt::Write;

/// Native placeholder syntax of a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` left as is
    Question,
    /// Prefix followed by a 1-based index, e.g. `$1` or `:1`
    Numbered(char),
    /// A fixed token repeated for every marker
    Fixed(&'static str),
}

/// Number of neutral markers in `query`
pub fn count_marks(query: &str) -> usize {
    query.chars().filter(|c| *c == MARK).count()
}

/// Rewrite every marker in `query` into `style`
///
/// Order and count are preserved; numbering restarts at 1 on every call.
/// Returns the input untouched when there is nothing to rewrite.
pub fn rewrite_marks(query: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if style == PlaceholderStyle::Question {
        return Cow::Borrowed(query);
    }

    let num = count_marks(query);
    if num == 0 {
        return Cow::Borrowed(query);
    }

    let extra = match style {
        PlaceholderStyle::Numbered(_) => num * (1 + digits(num)),
        PlaceholderStyle::Fixed(token) => num * token.len(),
        PlaceholderStyle::Question => 0,
    };
    let mut out = String::with_capacity(query.len() + extra);

    let mut index = 1usize;
    for c in query.chars() {
        if c != MARK {
            out.push(c);
            continue;
        }
        match style {
            PlaceholderStyle::Numbered(prefix) => {
                out.push(prefix);
                let _ = write!(out, "{}", index);
            }
            PlaceholderStyle::Fixed(token) => out.push_str(token),
            PlaceholderStyle::Question => out.push(MARK),
        }
        index += 1;
    }

    log::trace!("rewrote {} placeholders", num);
    Cow::Owned(out)
}

fn digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_rewrite() {
        let out = rewrite_marks("WHERE a=? AND b=?", PlaceholderStyle::Numbered('$'));
        assert_eq!(out, "WHERE a=$1 AND b=$2");

        let out = rewrite_marks("VALUES (?, ?, ?)", PlaceholderStyle::Numbered(':'));
        assert_eq!(out, "VALUES (:1, :2, :3)");
    }

    #[test]
    fn test_numbering_restarts_per_call() {
        let style = PlaceholderStyle::Numbered('$');
        assert_eq!(rewrite_marks("a=?", style), "a=$1");
        assert_eq!(rewrite_marks("b=?", style), "b=$1");
    }

    #[test]
    fn test_zero_marks_borrowed() {
        let query = "SELECT 1";
        let out = rewrite_marks(query, PlaceholderStyle::Numbered('$'));
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, query);
    }

    #[test]
    fn test_question_style_untouched() {
        let out = rewrite_marks("a=? AND b=?", PlaceholderStyle::Question);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_fixed_token() {
        let out = rewrite_marks("a=? OR b=?", PlaceholderStyle::Fixed("%s"));
        assert_eq!(out, "a=%s OR b=%s");
    }

    #[test]
    fn test_many_marks_keep_order() {
        let query = vec!["?"; 12].join(",");
        let out = rewrite_marks(&query, PlaceholderStyle::Numbered('$'));
        let expected: Vec<String> = (1..=12).map(|i| format!("${}", i)).collect();
        assert_eq!(out, expected.join(","));
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let out = rewrite_marks("name = ? -- café", PlaceholderStyle::Numbered('$'));
        assert_eq!(out, "name = $1 -- café");
    }
}
