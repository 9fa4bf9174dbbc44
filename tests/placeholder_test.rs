use rustf_dialect::dialect::{count_marks, rewrite_marks, Dialect, PlaceholderStyle};
use rustf_dialect::dialect::{MySQLDialect, OracleDialect, PostgresDialect, SQLiteDialect};
use std::borrow::Cow;

#[test]
fn test_postgres_numbers_in_order() {
    let d = PostgresDialect::new();
    let out = d.replace_marks("SELECT * FROM t WHERE a = ? AND b IN (?, ?) LIMIT 5");
    assert_eq!(out, "SELECT * FROM t WHERE a = $1 AND b IN ($2, $3) LIMIT 5");
}

#[test]
fn test_oracle_uses_colon_numbers() {
    let d = OracleDialect::new();
    assert_eq!(d.replace_marks("a = ? OR b = ?"), "a = :1 OR b = :2");
}

#[test]
fn test_question_dialects_borrow_input() {
    let query = "UPDATE t SET a = ? WHERE id = ?";
    for d in [&MySQLDialect::new() as &dyn Dialect, &SQLiteDialect::new()] {
        assert!(matches!(d.replace_marks(query), Cow::Borrowed(q) if q == query));
    }
}

#[test]
fn test_no_marks_is_borrowed_for_numbered_styles() {
    let query = "SELECT 1";
    assert!(matches!(
        rewrite_marks(query, PlaceholderStyle::Numbered('$')),
        Cow::Borrowed(_)
    ));
}

#[test]
fn test_count_is_preserved_past_nine() {
    let query = vec!["?"; 12].join(", ");
    let out = rewrite_marks(&query, PlaceholderStyle::Numbered('$'));
    assert_eq!(count_marks(&query), 12);
    assert!(out.ends_with("$11, $12"));
    assert!(!out.contains('?'));
    assert_eq!(out.matches('$').count(), 12);
}

#[test]
fn test_fixed_token_style() {
    let out = rewrite_marks("a = ? AND b = ?", PlaceholderStyle::Fixed("%s"));
    assert_eq!(out, "a = %s AND b = %s");
}

#[test]
fn test_non_ascii_text_survives() {
    let d = PostgresDialect::new();
    assert_eq!(
        d.replace_marks("SELECT 'é' WHERE nom = ?"),
        "SELECT 'é' WHERE nom = $1"
    );
}
