//! Pre-dispatch rewriting of console lines.
//!
//! Lines written in method-call form, `User.show("1234")`, are turned into the
//! positional form understood by the dispatcher, `show User "1234"`.

use regex::Regex;
use std::sync::LazyLock;

static DOT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\.(\w+)\((.*)\)$").expect("dot-call pattern is valid")
});

/// A line in `<Class>.<method>(<params>)` form, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotCall<'a> {
    pub class: &'a str,
    pub method: &'a str,
    pub params: &'a str,
}

/// Matches the whole line against the method-call form.
pub fn parse_dot_call(line: &str) -> Option<DotCall<'_>> {
    let caps = DOT_CALL.captures(line)?;
    Some(DotCall {
        class: caps.get(1)?.as_str(),
        method: caps.get(2)?.as_str(),
        params: caps.get(3)?.as_str().trim(),
    })
}

/// Rewrites `Class.method(a, b)` into `method Class a b`.
///
/// Parameters are separated by `", "`; quoting inside them is left for the word
/// splitter. Lines in any other shape are returned unchanged.
pub fn rewrite_dot_syntax(line: &str) -> String {
    match parse_dot_call(line) {
        Some(call) => {
            let args = call.params.replace(", ", " ");
            format!("{} {} {}", call.method, call.class, args)
        }
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_without_params() {
        assert_eq!(rewrite_dot_syntax("User.all()"), "all User ");
        assert_eq!(rewrite_dot_syntax("Place.count()"), "count Place ");
    }

    #[test]
    fn test_rewrite_with_params() {
        assert_eq!(
            rewrite_dot_syntax(r#"User.update("38f2", "first_name", "John")"#),
            r#"update User "38f2" "first_name" "John""#
        );
        assert_eq!(rewrite_dot_syntax("City.show(  abc  )"), "show City abc");
    }

    #[test]
    fn test_other_lines_are_untouched() {
        for line in ["show User 1", "User.all", "all()", "User.all() extra", ""] {
            assert_eq!(rewrite_dot_syntax(line), line);
        }
    }

    #[test]
    fn test_parse_dot_call_parts() {
        let call = parse_dot_call("Review.destroy(\"x\")").unwrap();
        assert_eq!(
            call,
            DotCall {
                class: "Review",
                method: "destroy",
                params: "\"x\"",
            }
        );
    }
}
