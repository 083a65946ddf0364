//! Dependency name extraction.
//!
//! Every injectable callable declares the names of the values it wants, in
//! argument order. The names either come from an explicit list or are read
//! from the callable's parameter list text, e.g. `stringify!`-ed closure
//! parameters or `fn greet(World: Arc<String>, _Name_: Instance)`.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ReflectError;

static STRIP_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m://.*$)|(?s:/\*.*?\*/)").expect("Invalid regex"));

/// Opening of the parameter list: a closure's `|...|` or everything up to the first `(`
static FN_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\|(?P<closure>[^|]*)\||[^(|]*\()").expect("Invalid regex")
});

/// A binding, optionally `mut` and followed by a type ascription
static FN_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:mut\s+)?(?P<name>[^\s:]+)\s*(?::.*)?$").expect("Invalid regex")
});

/// One pair of surrounding underscores
static UNDERSCORED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_(?P<name>\S+)_$").expect("Invalid regex"));

/// Returns the ordered dependency names declared by a signature.
///
/// Comments are ignored, type ascriptions and `mut` are dropped and one
/// matching pair of surrounding underscores is stripped from each name.
/// Duplicate names are kept.
pub fn annotate(signature: &str) -> Result<Vec<String>, ReflectError> {
    let text = STRIP_COMMENTS.replace_all(signature, "");
    let missing = || ReflectError::MissingParameterList(signature.trim().to_string());

    let opening = FN_ARGS.captures(&text).ok_or_else(missing)?;
    let parameters = match opening.name("closure") {
        Some(closure) => split_top_level(closure.as_str()),
        None => {
            let start = opening.get(0).map_or(0, |all| all.end());
            split_parenthesized(&text[start..]).ok_or_else(missing)?
        }
    };

    parameters
        .into_iter()
        .map(str::trim)
        .filter(|parameter| !parameter.is_empty())
        .map(|parameter| {
            parameter_name(parameter).ok_or_else(|| ReflectError::InvalidParameter {
                signature: signature.trim().to_string(),
                parameter: parameter.to_string(),
            })
        })
        .collect()
}

/// Strips one matching pair of surrounding underscores: `_World_` becomes `World`
pub fn logical_name(name: &str) -> &str {
    UNDERSCORED
        .captures(name)
        .and_then(|captures| captures.name("name"))
        .map_or(name, |inner| inner.as_str())
}

fn parameter_name(parameter: &str) -> Option<String> {
    let binding = FN_ARG.captures(parameter)?.name("name")?.as_str();
    Some(logical_name(binding).to_string())
}

/// Splits the text after an opening `(` up to its matching `)`
///
/// Returns `None` if the parenthesis is never closed.
fn split_parenthesized(text: &str) -> Option<Vec<&str>> {
    let (parameters, closed) = split_until_unbalanced(text);
    closed.then_some(parameters)
}

fn split_top_level(parameters: &str) -> Vec<&str> {
    split_until_unbalanced(parameters).0
}

/// Splits on commas which are not nested inside a type, stopping at the first unmatched closing bracket
fn split_until_unbalanced(parameters: &str) -> (Vec<&str>, bool) {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    let mut previous = ' ';

    for (index, ch) in parameters.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            // `->` is not a closing bracket
            '>' if previous == '-' => {}
            '>' | ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    parts.push(&parameters[start..index]);
                    return (parts, true);
                }
            }
            ',' if depth == 0 => {
                parts.push(&parameters[start..index]);
                start = index + 1;
            }
            _ => {}
        }
        previous = ch;
    }

    parts.push(&parameters[start..]);
    (parts, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_parameters_yield_no_names() {
        assert!(annotate("function(){}").unwrap().is_empty());
        assert!(annotate("||").unwrap().is_empty());
        assert!(annotate("fn build()").unwrap().is_empty());
    }

    #[test]
    fn names_keep_declaration_order() {
        let names = annotate("function(a1,a2, a3,   a4,\n   a5){}").unwrap();
        assert_eq!(names, ["a1", "a2", "a3", "a4", "a5"]);

        let names = annotate("function fnTwoArgs(MyFirstArg,$2ndArg){}").unwrap();
        assert_eq!(names, ["MyFirstArg", "$2ndArg"]);
    }

    #[test]
    fn type_ascriptions_and_mut_are_dropped() {
        let names = annotate(
            "fn greet(mut World: Arc<HashMap<String, u32>>, Name: impl Fn(u8, u8) -> String)",
        )
        .unwrap();
        assert_eq!(names, ["World", "Name"]);

        let names = annotate("|Config: Config<AppConfig>, Greeting|").unwrap();
        assert_eq!(names, ["Config", "Greeting"]);
    }

    #[test]
    fn comments_are_ignored() {
        let names = annotate("fn(/* the world */ World, // trailing\n Name /* , Hidden */)").unwrap();
        assert_eq!(names, ["World", "Name"]);
    }

    #[test]
    fn one_underscore_pair_is_stripped() {
        let names = annotate("(_World_, __Name__, _Single, Trailing_, _)").unwrap();
        assert_eq!(names, ["World", "_Name_", "_Single", "Trailing_", "_"]);
    }

    #[test]
    fn block_comments_may_span_lines() {
        let names = annotate("fn(\n/* World,\n Hidden */ Name: u8, /**/Last)").unwrap();
        assert_eq!(names, ["Name", "Last"]);
    }

    #[test]
    fn text_after_the_parameter_list_is_ignored() {
        let names = annotate("fn build(World: Vec<u8>) -> Result<(u8, u16), Error>").unwrap();
        assert_eq!(names, ["World"]);
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(annotate("(a, b, a)").unwrap(), ["a", "b", "a"]);
    }

    #[test]
    fn text_without_parameter_list_is_rejected() {
        assert_eq!(
            annotate("42"),
            Err(ReflectError::MissingParameterList("42".to_string()))
        );
        assert!(matches!(
            annotate("fn broken(a b)"),
            Err(ReflectError::InvalidParameter { parameter, .. }) if parameter == "a b"
        ));
    }
}
