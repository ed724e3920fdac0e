//! Command-line tokenizer.

use smallvec::SmallVec;

use crate::error::{MonitorError, MonitorResult};

/// Characters that separate arguments.
pub const WHITESPACE: [char; 4] = ['\t', '\r', '\n', ' '];

/// Size of the argument vector. One slot is reserved for the terminator the
/// classic monitor kept, so at most `MAXARGS - 1` tokens are accepted.
pub const MAXARGS: usize = 16;

/// Tokens of one line, borrowed from the line itself.
pub type Args<'a> = SmallVec<[&'a str; MAXARGS]>;

/// Split `line` into whitespace-separated tokens.
///
/// An empty or all-whitespace line yields no tokens.
///
/// ## Errors
///
/// [`MonitorError::TooManyArguments`] as soon as a `MAXARGS`-th token is
/// found; the rest of the line is not examined.
///
/// ```rust
/// use kmon_core::monitor::tokenize;
///
/// let args = tokenize("  backtrace\tnow \r\n").unwrap();
/// assert_eq!(args.as_slice(), &["backtrace", "now"]);
/// assert!(tokenize(" \t ").unwrap().is_empty());
/// ```
pub fn tokenize(line: &str) -> MonitorResult<Args<'_>>
{
    let mut args = Args::new();
    for token in line.split(|c: char| WHITESPACE.contains(&c)).filter(|token| !token.is_empty()) {
        if args.len() == MAXARGS - 1 {
            return Err(MonitorError::TooManyArguments { max: MAXARGS });
        }
        args.push(token);
    }
    Ok(args)
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn words(count: usize) -> String
    {
        (0..count).map(|index| format!("a{index}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_single_token()
    {
        assert_eq!(tokenize("help").unwrap().as_slice(), &["help"]);
    }

    #[test]
    fn test_empty_and_blank_lines()
    {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize(" \t\r\n ").unwrap().is_empty());
    }

    #[test]
    fn test_all_separators()
    {
        let args = tokenize("a\tb\rc\nd e").unwrap();
        assert_eq!(args.as_slice(), &["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_other_whitespace_is_not_a_separator()
    {
        // Vertical tab and form feed are not in the separator set.
        assert_eq!(tokenize("a\u{b}b").unwrap().len(), 1);
    }

    #[test]
    fn test_fifteen_tokens_accepted()
    {
        assert_eq!(tokenize(&words(MAXARGS - 1)).unwrap().len(), MAXARGS - 1);
    }

    #[test]
    fn test_sixteen_tokens_rejected()
    {
        let err = tokenize(&words(MAXARGS)).unwrap_err();
        assert!(matches!(err, MonitorError::TooManyArguments { max: MAXARGS }));
        assert_eq!(err.to_string(), "Too many arguments (max 16)");
        assert!(tokenize(&words(40)).is_err());
    }
}
