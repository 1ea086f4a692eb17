//! Shell command parser
//!
//! Splits a command line into a program name and arguments:
//! 1. Words separated by whitespace
//! 2. Quoted strings (single and double) group words
//! 3. `$NAME` tokens are replaced by environment values

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// A single command (program + arguments)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Program name
    pub program: String,
    /// Arguments (not including program name)
    pub args: Vec<String>,
}

impl SimpleCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unterminated quoted string
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// A word plus whether any part of it was quoted
#[derive(Debug)]
struct Word {
    text: String,
    quoted: bool,
}

/// Tokenizer for shell input
struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn next_word(&mut self) -> Result<Option<Word>, ParseError> {
        self.skip_whitespace();
        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let mut word = Word {
            text: String::new(),
            quoted: false,
        };

        while let Some(&c) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => break,
                // Quotes can appear mid-word: foo"bar"baz
                '"' | '\'' => {
                    self.chars.next();
                    word.text.push_str(&self.read_quoted_content(c)?);
                    word.quoted = true;
                }
                _ => {
                    word.text.push(c);
                    self.chars.next();
                }
            }
        }

        Ok(Some(word))
    }

    fn read_quoted_content(&mut self, quote: char) -> Result<String, ParseError> {
        let mut content = String::new();

        loop {
            match self.chars.next() {
                Some(c) if c == quote => break,
                Some('\\') if quote == '"' => {
                    // Escape sequences only in double quotes
                    match self.chars.next() {
                        Some(escaped) => content.push(escaped),
                        None => return Err(ParseError::UnterminatedQuote(quote)),
                    }
                }
                Some(c) => content.push(c),
                None => return Err(ParseError::UnterminatedQuote(quote)),
            }
        }

        Ok(content)
    }
}

/// Replace an unquoted `$NAME` token with the variable's value.
///
/// Unset or empty variables leave the token as it was.
fn expand_word<F>(word: Word, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if word.quoted {
        return word.text;
    }
    match word.text.strip_prefix('$') {
        Some(name) if !name.is_empty() => match lookup(name) {
            Some(value) if !value.is_empty() => value,
            _ => word.text,
        },
        _ => word.text,
    }
}

/// Parse a command line.
///
/// Returns `Ok(None)` for a blank line.
pub fn parse<F>(input: &str, lookup: F) -> Result<Option<SimpleCommand>, ParseError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut lexer = Lexer::new(input);
    let mut words = Vec::new();

    while let Some(word) = lexer.next_word()? {
        words.push(expand_word(word, &lookup));
    }

    if words.is_empty() {
        return Ok(None);
    }

    let program = words.remove(0);
    Ok(Some(SimpleCommand {
        program,
        args: words,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn test_env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/user".into()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    // ============ Simple Commands ============

    #[test]
    fn test_simple_command() {
        let result = parse("ls", no_env).unwrap().unwrap();
        assert_eq!(result, SimpleCommand::new("ls"));
    }

    #[test]
    fn test_command_with_args() {
        let result = parse("cp a.txt b.txt", no_env).unwrap().unwrap();
        assert_eq!(result, SimpleCommand::new("cp").arg("a.txt").arg("b.txt"));
    }

    #[test]
    fn test_extra_whitespace() {
        let result = parse("  ls \t  /home  ", no_env).unwrap().unwrap();
        assert_eq!(result.program, "ls");
        assert_eq!(result.args, vec!["/home"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("", no_env).unwrap(), None);
        assert_eq!(parse("   ", no_env).unwrap(), None);
    }

    // ============ Quoted Strings ============

    #[test]
    fn test_double_quoted_string() {
        let result = parse(r#"echo "hello world""#, no_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["hello world"]);
    }

    #[test]
    fn test_single_quoted_string() {
        let result = parse("echo 'hello world'", no_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["hello world"]);
    }

    #[test]
    fn test_escaped_quote_in_double_quotes() {
        let result = parse(r#"echo "hello \"world\"""#, no_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["hello \"world\""]);
    }

    #[test]
    fn test_concatenated_quotes() {
        let result = parse(r#"echo foo"bar"baz"#, no_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["foobarbaz"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            parse(r#"echo "hello"#, no_env),
            Err(ParseError::UnterminatedQuote('"'))
        );
        assert_eq!(
            parse("echo 'hello", no_env),
            Err(ParseError::UnterminatedQuote('\''))
        );
    }

    // ============ Variables ============

    #[test]
    fn test_expand_variable() {
        let result = parse("cd $HOME", test_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["/home/user"]);
    }

    #[test]
    fn test_unset_variable_kept() {
        let result = parse("echo $NOPE $EMPTY", test_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["$NOPE", "$EMPTY"]);
    }

    #[test]
    fn test_expansion_is_whole_token() {
        let result = parse("echo $HOME/docs pre$HOME $", test_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["$HOME/docs", "pre$HOME", "$"]);
    }

    #[test]
    fn test_quoted_variable_not_expanded() {
        let result = parse("echo '$HOME'", test_env).unwrap().unwrap();
        assert_eq!(result.args, vec!["$HOME"]);
    }

    #[test]
    fn test_program_can_be_variable() {
        let result = parse("$CMD", |n: &str| (n == "CMD").then(|| "pwd".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(result.program, "pwd");
    }
}
