//! Word splitting for console input lines.
//!
//! Works like a tiny POSIX shell splitter: whitespace separates words, single and
//! double quotes group text (and are removed), a backslash escapes the next character.

/// Errors that can occur while splitting a line into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    UnfinishedQuote,
    /// The line ended right after a backslash.
    DanglingEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    /// Creates a new instance of the word splitting state machine.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Walks the whole input and returns the words found in it.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::ReadingWord => out.push(std::mem::take(&mut self.buffer)),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {}
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                self.read_escaped()?;
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {
                out.push(std::mem::take(&mut self.buffer));
                self.state = LexingState::Start;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => self.read_escaped()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' if matches!(self.peek_char(), Some('"') | Some('\\')) => self.read_escaped()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    /// Pushes the character following a backslash verbatim.
    fn read_escaped(&mut self) -> Result<(), LexingError> {
        match self.read_char() {
            Some(c) => {
                self.buffer.push(c);
                Ok(())
            }
            None => Err(LexingError::DanglingEscape),
        }
    }
}

/// Splits a console line into words, honouring quotes and backslash escapes.
///
/// Quotes may produce empty words: `update User 1 name ""` yields five words.
pub fn split_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_words(line).unwrap()
    }

    #[test]
    fn test_plain_words_split_on_whitespace() {
        assert_eq!(words("  show   User\t1234 "), vec!["show", "User", "1234"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_quotes_group_and_are_removed() {
        assert_eq!(
            words(r#"update User 12 first_name "Betty Holberton""#),
            vec!["update", "User", "12", "first_name", "Betty Holberton"]
        );
        assert_eq!(words("a 'b c'd"), vec!["a", "b cd"]);
        assert_eq!(words(r#"say "it's""#), vec!["say", "it's"]);
    }

    #[test]
    fn test_empty_quotes_produce_empty_word() {
        assert_eq!(words(r#"update User 1 name """#), vec!["update", "User", "1", "name", ""]);
    }

    #[test]
    fn test_backslash_escapes() {
        assert_eq!(words(r"a\ b"), vec!["a b"]);
        assert_eq!(words(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(words(r#"'\n'"#), vec![r"\n"]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(split_words("show \"User"), Err(LexingError::UnfinishedQuote));
        assert_eq!(split_words("show 'User"), Err(LexingError::UnfinishedQuote));
        assert_eq!(split_words("show User\\"), Err(LexingError::DanglingEscape));
    }
}
