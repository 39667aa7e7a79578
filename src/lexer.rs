//! Lexical analysis of a single pipeline stage.
//!
//! The lexer works on the text between two `|` delimiters. It recognises
//! plain words and the two redirection operators; there is no quoting or
//! expansion, so every other character is part of a word.

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of non-whitespace, non-operator characters.
    Word(String),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
}

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

pub(crate) fn is_redirection(ch: char) -> bool {
    matches!(ch, '<' | '>')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
}

impl<'a> LexingFSM<'a> {
    /// Creates a new lexing state machine positioned at the start of a stage.
    ///
    /// # Arguments
    /// * `segment` - The text of one stage, without the surrounding `|`.
    fn new(segment: &'a str) -> Self {
        LexingFSM {
            input: segment.chars(),
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Runs the state machine over the whole segment.
    ///
    /// # Returns
    /// `Vec<Token>`: words and operators in the order they appear. A word still
    /// being read when the input ends is flushed as the last token.
    fn make_tokens(mut self) -> Vec<Token> {
        let mut out = Vec::new();

        while let Some(ch) = self.input.next() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
            }
        }

        self.finish_word(&mut out);
        out
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if is_whitespace(c) => {}
            '<' => out.push(Token::RedirectLeft),
            '>' => out.push(Token::RedirectRight),
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if is_whitespace(c) => self.finish_word(out),
            '<' | '>' => {
                self.finish_word(out);
                self.handle_start(ch, out);
            }
            c => self.buffer.push(c),
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
        }
        self.state = LexingState::Start;
    }
}

/// Count the whitespace-delimited words that appear before the first
/// redirection operator in `segment`.
///
/// An operator glued to a word (`sort<in`) still ends the count, and the
/// word before it is included.
///
/// # Arguments
/// * `segment` - The text of one stage.
///
/// # Returns
/// `usize`: the number of argv entries the stage will have. Redirection
/// targets and anything after the first operator are not counted.
pub fn count_words(segment: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for ch in segment.chars() {
        if is_redirection(ch) {
            break;
        }
        if is_whitespace(ch) {
            if in_word {
                count += 1;
                in_word = false;
            }
        } else {
            in_word = true;
        }
    }
    if in_word {
        count += 1;
    }
    count
}

/// The main entry point for lexing one stage.
///
/// Creates and runs the finite state machine over the stage's text.
///
/// # Arguments
/// * `segment` - The string to be tokenized.
///
/// # Returns
/// `Vec<Token>`: the stage's tokens. Lexing cannot fail, since there is no
/// quoting that could be left open.
pub fn split_into_tokens(segment: &str) -> Vec<Token> {
    LexingFSM::new(segment).make_tokens()
}
