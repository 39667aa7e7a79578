//! Turning an input line into a [`Pipeline`].
//!
//! The line is split on `|` first; each segment is then lexed and built into
//! a [`Stage`] on its own.

use crate::lexer::{self, Token};
use crate::pipeline::{Pipeline, Stage};
use tracing::debug;

/// Which redirection an operator is waiting to receive a target for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redirect {
    Input,
    Output,
}

/// Builds a single [`Stage`] from a stage's tokens.
struct StageBuilder {
    tokens: std::vec::IntoIter<Token>,
    stage: Stage,
    pending: Option<Redirect>,
    seen_operator: bool,
}

impl StageBuilder {
    /// Prepare a builder for one stage's text.
    ///
    /// The argument vector is sized by a separate counting pass, so it ends up
    /// holding exactly the command's argv and none of the filename tokens.
    ///
    /// # Arguments
    /// * `segment` - The text of one stage, between two `|`.
    fn from(segment: &str) -> Self {
        let word_count = lexer::count_words(segment);
        StageBuilder {
            tokens: lexer::split_into_tokens(segment).into_iter(),
            stage: Stage {
                arguments: Vec::with_capacity(word_count),
                input_file: None,
                output_file: None,
            },
            pending: None,
            seen_operator: false,
        }
    }

    /// Consumes the tokens and produces the stage.
    ///
    /// # Returns
    /// `Stage`: the argv plus the last `<` and `>` targets seen. An operator
    /// left without a target sets nothing.
    fn build_stage(mut self) -> Stage {
        while let Some(token) = self.tokens.next() {
            match token {
                Token::RedirectLeft => self.expect_target(Redirect::Input),
                Token::RedirectRight => self.expect_target(Redirect::Output),
                Token::Word(word) => self.push_word(word),
            }
        }
        if let Some(kind) = self.pending {
            debug!(?kind, "redirection operator without a target");
        }
        self.stage
    }

    fn expect_target(&mut self, kind: Redirect) {
        self.seen_operator = true;
        self.pending = Some(kind);
    }

    fn push_word(&mut self, word: String) {
        match self.pending.take() {
            // last one wins
            Some(Redirect::Input) => self.stage.input_file = Some(word),
            Some(Redirect::Output) => self.stage.output_file = Some(word),
            None if !self.seen_operator => self.stage.arguments.push(word),
            None => debug!(%word, "ignoring word after redirection"),
        }
    }
}

/// Parse one stage's text (the part between two `|`).
///
/// # Arguments
/// * `segment` - The stage text. It may be empty or blank.
///
/// # Returns
/// `Stage`: a stage with no arguments when the segment holds no command word.
pub fn parse_stage(segment: &str) -> Stage {
    StageBuilder::from(segment).build_stage()
}

/// Turn a raw input line into a pipeline.
///
/// Returns `None` when the line holds nothing but whitespace. Any other input
/// produces a pipeline, even a degenerate one: `"a |"` yields a second stage
/// with no arguments, which fails later when it is launched.
///
/// # Arguments
/// * `line` - The raw line as read, trailing newline included or not.
///
/// # Returns
/// `Option<Pipeline>`: one stage per `|`-separated segment, or `None` for a
/// blank line.
pub fn parse(line: &str) -> Option<Pipeline> {
    if line.chars().all(lexer::is_whitespace) {
        return None;
    }
    let stages: Vec<Stage> = line.split('|').map(parse_stage).collect();
    debug!(stages = stages.len(), "parsed pipeline");
    Pipeline::new(stages)
}
