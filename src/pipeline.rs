//! Data model for a parsed command line.

/// One command within a pipeline.
///
/// `arguments` holds the program name first, followed by its arguments.
/// The redirection targets, when present, replace whatever the stage would
/// otherwise read from or write to (the inherited terminal or a pipe).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    /// Program name followed by its arguments. Empty only for a degenerate
    /// stage such as the right-hand side of `"a |"`.
    pub arguments: Vec<String>,
    /// File to read standard input from (`< file`).
    pub input_file: Option<String>,
    /// File to write standard output to (`> file`), created or truncated.
    pub output_file: Option<String>,
}

impl Stage {
    /// Program name, if the stage has one.
    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments following the program name.
    pub fn args(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }
}

/// An ordered, non-empty chain of stages connected by pipes.
///
/// Stage `i` feeds stage `i + 1`; the link that a linked-list representation
/// would keep in each stage is the position in this vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build a pipeline from its stages. Returns `None` for an empty list.
    pub fn new(stages: Vec<Stage>) -> Option<Self> {
        if stages.is_empty() {
            None
        } else {
            Some(Self { stages })
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false` for a pipeline built through `new`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of pipes needed to connect every stage to its successor.
    pub fn pipe_count(&self) -> usize {
        self.stages.len() - 1
    }
}

impl IntoIterator for Pipeline {
    type Item = Stage;
    type IntoIter = std::vec::IntoIter<Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(args: &[&str]) -> Stage {
        Stage {
            arguments: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_stage_list_is_not_a_pipeline() {
        assert!(Pipeline::new(Vec::new()).is_none());
    }

    #[test]
    fn pipe_count_is_one_less_than_stage_count() {
        let p = Pipeline::new(vec![stage(&["a"]), stage(&["b"]), stage(&["c"])]).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.pipe_count(), 2);
        assert!(!p.is_empty());
        assert_eq!(p.stages()[1], stage(&["b"]));
    }

    #[test]
    fn program_and_args_split() {
        let s = stage(&["grep", "-n", "foo"]);
        assert_eq!(s.program(), Some("grep"));
        assert_eq!(s.args(), &["-n".to_string(), "foo".to_string()]);

        let empty = Stage::default();
        assert_eq!(empty.program(), None);
        assert!(empty.args().is_empty());
    }
}
