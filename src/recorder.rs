use crate::error::RpnError;


pub const DEFINE_START: &str = "(";
pub const DEFINE_END: &str = ")";

/// What the interpreter should do with a token the recorder consumed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The token named the definition, the body starts out empty.
    Named,
    /// The token belongs to the body of [`Recorder::name`].
    Append,
    /// A nested marker, counted but kept out of the body.
    Marker,
    /// The closing marker of the named definition.
    Closed(String),
    /// Nothing is being recorded.
    Ignored,
}

// While a definition is open every token is captured instead of evaluated.
// Nested markers only adjust the depth so the body may contain a complete
// inner definition without ending the outer one early.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Recorder {
    #[default]
    Idle,
    Naming,
    Recording { name: String, depth: usize },
}

impl Recorder {
    pub(crate) fn open(&mut self) {
        *self = Self::Naming;
    }

    pub(crate) fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub(crate) fn name(&self) -> Option<&str> {
        match self {
            Self::Recording { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn feed(&mut self, op: &str) -> Step {
        match std::mem::take(self) {
            Self::Idle => Step::Ignored,
            Self::Naming => {
                *self = Self::Recording { name: op.to_owned(), depth: 0 };
                Step::Named
            },
            Self::Recording { name, depth } => match op {
                DEFINE_END if depth == 0 => Step::Closed(name),
                DEFINE_END => {
                    *self = Self::Recording { name, depth: depth - 1 };
                    Step::Marker
                },
                DEFINE_START => {
                    *self = Self::Recording { name, depth: depth + 1 };
                    Step::Marker
                },
                _ => {
                    *self = Self::Recording { name, depth };
                    Step::Append
                }
            }
        }
    }

    /// Returns to [`Recorder::Idle`], reporting a definition left open.
    pub(crate) fn finish(&mut self) -> Result<(), RpnError> {
        match std::mem::take(self) {
            Self::Idle => Ok(()),
            Self::Naming => Err(RpnError::UnterminatedDefinition { name: None }),
            Self::Recording { name, .. } => Err(RpnError::UnterminatedDefinition { name: Some(name) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn feed_all(recorder: &mut Recorder, ops: &[&str]) -> Vec<Step> {
        ops.iter().map(|op| recorder.feed(op)).collect()
    }

    #[test]
    fn first_token_names_the_definition() {
        let mut recorder = Recorder::default();
        recorder.open();
        assert_eq!(recorder.feed("square"), Step::Named);
        assert_eq!(recorder.name(), Some("square"));
        assert_eq!(recorder.feed("dup"), Step::Append);
        assert_eq!(recorder.feed(")"), Step::Closed("square".to_owned()));
        assert!(!recorder.is_active());
    }

    #[test]
    fn nested_markers_track_depth() {
        let mut recorder = Recorder::default();
        recorder.open();
        let steps = feed_all(&mut recorder, &["outer", "(", "inner", "1", ")", "2"]);
        assert_eq!(steps, vec![Step::Named, Step::Marker, Step::Append, Step::Append, Step::Marker, Step::Append]);
        assert_eq!(recorder, Recorder::Recording { name: "outer".to_owned(), depth: 0 });
        assert_eq!(recorder.feed(")"), Step::Closed("outer".to_owned()));
    }

    #[test]
    fn markers_may_be_names() {
        let mut recorder = Recorder::default();
        recorder.open();
        assert_eq!(recorder.feed(")"), Step::Named);
        assert_eq!(recorder.name(), Some(")"));
    }

    #[test]
    fn idle_recorder_ignores_tokens() {
        let mut recorder = Recorder::default();
        assert_eq!(recorder.feed("1"), Step::Ignored);
        assert_eq!(recorder.finish(), Ok(()));
    }

    #[test]
    fn finish_reports_open_definitions() {
        let mut recorder = Recorder::default();
        recorder.open();
        assert_eq!(recorder.finish(), Err(RpnError::UnterminatedDefinition { name: None }));
        assert!(!recorder.is_active());

        recorder.open();
        recorder.feed("f");
        assert_eq!(recorder.finish(), Err(RpnError::UnterminatedDefinition { name: Some("f".to_owned()) }));
        assert_eq!(recorder, Recorder::Idle);
    }
}
