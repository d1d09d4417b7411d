/// A single step of a traceback path through the profile-HMM state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    S,
    N,
    B,
    M,
    I,
    D,
    E,
    J,
    C,
    T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceStep {
    pub state: State,
    pub i: usize,
    pub j: usize,
}

/// The alignment seed / traceback path described in spec.md §3: "an
/// ordered sequence of (state, i, j)". The CORE only ever reads the
/// first and last M-state cells of an input seed; the full path is kept
/// here because it's also the *output* format of `traceback_bounded`
/// (an ambient, non-core operation — see SPEC_FULL.md).
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub steps: Vec<TraceStep>,
    pub target_length: usize,
    pub profile_length: usize,
}

impl Trace {
    pub fn new(target_length: usize, profile_length: usize) -> Self {
        Trace {
            steps: Vec::new(),
            target_length,
            profile_length,
        }
    }

    pub fn push(&mut self, state: State, i: usize, j: usize) {
        self.steps.push(TraceStep { state, i, j });
    }

    /// The first and last M-state cells, the only parts of a seed the
    /// cloud search reads (spec.md §3, §4.3).
    pub fn first_and_last_match(&self) -> Option<(TraceStep, TraceStep)> {
        let matches: Vec<&TraceStep> = self
            .steps
            .iter()
            .filter(|s| s.state == State::M)
            .collect();
        match (matches.first(), matches.last()) {
            (Some(&&first), Some(&&last)) => Some((first, last)),
            _ => None,
        }
    }
}
