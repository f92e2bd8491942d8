use serde::{Deserialize, Serialize};

/// The five HotStuff pipeline phases plus the two session bookends.
///
/// `Waiting` precedes the first proposal of a session; `Completed` is the
/// sink a session settles into once the finalizer has run. The four
/// consensus phases otherwise advance strictly left to right within a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Waiting,
    NewView,
    Prepare,
    PreCommit,
    Commit,
    Decide,
    Completed,
}

impl Phase {
    /// The phase a quorum certificate for `self` advances the session into.
    ///
    /// `Decide` and `Completed` map to themselves; they are sinks, not
    /// transitions.
    pub fn next(self) -> Phase {
        match self {
            Phase::Waiting => Phase::NewView,
            Phase::NewView => Phase::Prepare,
            Phase::Prepare => Phase::PreCommit,
            Phase::PreCommit => Phase::Commit,
            Phase::Commit => Phase::Decide,
            Phase::Decide => Phase::Decide,
            Phase::Completed => Phase::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_chain_advances_in_order() {
        assert_eq!(Phase::NewView.next(), Phase::Prepare);
        assert_eq!(Phase::Prepare.next(), Phase::PreCommit);
        assert_eq!(Phase::PreCommit.next(), Phase::Commit);
        assert_eq!(Phase::Commit.next(), Phase::Decide);
    }

    #[test]
    fn decide_is_a_sink() {
        assert_eq!(Phase::Decide.next(), Phase::Decide);
    }
}
