//! Ballot data entry for audit boards.
//!
//! One open ballot at a time, toggling between entering an interpretation
//! and reviewing it before submission. The interpretation is ephemeral: it is
//! seeded from the ballot's stored interpretation (or empty) when the ballot
//! is opened, and dropped on navigation.

use crate::model::{Ballot, BallotInterpretation, BallotKey, Interpretation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Auditing,
    Reviewing,
}

/// Where previous/next leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Ballot(BallotKey),
    /// Past either end of the board's list: back to the board overview.
    Home,
}

/// An interpretation sent to the server and not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingSubmission {
    pub key: BallotKey,
    pub interpretation: BallotInterpretation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotEntry {
    key: BallotKey,
    index: usize,
    total: usize,
    mode: EntryMode,
    interpretation: BallotInterpretation,
}

impl BallotEntry {
    /// Opens `key` from the board's ballot list for `contest_id`.
    ///
    /// Returns `None` when the ballot is not in the list; callers redirect to
    /// the board home in that case.
    pub fn open(ballots: &[Ballot], contest_id: &str, key: &BallotKey) -> Option<Self> {
        let index = ballots.iter().position(|b| b.key() == *key)?;
        let interpretation = ballots[index]
            .interpretation_for(contest_id)
            .cloned()
            .unwrap_or_else(|| BallotInterpretation::empty(contest_id));
        Some(Self {
            key: key.clone(),
            index,
            total: ballots.len(),
            mode: EntryMode::Auditing,
            interpretation,
        })
    }

    pub fn key(&self) -> &BallotKey {
        &self.key
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn interpretation(&self) -> &BallotInterpretation {
        &self.interpretation
    }

    /// 1-based position in the board's list, for "ballot N of M".
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Replaces the interpretation with the stored one while auditing.
    pub fn reseed(&mut self, interpretation: BallotInterpretation) -> bool {
        if self.mode != EntryMode::Auditing {
            return false;
        }
        self.interpretation = interpretation;
        true
    }

    pub fn go_review(&mut self) {
        self.mode = EntryMode::Reviewing;
    }

    pub fn edit(&mut self) {
        self.mode = EntryMode::Auditing;
    }

    /// Sets the verdict. A verdict other than `Vote` clears the chosen choice.
    /// Ignored while reviewing.
    pub fn set_interpretation(&mut self, verdict: Option<Interpretation>) -> bool {
        if self.mode != EntryMode::Auditing {
            return false;
        }
        if verdict != Some(Interpretation::Vote) {
            self.interpretation.choice_id = None;
        }
        self.interpretation.interpretation = verdict;
        true
    }

    /// Selects a choice, which implies a `Vote` verdict. Ignored while reviewing.
    pub fn set_choice(&mut self, choice_id: Option<String>) -> bool {
        if self.mode != EntryMode::Auditing {
            return false;
        }
        if choice_id.is_some() {
            self.interpretation.interpretation = Some(Interpretation::Vote);
        }
        self.interpretation.choice_id = choice_id;
        true
    }

    pub fn set_comment(&mut self, comment: Option<String>) -> bool {
        if self.mode != EntryMode::Auditing {
            return false;
        }
        self.interpretation.comment = comment.filter(|c| !c.trim().is_empty());
        true
    }

    pub fn previous(&mut self, ballots: &[Ballot]) -> Navigation {
        self.mode = EntryMode::Auditing;
        match self.index.checked_sub(1).and_then(|i| ballots.get(i)) {
            Some(ballot) => Navigation::Ballot(ballot.key()),
            None => Navigation::Home,
        }
    }

    pub fn next(&mut self, ballots: &[Ballot]) -> Navigation {
        self.mode = EntryMode::Auditing;
        match ballots.get(self.index + 1) {
            Some(ballot) => Navigation::Ballot(ballot.key()),
            None => Navigation::Home,
        }
    }

    /// The interpretation to send, available only from review.
    pub fn submit(&self) -> Option<BallotInterpretation> {
        match self.mode {
            EntryMode::Reviewing => Some(self.interpretation.clone()),
            EntryMode::Auditing => None,
        }
    }
}
