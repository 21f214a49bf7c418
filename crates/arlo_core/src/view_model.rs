use crate::data_entry::EntryMode;
use crate::model::{BallotInterpretation, BallotKey};
use crate::screen::Screen;
use crate::setup::MenuItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub screen: Screen,
    pub audit_name: String,
    pub round_count: usize,
    pub loading: bool,
    /// Setup sidebar; empty outside the multi-jurisdiction admin flow.
    pub menu: Vec<MenuItem>,
    /// Transient error notice.
    pub notice: Option<String>,
    pub entry: Option<EntryView>,
    pub sample_size_input: String,
    pub sample_size_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub key: BallotKey,
    pub ordinal: usize,
    pub total: usize,
    pub mode: EntryMode,
    pub interpretation: BallotInterpretation,
    pub batch_name: String,
    pub tabulator: Option<String>,
}
