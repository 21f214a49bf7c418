//! Arlo client core: wire model, routing, screen selection and the pure
//! state machine that drives the client.
mod data_entry;
mod effect;
pub mod model;
mod msg;
mod route;
mod screen;
mod session;
mod setup;
mod state;
mod update;
mod validate;
mod view_model;

pub use data_entry::{BallotEntry, EntryMode, Navigation};
pub use effect::{
    ActionKind, AuditAction, AuditBasics, Effect, PollKind, PollOutcome, RequestSeq,
    StatusTarget, Upload,
};
pub use msg::{EntryMsg, Msg};
pub use route::{audit_board_url, ElectionView, Route, RouteError};
pub use screen::{
    canonical_root, select_screen, show_calculate_risk_measurement,
    show_select_ballots_to_audit, single_panels, Screen, ScreenInputs, SinglePanels,
};
pub use session::{AuditFlow, BoardIdentity, Role, SessionContext, SessionError};
pub use setup::{setup_menu, MenuItem, MenuItemState, SetupStage};
pub use state::AppState;
pub use update::update;
pub use validate::{validate_count, ValidationError};
pub use view_model::{AppViewModel, EntryView};
