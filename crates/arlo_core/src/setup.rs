use crate::model::{FileProcessingState, JurisdictionFileStatus};

/// Stages of the multi-jurisdiction setup wizard, in sidebar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupStage {
    #[default]
    Participants,
    TargetContests,
    OpportunisticContests,
    AuditSettings,
    ReviewLaunch,
}

impl SetupStage {
    pub const ALL: [SetupStage; 5] = [
        SetupStage::Participants,
        SetupStage::TargetContests,
        SetupStage::OpportunisticContests,
        SetupStage::AuditSettings,
        SetupStage::ReviewLaunch,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SetupStage::Participants => "Participants",
            SetupStage::TargetContests => "Target Contests",
            SetupStage::OpportunisticContests => "Opportunistic Contests",
            SetupStage::AuditSettings => "Audit Settings",
            SetupStage::ReviewLaunch => "Review & Launch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemState {
    Live,
    Processing,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub stage: SetupStage,
    pub title: &'static str,
    pub active: bool,
    pub state: MenuItemState,
}

/// Sidebar items for the setup wizard.
///
/// Participants is always reachable. Every later stage depends on the
/// jurisdictions file: live once processed, processing while the server works
/// on it, locked otherwise.
pub fn setup_menu(current: SetupStage, file: Option<&JurisdictionFileStatus>) -> Vec<MenuItem> {
    let dependent_state = match file.and_then(JurisdictionFileStatus::state) {
        Some(FileProcessingState::Processed) => MenuItemState::Live,
        Some(FileProcessingState::Processing | FileProcessingState::ReadyToProcess) => {
            MenuItemState::Processing
        }
        Some(FileProcessingState::Errored) | None => MenuItemState::Locked,
    };

    SetupStage::ALL
        .iter()
        .map(|&stage| MenuItem {
            stage,
            title: stage.title(),
            active: stage == current,
            state: if stage == SetupStage::Participants {
                MenuItemState::Live
            } else {
                dependent_state
            },
        })
        .collect()
}

/// The menu state of one stage; used to refuse navigation to locked stages.
pub fn stage_state(stage: SetupStage, file: Option<&JurisdictionFileStatus>) -> MenuItemState {
    setup_menu(stage, file)
        .into_iter()
        .find(|item| item.stage == stage)
        .map(|item| item.state)
        .unwrap_or(MenuItemState::Locked)
}
