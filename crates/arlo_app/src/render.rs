use std::fmt::Write;

use arlo_core::{AppViewModel, EntryMode, MenuItemState, Screen, SinglePanels};
use chrono::{DateTime, Utc};

/// Plain-text rendering of a view model for the terminal.
pub fn render(view: &AppViewModel, refreshed_at: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();
    let name = if view.audit_name.is_empty() {
        "(unnamed audit)"
    } else {
        view.audit_name.as_str()
    };
    let _ = writeln!(out, "Audit: {name}  rounds: {}", view.round_count);
    if let Some(at) = refreshed_at {
        let _ = writeln!(out, "Refreshed: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if view.loading {
        let _ = writeln!(out, "Loading...");
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {notice}");
    }

    match &view.screen {
        Screen::Redirect(path) => {
            let _ = writeln!(out, "Redirecting to {path}");
        }
        Screen::SetupWizard(stage) => {
            let _ = writeln!(out, "Audit setup: {}", stage.title());
        }
        Screen::ProgressView => {
            let _ = writeln!(out, "Audit progress");
        }
        Screen::RoundManagement => {
            let _ = writeln!(out, "Round management");
        }
        Screen::SingleJurisdiction(panels) => render_panels(&mut out, panels),
        Screen::BallotManifest => {
            let _ = writeln!(out, "Upload the ballot manifest");
        }
        Screen::AuditBoardHome => {
            let _ = writeln!(out, "Audit board: assigned ballots");
        }
        Screen::BallotAudit(_) | Screen::BallotReview(_) => {}
    }

    if !view.menu.is_empty() {
        let _ = writeln!(out, "Setup:");
        for item in &view.menu {
            let marker = if item.active { ">" } else { " " };
            let state = match item.state {
                MenuItemState::Live => "",
                MenuItemState::Processing => " (processing)",
                MenuItemState::Locked => " (locked)",
            };
            let _ = writeln!(out, " {marker} {}{state}", item.title);
        }
    }

    if let Some(entry) = &view.entry {
        let verb = match entry.mode {
            EntryMode::Auditing => "Auditing",
            EntryMode::Reviewing => "Reviewing",
        };
        let _ = writeln!(
            out,
            "{verb} ballot {} of {}: batch {}, position {}",
            entry.ordinal, entry.total, entry.batch_name, entry.key.position
        );
        if let Some(tabulator) = &entry.tabulator {
            let _ = writeln!(out, "  tabulator {tabulator}");
        }
        let verdict = match (&entry.interpretation.interpretation, &entry.interpretation.choice_id) {
            (Some(verdict), Some(choice)) => format!("{verdict:?} for {choice}"),
            (Some(verdict), None) => format!("{verdict:?}"),
            (None, _) => "not entered".to_string(),
        };
        let _ = writeln!(out, "  interpretation: {verdict}");
        if let Some(comment) = &entry.interpretation.comment {
            let _ = writeln!(out, "  comment: {comment}");
        }
    }

    if !view.sample_size_input.is_empty() || view.sample_size_error.is_some() {
        let _ = writeln!(out, "Sample size: {}", view.sample_size_input);
        if let Some(error) = &view.sample_size_error {
            let _ = writeln!(out, "  {error}");
        }
    }
    out
}

fn render_panels(out: &mut String, panels: &SinglePanels) {
    let step = |label: &str, shown: bool, loading: bool| {
        let status = match (shown, loading) {
            (true, _) => "ready",
            (false, true) => "working",
            (false, false) => "pending",
        };
        format!("  {label}: {status}")
    };
    let _ = writeln!(out, "Audit steps:");
    let _ = writeln!(out, "{}", step("Estimate sample size", true, panels.estimate_loading));
    let _ = writeln!(
        out,
        "{}",
        step(
            "Select ballots to audit",
            panels.show_select_ballots_to_audit,
            panels.select_loading
        )
    );
    let _ = writeln!(
        out,
        "{}",
        step(
            "Calculate risk measurement",
            panels.show_calculate_risk_measurement,
            panels.calculate_loading
        )
    );
    if panels.reset_disabled {
        let _ = writeln!(out, "  (reset unavailable)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arlo_core::model::{BallotInterpretation, BallotKey, Interpretation};
    use arlo_core::{EntryView, MenuItem, SetupStage};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn view(screen: Screen) -> AppViewModel {
        AppViewModel {
            screen,
            audit_name: "General".to_string(),
            round_count: 1,
            loading: false,
            menu: Vec::new(),
            notice: None,
            entry: None,
            sample_size_input: String::new(),
            sample_size_error: None,
        }
    }

    #[test]
    fn single_jurisdiction_steps() {
        let panels = SinglePanels {
            show_select_ballots_to_audit: true,
            calculate_loading: true,
            ..SinglePanels::default()
        };
        let at = Utc.with_ymd_and_hms(2020, 11, 3, 18, 30, 0).unwrap();
        let text = render(&view(Screen::SingleJurisdiction(panels)), Some(at));
        assert_eq!(
            text,
            "Audit: General  rounds: 1\n\
             Refreshed: 2020-11-03 18:30:00 UTC\n\
             Audit steps:\n\
             \x20 Estimate sample size: ready\n\
             \x20 Select ballots to audit: ready\n\
             \x20 Calculate risk measurement: working\n"
        );
    }

    #[test]
    fn setup_menu_marks_active_and_locked() {
        let mut v = view(Screen::SetupWizard(SetupStage::Participants));
        v.menu = vec![
            MenuItem {
                stage: SetupStage::Participants,
                title: "Participants",
                active: true,
                state: MenuItemState::Live,
            },
            MenuItem {
                stage: SetupStage::TargetContests,
                title: "Target Contests",
                active: false,
                state: MenuItemState::Locked,
            },
        ];
        v.notice = Some("Timed out".to_string());
        let text = render(&v, None);
        assert!(text.contains("! Timed out\n"));
        assert!(text.contains(" > Participants\n"));
        assert!(text.contains("   Target Contests (locked)\n"));
    }

    #[test]
    fn ballot_entry_shows_position_and_interpretation() {
        let key = BallotKey {
            batch_id: "b1".to_string(),
            position: 7,
        };
        let mut v = view(Screen::BallotReview(key.clone()));
        v.entry = Some(EntryView {
            key,
            ordinal: 2,
            total: 3,
            mode: EntryMode::Reviewing,
            interpretation: BallotInterpretation {
                contest_id: "c1".to_string(),
                interpretation: Some(Interpretation::Vote),
                choice_id: Some("choice-A".to_string()),
                comment: None,
            },
            batch_name: "Batch One".to_string(),
            tabulator: None,
        });
        let text = render(&v, None);
        assert!(text.contains("Reviewing ballot 2 of 3: batch Batch One, position 7\n"));
        assert!(text.contains("  interpretation: Vote for choice-A\n"));
    }
}
