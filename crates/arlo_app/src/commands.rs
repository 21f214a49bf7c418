use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arlo_core::{AppState, AuditAction, Msg, Route, SessionContext};
use arlo_engine::sheets::{self, SheetDocument};
use arlo_engine::{write_sheet, ArloClient, EngineHandle};
use arlo_logging::arlo_info;
use chrono::Utc;
use tokio::runtime::Runtime;

use crate::cli::{Command, SheetKind};
use crate::config::AppConfig;
use crate::driver::Driver;
use crate::effects::EffectRunner;
use crate::render::render;

/// Slack on top of the poll budget before a command gives up on the server.
const SERVER_SLACK: Duration = Duration::from_secs(30);

pub fn run(
    command: &Command,
    config: &AppConfig,
    route: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let election_id = config
        .election_id
        .clone()
        .context("no election id: pass --election or set election_id in the config file")?;

    match command {
        Command::Status => {
            let driver = open(config, &election_id, route)?;
            print_view(&driver, out)?;
            driver.unmount();
        }
        Command::Watch { every, times } => {
            let mut driver = open(config, &election_id, route)?;
            print_view(&driver, out)?;
            for _ in 1..*times {
                thread::sleep(Duration::from_secs(*every));
                driver.dispatch(Msg::RefreshRequested);
                driver.settle(budget(config))?;
                print_view(&driver, out)?;
            }
            driver.unmount();
        }
        Command::Reset => {
            let mut driver = open(config, &election_id, route)?;
            driver.dispatch(Msg::ActionRequested(AuditAction::ResetAudit));
            driver.settle(budget(config))?;
            print_view(&driver, out)?;
            driver.unmount();
        }
        Command::SampleSize { value } => {
            let mut driver = open(config, &election_id, route)?;
            driver.dispatch(Msg::SampleSizeInput(value.clone()));
            driver.dispatch(Msg::SampleSizeSubmitted);
            if let Some(error) = driver.view().and_then(|view| view.sample_size_error) {
                driver.unmount();
                bail!("invalid sample size {value:?}: {error}");
            }
            driver.settle(budget(config))?;
            print_view(&driver, out)?;
            driver.unmount();
        }
        Command::Sheets {
            kind,
            jurisdiction,
            round,
            round_num,
            origin,
        } => {
            let origin = origin.as_deref().unwrap_or(&config.base_url);
            let written = build_sheet(
                config,
                &election_id,
                *kind,
                jurisdiction,
                round,
                *round_num,
                origin,
            )?;
            match written {
                Some(doc) => {
                    let path = write_sheet(&config.output_dir, &doc)
                        .with_context(|| format!("writing {}", doc.title))?;
                    writeln!(out, "Wrote {}", path.display())?;
                }
                None => writeln!(out, "No ballots to print")?,
            }
        }
    }
    Ok(())
}

fn budget(config: &AppConfig) -> Duration {
    config.poll_settings().timeout + SERVER_SLACK
}

/// Resolves the session, mounts the view and waits for the first refresh.
pub fn open(config: &AppConfig, election_id: &str, route: Option<&str>) -> Result<Driver> {
    let runtime = Runtime::new().context("starting async runtime")?;
    let client = ArloClient::new(config.api_settings()).context("building HTTP client")?;
    let meta = runtime
        .block_on(client.auth_me())
        .context("fetching session from /auth/me")?;
    let session = SessionContext::from_meta(&meta, election_id, config.flow)
        .context("resolving session role")?;
    arlo_info!("session resolved as {:?}", session.role);

    let route = match route {
        Some(path) => Route::parse(path).with_context(|| format!("parsing route {path}"))?,
        None => home_route(&session),
    };
    let engine = EngineHandle::new(config.engine_settings(election_id))
        .context("starting engine")?;
    let mut driver = Driver::new(AppState::new(session, route), EffectRunner::new(engine));
    driver.dispatch(Msg::Mounted);
    driver.settle(budget(config))?;
    Ok(driver)
}

fn home_route(session: &SessionContext) -> Route {
    match session.board() {
        Some(board) => Route::BoardHome {
            election_id: session.election_id.clone(),
            audit_board_id: board.audit_board_id.clone(),
        },
        None => Route::election(session.election_id.clone()),
    }
}

fn print_view(driver: &Driver, out: &mut impl Write) -> Result<()> {
    if let Some(view) = driver.view() {
        write!(out, "{}", render(&view, Some(Utc::now())))?;
    }
    Ok(())
}

fn build_sheet(
    config: &AppConfig,
    election_id: &str,
    kind: SheetKind,
    jurisdiction_id: &str,
    round_id: &str,
    round_num: Option<u32>,
    origin: &str,
) -> Result<Option<SheetDocument>> {
    let runtime = Runtime::new().context("starting async runtime")?;
    let client = ArloClient::new(config.api_settings()).context("building HTTP client")?;
    let status = runtime
        .block_on(client.audit_status(election_id))
        .context("fetching audit status")?;

    let jurisdiction_name = status
        .jurisdiction(jurisdiction_id)
        .map(|j| j.name.clone())
        .unwrap_or_else(|| jurisdiction_id.to_string());
    let round_num = round_num.unwrap_or_else(|| {
        status
            .rounds
            .iter()
            .position(|round| round.id == round_id)
            .map_or(1, |index| index as u32 + 1)
    });

    let doc = match kind {
        SheetKind::Labels | SheetKind::Placeholders => {
            let ballots = runtime
                .block_on(client.round_ballots(election_id, jurisdiction_id, round_id))
                .context("fetching ballot list")?;
            if kind == SheetKind::Labels {
                sheets::labels(round_num, &ballots, &jurisdiction_name, &status.name)
            } else {
                sheets::placeholders(round_num, &ballots, &jurisdiction_name, &status.name)
            }
        }
        SheetKind::Credentials => {
            let boards = runtime
                .block_on(client.audit_boards(election_id, jurisdiction_id, round_id))
                .context("fetching audit boards")?;
            Some(sheets::credentials(
                &boards,
                origin,
                &jurisdiction_name,
                &status.name,
            ))
        }
    };
    Ok(doc)
}
