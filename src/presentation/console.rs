// Operator console - Line commands and the dashboard view task
use crate::application::pub_service::CommandError;
use crate::domain::chart::ChartRange;
use crate::domain::credential::CredentialStatus;
use crate::domain::keg::StockDirection;
use crate::presentation::app_state::AppState;
use crate::presentation::render::{render_chart, render_dashboard};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
commands:
  login <password>          unlock protected panels
  logout                    forget the stored password
  focus                     refresh as if the window regained focus
  refresh                   refresh the dashboard now
  keg <litres>              switch the tapped keg (0 = none)
  stock <litres> up|down    add or remove a warehouse keg
  range <metric> <range>    select a chart range (now, 1h .. 6m)
  charts                    refetch every chart
  show                      print dashboard and charts
  quit                      exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login(String),
    Logout,
    Focus,
    Refresh,
    SwitchKeg(u32),
    Stock(u32, StockDirection),
    Range { metric: String, token: String },
    Charts,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{0}` is missing an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a number of litres")]
    InvalidLitres(String),
    #[error("direction must be `up` or `down`, got `{0}`")]
    InvalidDirection(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name {
        "login" => {
            let secret = words.next().ok_or(ParseError::MissingArgument("login"))?;
            Command::Login(secret.to_string())
        }
        "logout" => Command::Logout,
        "focus" => Command::Focus,
        "refresh" => Command::Refresh,
        "keg" => Command::SwitchKeg(litres(words.next(), "keg")?),
        "stock" => {
            let size = litres(words.next(), "stock")?;
            let way = match words.next() {
                Some("up") => StockDirection::Up,
                Some("down") => StockDirection::Down,
                Some(other) => return Err(ParseError::InvalidDirection(other.to_string())),
                None => return Err(ParseError::MissingArgument("stock")),
            };
            Command::Stock(size, way)
        }
        "range" => {
            let metric = words.next().ok_or(ParseError::MissingArgument("range"))?;
            let token = words.next().ok_or(ParseError::MissingArgument("range"))?;
            Command::Range {
                metric: metric.to_string(),
                token: token.to_string(),
            }
        }
        "charts" => Command::Charts,
        "show" => Command::Show,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn litres(word: Option<&str>, command: &'static str) -> Result<u32, ParseError> {
    let word = word.ok_or(ParseError::MissingArgument(command))?;
    word.parse()
        .map_err(|_| ParseError::InvalidLitres(word.to_string()))
}

pub enum Outcome {
    Continue(String),
    Quit,
}

pub async fn execute(state: &AppState, command: Command) -> Outcome {
    let message = match command {
        Command::Login(secret) => match state.session.login(&secret).await {
            CredentialStatus::Valid => "Logged in".to_string(),
            CredentialStatus::Checking => "Password check already running".to_string(),
            CredentialStatus::Unknown => "Login cancelled".to_string(),
            CredentialStatus::Invalid => "Wrong password".to_string(),
        },
        Command::Logout => {
            state.session.logout();
            "Logged out".to_string()
        }
        Command::Focus => {
            state.focus.notify();
            String::new()
        }
        Command::Refresh => {
            state.dashboard.refresh().await;
            render_dashboard(&state.dashboard.state(), state.session.is_authenticated())
        }
        Command::SwitchKeg(size) => {
            command_message(state.pub_service.switch_active_keg(size).await, "Keg switched")
        }
        Command::Stock(size, way) => command_message(
            state.pub_service.adjust_warehouse(size, way).await,
            "Warehouse updated",
        ),
        Command::Range { metric, token } => match state.chart(&metric) {
            Some(chart) => {
                let series = chart.series.clone();
                match token.parse::<ChartRange>() {
                    Ok(range) => {
                        series.set_range(range);
                        // Fetch in the background so a newer selection can supersede it
                        tokio::spawn(async move { series.fetch(range).await });
                        format!("{} -> {}", chart.title, token)
                    }
                    Err(e) => e.to_string(),
                }
            }
            None => format!("unknown chart `{}`", metric),
        },
        Command::Charts => {
            futures::future::join_all(state.charts.iter().map(|chart| chart.series.refresh())).await;
            render_charts(state)
        }
        Command::Show => format!(
            "{}\n{}",
            render_dashboard(&state.dashboard.state(), state.session.is_authenticated()),
            render_charts(state)
        ),
        Command::Help => HELP.to_string(),
        Command::Quit => return Outcome::Quit,
    };

    Outcome::Continue(message)
}

fn command_message(result: Result<(), CommandError>, done: &str) -> String {
    match result {
        Ok(()) => done.to_string(),
        Err(CommandError::NotAuthenticated) => "Log in first".to_string(),
        Err(CommandError::InvalidKeg(e)) => e.to_string(),
        Err(CommandError::Backend(_)) => "Error! Please try again later.".to_string(),
    }
}

fn render_charts(state: &AppState) -> String {
    state
        .charts
        .iter()
        .map(|chart| render_chart(&chart.title, &chart.series.state(), chart.series.stepped()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read commands until `quit` or end of input.
pub async fn run_console<R>(state: Arc<AppState>, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(&state, command).await {
            Outcome::Continue(message) if message.is_empty() => {}
            Outcome::Continue(message) => println!("{}", message),
            Outcome::Quit => break,
        }
    }
    Ok(())
}

/// Print the dashboard every time a new snapshot lands or the session
/// locks or unlocks.
pub async fn watch_dashboard(state: Arc<AppState>) {
    let mut updates = state.dashboard.subscribe();
    let mut credential = state.session.subscribe();
    let mut shown = updates.borrow_and_update().snapshot.clone();
    let mut unlocked = credential.borrow_and_update().is_authenticated();

    loop {
        let changed = tokio::select! {
            changed = updates.changed() => changed,
            changed = credential.changed() => changed,
        };
        if changed.is_err() {
            break;
        }

        let current = updates.borrow_and_update().clone();
        let authenticated = credential.borrow_and_update().is_authenticated();
        if Arc::ptr_eq(&shown, &current.snapshot) && unlocked == authenticated {
            continue;
        }
        shown = current.snapshot.clone();
        unlocked = authenticated;

        println!(
            "--- {} ---\n{}",
            chrono::Local::now().format("%H:%M:%S"),
            render_dashboard(&current, authenticated)
        );
    }
}
