use anyhow::{Context, Result};
use markguard_core::view_model::{DashboardView, FormView, ResultPanelView};
use markguard_core::{ClientConfig, ScanSession, SessionView};
use markguard_model::{AggregateStats, ScanResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::command::{self, Command};
use crate::render;

enum Flow {
    Continue,
    Quit,
}

/// What has already been drawn, so unchanged state is not redrawn.
#[derive(Default)]
struct Screen {
    stats: Option<AggregateStats>,
    result: Option<ScanResult>,
}

impl Screen {
    fn draw_stats(&mut self, session: &ScanSession, force: bool) {
        let snapshot = session.synchronizer().snapshot();
        if !force && self.stats == Some(snapshot.stats) {
            return;
        }
        self.stats = Some(snapshot.stats);
        println!("{}", render::dashboard(&DashboardView::from(&snapshot)));
    }

    fn draw_session(&mut self, view: &SessionView, force: bool) {
        println!("{}", render::form(&FormView::from(view)));
        if !force && self.result == view.result {
            return;
        }
        self.result = view.result.clone();
        if let Some(result) = &view.result {
            let panel = ResultPanelView::from(result);
            println!("{}", render::result_panel(&panel));
        }
    }
}

/// Mounts a session and drives it from stdin until `quit` or end of input.
pub async fn run(config: ClientConfig) -> Result<()> {
    let mut session =
        ScanSession::start(&config).context("failed to start scan session")?;
    let mut notices = session
        .take_notices()
        .context("notice stream already taken")?;
    let mut history = session
        .take_history_replies()
        .context("history stream already taken")?;
    let mut stats = session.subscribe_stats();
    let mut views = session.subscribe_session();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::default();

    info!(server = %config.base_url, "markguard console ready");
    println!("{}", command::HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let flow = handle_line(&session, &mut screen, &line).await;
                    if let Flow::Quit = flow {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read operator input");
                    break;
                }
            },
            Ok(()) = stats.changed() => {
                stats.borrow_and_update();
                screen.draw_stats(&session, false);
            }
            Ok(()) = views.changed() => {
                let view = views.borrow_and_update().clone();
                screen.draw_session(&view, false);
            }
            Some(notice) = notices.recv() => {
                println!("! {notice}");
            }
            Some(reply) = history.recv() => match reply.result {
                Ok(page) => println!("{}", render::history(reply.page, &page)),
                Err(e) => {
                    warn!(error = %e, "history fetch failed");
                    println!("! could not load history");
                }
            },
        }
    }

    session.shutdown().await;
    Ok(())
}

async fn handle_line(
    session: &ScanSession,
    screen: &mut Screen,
    line: &str,
) -> Flow {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Flow::Continue,
        Err(e) => {
            println!("! {e}");
            return Flow::Continue;
        }
    };

    match command {
        Command::SelectImage(path) => match command::load_image(&path).await {
            Ok(image) => session.select_image(image),
            Err(e) => println!("! could not read {}: {e}", path.display()),
        },
        Command::SetPartNumber(part_number) => {
            session.set_part_number(part_number)
        }
        Command::Submit => {
            // Validation failures already produced a notice.
            if let Err(reason) = session.spawn_submit() {
                debug!(%reason, "submit not started");
            }
        }
        Command::Refresh => session.refresh_now(),
        Command::History { page, limit } => {
            session.request_history(page, limit)
        }
        Command::Show => {
            screen.draw_stats(session, true);
            screen.draw_session(&session.orchestrator().view(), true);
        }
        Command::Help => println!("{}", command::HELP),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}
