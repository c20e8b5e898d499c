pub mod events;
pub mod state;
pub mod ui;

use anyhow::{Result, anyhow};
use log::debug;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::api::MailBackend;
use crate::controller::jobs::{self, Job, Outcome, RetryPolicy};
use crate::controller::{RequestToken, ViewController};
use crate::terminal::events::{Action, handle_key};
use crate::terminal::state::TuiState;

/// Runs jobs off the UI thread, one thread per request, so a slow response
/// never blocks input. Outcomes come back tagged with their token.
struct Worker {
    backend: Arc<dyn MailBackend>,
    retry: RetryPolicy,
    tx: Sender<(RequestToken, Outcome)>,
    rx: Receiver<(RequestToken, Outcome)>,
}

impl Worker {
    fn new(backend: Arc<dyn MailBackend>, retry: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            retry,
            tx,
            rx,
        }
    }

    fn submit(&self, job: Job) {
        let backend = Arc::clone(&self.backend);
        let retry = self.retry;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = jobs::execute(&job.kind, backend.as_ref(), retry);
            // receiver gone means the UI already quit
            let _ = tx.send((job.token, outcome));
        });
    }
}

pub fn run_tui(
    backend: Arc<dyn MailBackend>,
    retry: RetryPolicy,
    user_email: Option<String>,
) -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("{e}"))?;

    let terminal = ratatui::init();
    let result = run(terminal, Worker::new(backend, retry), TuiState::new(user_email));
    ratatui::restore();

    result
}

fn run(mut terminal: DefaultTerminal, worker: Worker, mut ui: TuiState) -> Result<()> {
    let mut ctl = ViewController::new();
    worker.submit(ctl.start());

    loop {
        while let Ok((token, outcome)) = worker.rx.try_recv() {
            if let Some(next) = ctl.apply(token, outcome) {
                worker.submit(next);
            }
            ui.sync(&ctl);
        }

        terminal.draw(|f| ui::render(f, &ctl, &ui))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(key, &mut ctl, &mut ui) {
            Action::Quit => break,
            Action::Nothing => {}
            Action::Dispatch(command) => {
                debug!("dispatch {command:?}");
                if let Some(job) = ctl.dispatch(command) {
                    worker.submit(job);
                }
            }
        }
        ui.sync(&ctl);
    }

    Ok(())
}
