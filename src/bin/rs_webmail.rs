use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use rs_webmail::api::http::HttpBackend;
use rs_webmail::config::{Config, load_config};
use rs_webmail::controller::{Command as Ui, ViewController};
use rs_webmail::domain::email::{ComposeDraft, EmailId, Mailbox};
use rs_webmail::session_store;
use rs_webmail::terminal::run_tui;

#[derive(Parser)]
#[command(name = "rs_webmail")]
#[command(about = "Terminal client for a REST mail backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive client (default)
    Tui,

    /// Print a mailbox (inbox, sent, archive)
    List { mailbox: String },

    /// Print one email, marking it read
    Read { id: EmailId },

    /// Send an email
    Send {
        /// Comma-separated recipient addresses
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Toggle the archived flag of an email
    Archive { id: EmailId },

    /// Store the backend session cookie in the keyring (read from stdin)
    SetSession,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;

    match cli.cmd.unwrap_or(Command::Tui) {
        Command::SetSession => {
            eprintln!("Paste session cookie as name=value (end with Ctrl-D):");
            let mut cookie = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut cookie)?;
            session_store::save_session_cookie(&cfg.base_url, cookie.trim())?;
            println!("Saved session cookie for {}", cfg.base_url);
            Ok(())
        }

        Command::Tui => {
            let backend = connect(&cfg)?;
            run_tui(Arc::new(backend), cfg.retry_policy(), cfg.user_email.clone())
        }

        Command::List { mailbox } => {
            let mut ctl = run_once(&cfg, Ui::LoadMailbox(Mailbox::from(mailbox.as_str())))?;
            if let Some(listing) = ctl.listing() {
                print!("{listing}");
            }
            finish(&mut ctl)
        }

        Command::Read { id } => {
            let mut ctl = run_once(&cfg, Ui::LoadEmail(id))?;
            if let Some(pane) = ctl.reading() {
                println!("{pane}");
            }
            finish(&mut ctl)
        }

        Command::Send { to, subject, body } => {
            let backend = connect(&cfg)?;
            let mut ctl = ViewController::new();
            ctl.compose_email(Some(ComposeDraft::new(to, subject, body)));
            ctl.run(Ui::Send, &backend, cfg.retry_policy());
            if ctl.notice().is_none() {
                println!("Sent.");
            }
            finish(&mut ctl)
        }

        Command::Archive { id } => {
            let backend = connect(&cfg)?;
            let mut ctl = ViewController::new();
            // open first so the toggled state has somewhere to land
            ctl.run(Ui::LoadEmail(id), &backend, cfg.retry_policy());
            ctl.run(Ui::ToggleArchive(id), &backend, cfg.retry_policy());
            if let Some(pane) = ctl.reading() {
                let state = if pane.email.archived { "archived" } else { "unarchived" };
                println!("Email {id} {state}; button now reads \"{}\"", pane.archive_label());
            }
            finish(&mut ctl)
        }
    }
}

fn connect(cfg: &Config) -> Result<HttpBackend> {
    let cookie = session_store::resolve_session_cookie(&cfg.base_url)?;
    HttpBackend::new(&cfg.base_url, cookie.as_deref(), cfg.request_timeout())
}

fn run_once(cfg: &Config, command: Ui) -> Result<ViewController> {
    let backend = connect(cfg)?;
    let mut ctl = ViewController::new();
    ctl.run(command, &backend, cfg.retry_policy());
    Ok(ctl)
}

fn finish(ctl: &mut ViewController) -> Result<()> {
    match ctl.dismiss_notice() {
        Some(notice) => Err(anyhow!(notice)),
        None => Ok(()),
    }
}
