use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use diffnosis_core::{http_completer, Config, RelaySession, RelaySettings, Sex, UserProfile};
use tracing::info;

mod app;
mod handler;
mod input;
mod logging;
mod tui;
mod ui;

use app::{App, ProfileForm};
use logging::LogTarget;

#[derive(Parser)]
#[command(name = "diffnosis")]
#[command(version, about = "Your at-home health consultant, in the terminal")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    profile: ProfileArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Pre-fill the profile form
#[derive(Args, Debug, Default)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Height in centimetres
    #[arg(long)]
    height: Option<String>,
    /// Weight in kilograms
    #[arg(long)]
    weight: Option<String>,
    #[arg(long, value_parser = parse_sex)]
    sex: Option<Sex>,
    /// Image to analyze at the start of the session
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe symptoms once and print the conversation
    Ask {
        /// What you are experiencing
        symptoms: String,
    },
}

fn parse_sex(s: &str) -> Result<Sex, String> {
    Sex::from_str(s).ok_or_else(|| format!("expected male or female, got '{}'", s))
}

impl ProfileArgs {
    /// Profile without the photo; the photo is read separately.
    fn to_profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone().unwrap_or_default(),
            age: self.age.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            height: self.height.clone().unwrap_or_default(),
            weight: self.weight.clone().unwrap_or_default(),
            sex: self.sex.unwrap_or_default(),
            photo: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = config.resolve()?;

    match cli.command {
        Some(Commands::Ask { symptoms }) => {
            logging::init(cli.verbose, LogTarget::Stderr)?;
            ask(&settings, &cli.profile, &symptoms).await
        }
        None => {
            let log_path = Config::config_dir()?.join("diffnosis.log");
            logging::init(cli.verbose, LogTarget::File(log_path))?;
            run_tui(&settings, &cli.profile).await
        }
    }
}

/// One headless session: optional image turn, one symptom turn, print the log.
async fn ask(settings: &RelaySettings, args: &ProfileArgs, symptoms: &str) -> Result<()> {
    let mut profile = args.to_profile();
    if let Some(path) = &args.photo {
        profile = profile.with_photo_file(path)?;
    }

    info!(?settings, "Running one-shot session");
    let mut session = RelaySession::new(http_completer(settings)?);
    session.session_start(profile);
    session.wait_pending().await;

    session.submit(symptoms).context("Could not send symptoms")?;
    session.wait_pending().await;

    for entry in session.observe_log() {
        println!("{}: {}\n", entry.speaker.label(), entry.text);
    }

    session.session_end();
    Ok(())
}

async fn run_tui(settings: &RelaySettings, args: &ProfileArgs) -> Result<()> {
    info!(?settings, "Starting TUI");
    let session = RelaySession::new(http_completer(settings)?);
    let form = ProfileForm::from_profile(&args.to_profile(), args.photo.as_deref());
    let model_label = format!("{}: {}", settings.provider.display_name(), settings.model);
    let mut app = App::new(session, form, model_label);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event);
            }
            app.poll_session().await;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    app.session.session_end();
    result
}
