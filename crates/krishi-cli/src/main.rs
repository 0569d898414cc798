use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use krishi_core::{
    AnalysisScreen, AppContext, CalendarScreen, ChatbotScreen, Config, ForumScreen, ForumThread,
    MarketScreen, SchemeCategory, SchemesScreen, SessionStore, SoilReadings, SoilScreen,
    WeatherScreen,
};

mod render;

#[derive(Parser)]
#[command(name = "krishi")]
#[command(about = "Farm assistant: weather, crop advice, schemes and market prices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current weather and five-day forecast
    Weather {
        /// City name
        city: String,
    },
    /// Ask the farming assistant
    Chat {
        /// Send one message and exit; without it, read messages from stdin
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Classify a crop leaf photo with the analysis server
    Analyze {
        /// Path to the photo
        image: String,
        /// Crop type (maize, tomato, cashew, cassava)
        #[arg(short, long)]
        crop: String,
    },
    /// Soil readings: status of each value and recommendations
    Soil {
        #[arg(long, default_value = "")]
        moisture: String,
        #[arg(long, default_value = "")]
        temperature: String,
        #[arg(long, default_value = "")]
        ph: String,
        #[arg(long, default_value = "")]
        nitrogen: String,
        /// Crop to tailor advice for
        #[arg(long, default_value = "general")]
        crop: String,
        /// Only show statuses, do not ask for recommendations
        #[arg(long)]
        offline: bool,
    },
    /// Sowing, growing and harvesting months for a state
    Calendar {
        /// Indian state
        state: String,
    },
    /// List states with crop calendar data
    States {
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Government schemes
    Schemes {
        /// previous or upcoming
        #[arg(short, long, default_value = "upcoming")]
        tab: String,
    },
    /// Community forum discussions
    Forum,
    /// Open a forum thread, optionally posting to it
    Thread {
        /// Discussion topic
        topic: String,
        /// Text to post
        #[arg(long)]
        send: Option<String>,
        /// Voice recording to post
        #[arg(long)]
        voice: Option<String>,
    },
    /// Mandi prices per kg
    Prices,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Sign in with email and password
    SignIn {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the signed-in user
    SignOut,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print current settings
    Show,
    /// Set a value (empty value clears it)
    Set { key: String, value: String },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Settings commands work on the file alone, without env overrides.
    if let Commands::Config { action } = &cli.command {
        return run_config(action);
    }

    let store = SessionStore::default_location()?;
    let session = store.load().unwrap_or_default();
    let config = Config::load()?;
    debug!(path = %store.path().display(), "session loaded");
    let mut ctx = AppContext::from_config(config, session);

    match cli.command {
        Commands::Weather { city } => {
            let mut screen = WeatherScreen::new();
            screen.search(&ctx, &city).await;
            render::resolved(screen.state(), |r| render::weather(r))?;
        }
        Commands::Chat { message } => run_chat(&mut ctx, message).await?,
        Commands::Analyze { image, crop } => {
            let mut screen = AnalysisScreen::new();
            screen.analyze(&ctx, &crop, &image).await;
            render::resolved(screen.state(), |r| render::analysis(r))?;
        }
        Commands::Soil {
            moisture,
            temperature,
            ph,
            nitrogen,
            crop,
            offline,
        } => {
            let readings = SoilReadings {
                moisture,
                temperature,
                ph,
                nitrogen,
            };
            render::statuses(&SoilScreen::statuses(&readings));
            if !offline {
                let mut screen = SoilScreen::new();
                screen.recommend(&ctx, &readings, &crop).await;
                println!();
                render::resolved(screen.state(), |text| println!("{}", text))?;
            }
        }
        Commands::Calendar { state } => {
            let mut screen = CalendarScreen::new(&ctx);
            screen.select_state(&ctx, &state).await;
            render::resolved(screen.state(), |s| render::seasons(s))?;
        }
        Commands::States { search } => {
            let screen = CalendarScreen::new(&ctx);
            for state in screen.search(search.as_deref().unwrap_or("")) {
                println!("{}", state);
            }
        }
        Commands::Schemes { tab } => {
            let category: SchemeCategory = tab.parse()?;
            let mut screen = SchemesScreen::new();
            screen.select(&ctx, category).await;
            render::resolved(screen.state(), |s| render::schemes(s))?;
        }
        Commands::Forum => {
            let mut screen = ForumScreen::new();
            screen.load(&ctx).await;
            render::resolved(screen.state(), |p| render::forum(p))?;
        }
        Commands::Thread { topic, send, voice } => {
            let mut thread = ForumThread::open(&ctx, &topic).await?;
            if let Some(text) = send {
                thread.send_text(&text)?;
            }
            if let Some(voice) = voice {
                thread.send_voice(&voice)?;
            }
            println!("{}\n", thread.topic());
            for message in thread.messages() {
                render::message(message);
            }
        }
        Commands::Prices => {
            let mut screen = MarketScreen::new();
            screen.load(&ctx).await;
            render::resolved(screen.state(), |p| render::prices(p))?;
        }
        Commands::SignIn { email, password } => {
            store.sign_in(&mut ctx.session, &email, &password)?;
            println!("Signed in as {}.", email.trim());
        }
        Commands::SignOut => {
            if ctx.session.is_signed_in() {
                store.sign_out(&mut ctx.session)?;
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn run_chat(ctx: &mut AppContext, message: Option<String>) -> Result<()> {
    let mut chat = ChatbotScreen::open(ctx);

    if let Some(message) = message {
        chat.send(ctx, &message).await;
        if let Some(reply) = chat.messages().last() {
            render::message(reply);
        }
        chat.close(ctx);
        return Ok(());
    }

    for greeting in chat.messages() {
        render::message(greeting);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let before = chat.messages().len();
        chat.send(ctx, &line).await;
        // Skip the echoed user bubble, print what the assistant added.
        for message in chat.messages().iter().skip(before + 1) {
            render::message(message);
        }
    }
    chat.close(ctx);
    Ok(())
}

fn run_config(action: &ConfigAction) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut config = Config::load_from(&path)?;
    match action {
        ConfigAction::Show => {
            println!("{}", path.display());
            for (key, value) in config.describe() {
                println!("  {} = {}", key, value);
            }
        }
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save_to(&path)?;
            println!("Saved {}.", key);
        }
    }
    Ok(())
}
