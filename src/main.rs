use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contextus_ptt::{
    create_router, ApiClient, AppState, AudioSource, Collaborators, Config, Conversation, NoticeLog,
    PromptStore, PttController, PttHandle, WavAudioDevice, WavDeviceConfig,
};
use contextus_ptt::session::TracingFeedback;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contextus-ptt")]
#[command(about = "Push-to-talk voice chat core", long_about = None)]
struct Cli {
    /// Config file, without extension
    #[arg(short, long, default_value = "config/contextus")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP control surface (default)
    Serve,
    /// Send one text message and print the conversation
    Send {
        /// Message to send
        text: String,
    },
}

/// Everything the controller and the HTTP surface share
struct Runtime {
    ptt: PttHandle,
    task: tokio::task::JoinHandle<()>,
    conversation: Conversation,
    notices: NoticeLog,
    prompts: PromptStore,
}

fn start(cfg: &Config) -> Result<Runtime> {
    let source = match cfg.audio.input_path()? {
        Some(path) => AudioSource::File(path),
        None => AudioSource::Microphone,
    };

    let device = WavAudioDevice::new(WavDeviceConfig {
        recordings_path: cfg.audio.recordings_dir()?,
        source,
        backend: cfg.audio.backend_config(),
    });
    let api = Arc::new(ApiClient::from_config(&cfg.backend)?);

    let conversation = Conversation::new();
    let notices = NoticeLog::default();
    let prompts = PromptStore::new(cfg.context.prompt_file()?);

    let collaborators = Collaborators {
        device: Arc::new(device),
        uploader: api.clone(),
        chat: api,
        sink: Arc::new(conversation.clone()),
        notifier: Arc::new(notices.clone()),
        feedback: Arc::new(TracingFeedback),
        prompts: Arc::new(prompts.clone()),
    };

    let (ptt, task) = PttController::spawn(cfg.ptt.clone(), collaborators);

    Ok(Runtime {
        ptt,
        task,
        conversation,
        notices,
        prompts,
    })
}

async fn serve(cfg: &Config, runtime: Runtime) -> Result<()> {
    runtime.ptt.focus().await?;

    let state = AppState::new(
        runtime.ptt.clone(),
        runtime.conversation,
        runtime.notices,
        runtime.prompts,
    );
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    runtime.ptt.shutdown().await?;
    runtime.task.await?;
    Ok(())
}

async fn send(runtime: Runtime, text: String) -> Result<()> {
    runtime.ptt.focus().await?;
    runtime.ptt.send_text(text).await?;
    runtime.ptt.flush().await?;

    for message in runtime.conversation.messages().await {
        println!("[{:?}] {}", message.sender, message.text);
    }
    for notice in runtime.notices.recent() {
        eprintln!("{}: {}", notice.title, notice.message);
    }

    runtime.ptt.shutdown().await?;
    runtime.task.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Contextus push-to-talk v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {}", cfg.backend.base_url);

    let runtime = start(&cfg)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cfg, runtime).await,
        Commands::Send { text } => send(runtime, text).await,
    }
}
