use std::io::{self, Write};
use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dispatch::{Dispatcher, ErrorCode, ReqwestTransport};
use futures_util::StreamExt;
use plantdoc::chat::{Assistant, ChatError, Message, Persona, Sender, Topic};
use plantdoc::config::{self, ConfigError, DispatchConfig, GeminiConfig, PlantIdConfig};
use plantdoc::diagnosis::{Candidate, CandidateFilter, DiagnosisError, PlantIdClient, encode_image};
use plantdoc::llm::{GeminiClient, TextGenerator};
use plantdoc::notify::{Notifier, ToastVariant};
use plantdoc::report;
use plantdoc::services::guide::enhanced_info;
use plantdoc::symptoms::{Symptom, SymptomSet, assess};
use plantdoc::typewriter::{DEFAULT_TYPING_INTERVAL, typewriter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client init failed: {0}")]
    HttpClient(String),
    #[error("failed to read image {path}: {source}")]
    ReadImage { path: PathBuf, source: io::Error },
    #[error("invalid --answers JSON: {0}")]
    InvalidAnswers(#[from] serde_json::Error),
    #[error(transparent)]
    Diagnosis(#[from] DiagnosisError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("io failed: {0}")]
    Io(#[from] io::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::HttpClient(_) => "E_HTTP_CLIENT",
            Self::ReadImage { .. } => "E_READ_IMAGE",
            Self::InvalidAnswers(_) => "E_INVALID_ANSWERS",
            Self::Diagnosis(e) => e.error_code(),
            Self::Chat(e) => e.error_code(),
            Self::Io(_) => "E_IO",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "plantdoc", about = "Plant disease and nutrient deficiency diagnosis CLI")]
struct Cli {
    /// Delay between revealed characters of assistant replies, in ms.
    #[arg(long, global = true)]
    typing_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess a plant photo for diseases.
    Diagnose(DiagnoseArgs),
    /// Score reported symptoms against known deficiencies.
    Symptoms(SymptomsArgs),
    /// Generate an expert guide for a named plant disease.
    Guide(GuideArgs),
    /// Chat with an assistant.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    image: PathBuf,

    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,

    /// Keep only the most likely disease.
    #[arg(long)]
    top: bool,

    /// Follow up with a generated guide for the top result.
    #[arg(long)]
    guide: bool,
}

#[derive(Args, Debug)]
struct SymptomsArgs {
    #[arg(long = "symptom", value_parser = parse_symptom)]
    symptoms: Vec<Symptom>,

    /// Questionnaire answers as a JSON object, e.g. '{"fatigue":true}'.
    #[arg(long)]
    answers: Option<String>,

    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,

    /// Continue into the nutrition assistant focused on the top result.
    #[arg(long)]
    chat: bool,
}

#[derive(Args, Debug)]
struct GuideArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value_t = 1.0, value_parser = parse_threshold)]
    probability: f64,
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, value_enum, default_value_t = PersonaArg::Plant)]
    persona: PersonaArg,

    /// Condition to focus the conversation on.
    #[arg(long)]
    topic: Option<String>,

    #[arg(long, default_value = "", requires = "topic")]
    topic_description: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PersonaArg {
    Plant,
    Nutrition,
}

impl From<PersonaArg> for Persona {
    fn from(arg: PersonaArg) -> Self {
        match arg {
            PersonaArg::Plant => Persona::Plant,
            PersonaArg::Nutrition => Persona::Nutrition,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let typing = cli.typing_ms.map_or(DEFAULT_TYPING_INTERVAL, Duration::from_millis);
    let result = match cli.command {
        Command::Diagnose(args) => run_diagnose(args).await,
        Command::Symptoms(args) => run_symptoms(args, typing).await,
        Command::Guide(args) => run_guide(args).await,
        Command::Chat(args) => {
            let topic = args.topic.map(|name| Topic::new(name, args.topic_description));
            run_chat(args.persona.into(), topic, typing).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

// =============================================================================
// ARGUMENT PARSERS
// =============================================================================

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    config::validate_threshold(value).map_err(|v| format!("{v} is outside [0, 1]"))
}

fn parse_symptom(raw: &str) -> Result<Symptom, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned())).map_err(|_| {
        let known: Vec<String> = Symptom::ALL
            .iter()
            .filter_map(|s| serde_json::to_value(s).ok())
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        format!("unknown symptom `{raw}`; expected one of: {}", known.join(", "))
    })
}

// =============================================================================
// COMMANDS
// =============================================================================

fn dispatcher() -> Result<Dispatcher, CliError> {
    let config = DispatchConfig::from_env();
    let policy = config.retry_policy();
    let transport = ReqwestTransport::new(config.connect_timeout(), policy.attempt_timeout())
        .map_err(|e| CliError::HttpClient(e.to_string()))?;
    let dispatcher = Dispatcher::new(Arc::new(transport), policy);

    let policy = dispatcher.policy();
    info!(
        max_attempts = policy.max_attempts(),
        attempt_timeout_secs = policy.attempt_timeout().as_secs(),
        max_backoff_ms = u64::try_from(policy.total_backoff().as_millis()).unwrap_or(u64::MAX),
        "dispatcher initialized"
    );
    Ok(dispatcher)
}

fn gemini(dispatcher: Dispatcher) -> Result<GeminiClient, CliError> {
    let config = GeminiConfig::from_env()?;
    let client = GeminiClient::new(dispatcher, &config);
    info!(model = client.model(), "gemini client initialized");
    Ok(client)
}

async fn run_diagnose(args: DiagnoseArgs) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.image).map_err(|source| CliError::ReadImage { path: args.image.clone(), source })?;

    let config = PlantIdConfig::from_env()?;
    let dispatcher = dispatcher()?;
    let client = PlantIdClient::new(dispatcher.clone(), &config).with_filter(diagnosis_filter(&config, &args));
    let assessment = client.identify(&encode_image(&bytes)).await?;
    println!("{}", report::render_assessment(&assessment));
    if assessment.candidates.is_empty() {
        let cutoff = report::percent_label(client.filter().threshold, 0);
        eprintln!("nothing scored above {cutoff}; try a lower --threshold");
    }

    if args.guide {
        if let Some(top) = assessment.candidates.first() {
            let generator = gemini(dispatcher)?.with_safety(None);
            println!("{}", enhanced_info(&generator, top).await);
        }
    }
    Ok(())
}

/// Command-line flags override the environment's cutoff; `--top` can only
/// narrow the result.
fn diagnosis_filter(config: &PlantIdConfig, args: &DiagnoseArgs) -> CandidateFilter {
    CandidateFilter::new(args.threshold.unwrap_or(config.threshold), config.top_only || args.top)
}

async fn run_symptoms(args: SymptomsArgs, typing: Duration) -> Result<(), CliError> {
    let mut reported = match &args.answers {
        Some(json) => serde_json::from_str::<SymptomSet>(json)?,
        None => SymptomSet::new(),
    };
    for symptom in args.symptoms {
        reported.insert(symptom);
    }

    let threshold = match args.threshold {
        Some(t) => t,
        None => config::symptom_threshold()?,
    };
    let results = assess(&reported, CandidateFilter::new(threshold, false));
    println!("{}", report::render_deficiencies(&results));

    if args.chat {
        let topic = results.first().map(|d| Topic::new(d.name.clone(), d.description.clone()));
        run_chat(Persona::Nutrition, topic, typing).await?;
    }
    Ok(())
}

async fn run_guide(args: GuideArgs) -> Result<(), CliError> {
    let candidate = Candidate {
        name: args.name,
        probability: args.probability,
        description: args.description,
        treatment: None,
        taxonomy: None,
        common_names: None,
        url: None,
    };
    let generator = gemini(dispatcher()?)?.with_safety(None);
    println!("{}", enhanced_info(&generator, &candidate).await);
    Ok(())
}

// =============================================================================
// CHAT
// =============================================================================

const CHAT_HELP: &str = "Commands: /retry re-sends after an error, /good or /bad rates the last reply, /quit exits.";

async fn run_chat(persona: Persona, topic: Option<Topic>, typing: Duration) -> Result<(), CliError> {
    let generator: Arc<dyn TextGenerator> = Arc::new(gemini(dispatcher()?)?);
    let notifier = Notifier::new();
    let mut toasts = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(toast) => {
                    let marker = if toast.variant == ToastVariant::Destructive { "!" } else { "*" };
                    eprintln!("[{marker}] {}: {}", toast.title, toast.description);
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut assistant = Assistant::new(persona, topic, generator, notifier);
    if let Some(greeting) = assistant.conversation().messages().first() {
        type_out(&greeting.content, typing).await?;
    }
    println!("{CHAT_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match line.trim() {
            "" => continue,
            "/quit" => break,
            "/retry" => assistant.retry().await,
            "/good" | "/bad" => {
                rate_last_reply(&mut assistant, line.trim() == "/good");
                continue;
            }
            text => assistant.send(text).await,
        };

        match outcome {
            Ok(reply) => type_out(&reply_text(&reply), typing).await?,
            Err(e @ (ChatError::NothingToRetry | ChatError::EmptyMessage | ChatError::Busy)) => eprintln!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Text shown for a resolved reply; failed replies carry a marker and a hint.
fn reply_text(reply: &Message) -> String {
    if reply.error {
        format!("[error] {}\n(type /retry to resend)", reply.content)
    } else {
        reply.content.clone()
    }
}

fn rate_last_reply(assistant: &mut Assistant, helpful: bool) {
    let last_reply = assistant.conversation().messages().iter().rev().find(|m| m.sender == Sender::Bot).map(|m| m.id);
    match last_reply {
        Some(id) if assistant.mark_helpful(id, helpful) => {}
        _ => eprintln!("nothing to rate yet"),
    }
}

async fn type_out(text: &str, interval: Duration) -> io::Result<()> {
    let mut stdout = io::stdout();
    if interval.is_zero() {
        return writeln!(stdout, "{text}");
    }

    let mut frames = pin!(typewriter(text, interval));
    let mut shown = 0;
    while let Some(frame) = frames.next().await {
        write!(stdout, "{}", &frame[shown..])?;
        stdout.flush()?;
        shown = frame.len();
    }
    writeln!(stdout)
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
