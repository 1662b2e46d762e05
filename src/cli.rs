use agenda::config::{
    AppConfig, DEFAULT_PUSH_ICON, DEFAULT_PUSH_TTL_SECONDS, DEFAULT_SMS_COUNTRY_CODE,
    DEFAULT_SMS_ENDPOINT, FileConfig, PushConfig, SchedulerConfig, SmsConfig,
};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use time::macros::format_description;
use time::{Time, UtcOffset};

const DEFAULT_APP_NAME: &str = "Agenda";
const DEFAULT_DATABASE: &str = "agenda.db";
const DEFAULT_LISTEN: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_UTC_OFFSET: &str = "-05:00";
const DEFAULT_TICK_SECONDS: u64 = 60;
const DEFAULT_DAILY_SUMMARY_AT: &str = "07:00";
const DEFAULT_SMS_FROM: &str = "Agenda";

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    let file = match cli.config.as_deref() {
        Some(path) => match FileConfig::load(path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("error: {err}");
                return RunOutcome::Exit(2);
            }
        },
        None => FileConfig::default(),
    };

    match resolve_config(&cli, file) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "agenda",
    version,
    about = "Appointment reminders and notifications for small businesses"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "AGENDA_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "AGENDA_DATABASE")]
    database: Option<PathBuf>,
    #[arg(long, env = "AGENDA_LISTEN")]
    listen: Option<SocketAddr>,
    #[arg(long, env = "AGENDA_APP_NAME")]
    app_name: Option<String>,
    #[arg(long, env = "AGENDA_UTC_OFFSET", allow_hyphen_values = true)]
    utc_offset: Option<String>,
    #[arg(long, env = "AGENDA_TICK_SECONDS")]
    tick_seconds: Option<u64>,
    #[arg(long, env = "AGENDA_DAILY_SUMMARY_AT")]
    daily_summary_at: Option<String>,
    #[arg(long)]
    no_scheduler: bool,
    #[arg(long, env = "AGENDA_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "AGENDA_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "AGENDA_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "AGENDA_SMS_API_KEY")]
    sms_api_key: Option<String>,
    #[arg(long, env = "AGENDA_SMS_API_SECRET")]
    sms_api_secret: Option<String>,
    #[arg(long, env = "AGENDA_SMS_FROM")]
    sms_from: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate VAPID credentials for web push.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match agenda::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("AGENDA_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("AGENDA_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("AGENDA_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace AGENDA_VAPID_SUBJECT with a contact URI you control.");
    }
    println!();
    println!(
        "--vapid-private-key \"{}\" --vapid-public-key \"{}\" --vapid-subject \"{subject}\"",
        credentials.private_key, credentials.public_key
    );
    0
}

/// Flags and env vars win over the file, the file over built-in defaults.
fn resolve_config(cli: &Cli, file: FileConfig) -> Result<AppConfig, String> {
    let utc_offset = cli
        .utc_offset
        .as_deref()
        .or(file.utc_offset.as_deref())
        .unwrap_or(DEFAULT_UTC_OFFSET);
    let utc_offset = parse_utc_offset(utc_offset)?;

    Ok(AppConfig {
        app_name: cli
            .app_name
            .clone()
            .or(file.app_name)
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        database_path: cli
            .database
            .clone()
            .or(file.database)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
        listen: cli
            .listen
            .or(file.listen)
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_LISTEN)),
        utc_offset,
        scheduler: resolve_scheduler_config(cli, &file.scheduler)?,
        push: PushConfig {
            vapid_private_key: cli.vapid_private_key.clone().or(file.push.vapid_private_key),
            vapid_public_key: cli.vapid_public_key.clone().or(file.push.vapid_public_key),
            vapid_subject: cli.vapid_subject.clone().or(file.push.vapid_subject),
            ttl_seconds: file.push.ttl_seconds.unwrap_or(DEFAULT_PUSH_TTL_SECONDS),
            icon: file
                .push
                .icon
                .unwrap_or_else(|| DEFAULT_PUSH_ICON.to_string()),
        },
        sms: resolve_sms_config(cli, file.sms),
    })
}

fn resolve_scheduler_config(
    cli: &Cli,
    file: &agenda::config::FileSchedulerConfig,
) -> Result<SchedulerConfig, String> {
    let tick_seconds = cli
        .tick_seconds
        .or(file.tick_seconds)
        .unwrap_or(DEFAULT_TICK_SECONDS);
    if tick_seconds == 0 {
        return Err("scheduler tick must be greater than 0 seconds".to_string());
    }
    let daily_summary_at = cli
        .daily_summary_at
        .as_deref()
        .or(file.daily_summary_at.as_deref())
        .unwrap_or(DEFAULT_DAILY_SUMMARY_AT);

    Ok(SchedulerConfig {
        enabled: !cli.no_scheduler && file.enabled.unwrap_or(true),
        tick: std::time::Duration::from_secs(tick_seconds),
        daily_summary_at: parse_clock_time(daily_summary_at)?,
    })
}

fn resolve_sms_config(cli: &Cli, file: agenda::config::FileSmsConfig) -> Option<SmsConfig> {
    let non_empty = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let api_key = non_empty(cli.sms_api_key.clone().or(file.api_key));
    let api_secret = non_empty(cli.sms_api_secret.clone().or(file.api_secret));
    match (api_key, api_secret) {
        (Some(api_key), Some(api_secret)) => Some(SmsConfig {
            api_key,
            api_secret,
            from: non_empty(cli.sms_from.clone().or(file.from))
                .unwrap_or_else(|| DEFAULT_SMS_FROM.to_string()),
            country_code: non_empty(file.country_code)
                .unwrap_or_else(|| DEFAULT_SMS_COUNTRY_CODE.to_string()),
            endpoint: non_empty(file.endpoint).unwrap_or_else(|| DEFAULT_SMS_ENDPOINT.to_string()),
        }),
        (None, None) => None,
        _ => {
            tracing::warn!("sms disabled: both api key and api secret are required");
            None
        }
    }
}

fn parse_utc_offset(raw: &str) -> Result<UtcOffset, String> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| format!("invalid utc offset '{value}'; expected +HH:MM or -HH:MM"))
}

fn parse_clock_time(raw: &str) -> Result<Time, String> {
    let value = raw.trim();
    Time::parse(value, format_description!("[hour]:[minute]"))
        .map_err(|_| format!("invalid time of day '{value}'; expected HH:MM"))
}
