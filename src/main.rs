mod cli;

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{debug, info};

use flatswap::{
    auth::{AuthProvider, AuthWatcher, HttpAuthProvider},
    clock::SystemClock,
    config::{self, Config},
    contract::{swap_duration, ContractFormData, ContractGenerator, FsExporter, PricingBreakdown},
    cycles::{BoardSnapshot, SwapBoard},
    matches::{filter_matches, filter_options, MatchFilter, MatchRecord},
    profile::{DisplayProfile, Profile},
    state::{self, State},
    validation::{
        validate_profile_form, validate_sign_up_form, ProfileForm, SignUpForm, ValidationErrors,
    },
};

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(bin_name = env!("CARGO_BIN_NAME"))]
enum Cli {
    #[command(about = "Prints tool version")]
    #[command(long_about = None)]
    Version,

    #[command(about = "Creates a new account")]
    #[command(long_about = None)]
    SignUp(ConfigArgs),

    #[command(about = "Signs in with email and password")]
    #[command(long_about = None)]
    SignIn(SignInArgs),

    #[command(about = "Signs in through an external provider")]
    #[command(long_about = None)]
    SignInOauth(OAuthArgs),

    #[command(about = "Signs out and forgets the session")]
    #[command(long_about = None)]
    SignOut(ConfigArgs),

    #[command(about = "Sends a password reset email")]
    #[command(long_about = None)]
    ResetPassword(SignInArgs),

    #[command(about = "Shows the saved session")]
    #[command(long_about = None)]
    Session(ConfigArgs),

    #[command(about = "Generates a flat swap agreement")]
    #[command(long_about = None)]
    Contract(ContractArgs),

    #[command(about = "Lists matches with filter tabs")]
    #[command(long_about = None)]
    Matches(MatchesArgs),

    #[command(about = "Finds swap cycles between users")]
    #[command(long_about = None)]
    Cycles(FileArgs),

    #[command(about = "Shows a profile the way users see it")]
    #[command(long_about = None)]
    Profile(ProfileArgs),

    #[command(about = "Validates a form")]
    #[command(long_about = None)]
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct ConfigArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,
}

#[derive(clap::Args)]
struct SignInArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    #[arg(short, long)]
    email: Option<String>,
}

#[derive(clap::Args)]
struct OAuthArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    /// URL the provider redirected to after sign in.
    #[arg(long)]
    callback: Option<String>,
}

#[derive(clap::Args)]
struct ContractArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    /// JSON file with the contract form.
    #[arg(long)]
    from: Option<PathBuf>,

    /// Directory to save the contract to.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print the contract instead of saving it.
    #[arg(long)]
    print: bool,
}

#[derive(clap::Args)]
struct MatchesArgs {
    #[arg()]
    file: PathBuf,

    /// One of all, new, pending, accepted, rejected.
    #[arg(short, long, default_value = "all")]
    filter: MatchFilter,
}

#[derive(clap::Args)]
struct FileArgs {
    #[arg()]
    file: PathBuf,
}

#[derive(clap::Args)]
struct ProfileArgs {
    #[arg()]
    file: PathBuf,

    /// Email of the signed in user.
    #[arg(short, long)]
    email: Option<String>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    #[arg(value_enum)]
    form: FormKind,

    #[arg()]
    file: PathBuf,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormKind {
    SignUp,
    Profile,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse() {
        Cli::Version => {
            println!(env!("CARGO_PKG_VERSION"));
        }
        Cli::SignUp(args) => sign_up(args)?,
        Cli::SignIn(args) => sign_in(args)?,
        Cli::SignInOauth(args) => sign_in_oauth(args)?,
        Cli::SignOut(args) => sign_out(args)?,
        Cli::ResetPassword(args) => reset_password(args)?,
        Cli::Session(args) => show_session(args)?,
        Cli::Contract(args) => contract(args)?,
        Cli::Matches(args) => matches(args)?,
        Cli::Cycles(args) => cycles(args)?,
        Cli::Profile(args) => profile(args)?,
        Cli::Validate(args) => validate(args)?,
    };

    Ok(())
}

/// Конфиг, сохранённое состояние и провайдер с восстановленной сессией.
fn auth_context(config_path: PathBuf) -> anyhow::Result<(Config, State, HttpAuthProvider)> {
    debug!("Подгружаем конфиг из {:?}", config_path);
    let cfg = config::load(config_path)?;

    debug!("Подгружаем состояние из {:?}", cfg.session_path);
    let state = state::load(&cfg.session_path)?;

    let provider = HttpAuthProvider::new(&cfg.auth.url, &cfg.auth.api_key)?
        .with_session(state.session.clone());

    Ok((cfg, state, provider))
}

fn watch(provider: &HttpAuthProvider) -> AuthWatcher {
    AuthWatcher::start(provider, |route| println!("Continue at {}", route))
}

/// Сохраняет сессию, которую видит наблюдатель, и отписывает его.
fn persist(cfg: &Config, mut state: State, watcher: AuthWatcher) -> anyhow::Result<()> {
    state.session = watcher.stop().session().cloned();

    debug!("Сохраняем состояние в {:?}", cfg.session_path);
    state::save(&state, &cfg.session_path)?;

    Ok(())
}

fn print_errors(errors: &ValidationErrors) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(errors)?);
    Ok(())
}

fn sign_up(args: ConfigArgs) -> anyhow::Result<()> {
    let (cfg, state, provider) = auth_context(args.config_path)?;

    let form = cli::ask_sign_up()?;

    let errors = validate_sign_up_form(&form);
    if !errors.is_empty() {
        print_errors(&errors)?;
        return Err(anyhow!("sign up form is invalid"));
    }

    let watcher = watch(&provider);

    if provider.sign_up(&form.email, &form.password)?.is_none() {
        println!("We sent a verification code to {}", form.email);

        let code = cli::ask_verification_code()?;

        provider.verify_email(&form.email, &code)?;
    }

    info!("Signed up as {}", form.email);

    persist(&cfg, state, watcher)
}

fn sign_in(args: SignInArgs) -> anyhow::Result<()> {
    let (cfg, state, provider) = auth_context(args.config_path)?;

    let email = match args.email {
        Some(e) => e,
        None => cli::ask_email()?,
    };
    let password = cli::ask_password()?;

    let watcher = watch(&provider);

    provider.sign_in(&email, &password)?;

    info!("Signed in as {}", email);

    persist(&cfg, state, watcher)
}

fn sign_in_oauth(args: OAuthArgs) -> anyhow::Result<()> {
    let (cfg, state, provider) = auth_context(args.config_path)?;

    let url = provider.sign_in_with_oauth(cfg.auth.oauth_provider, &cfg.auth.oauth_redirect())?;

    let callback = match args.callback {
        Some(c) => c,
        None => {
            println!("Open this URL in a browser to sign in:\n{}", url);
            cli::ask_callback_url()?
        }
    };

    let watcher = watch(&provider);

    let session = provider.complete_oauth(&callback)?;

    info!(
        "Signed in with {} as {}",
        cfg.auth.oauth_provider,
        session.user.email.as_deref().unwrap_or(session.user.id.as_str())
    );

    persist(&cfg, state, watcher)
}

fn sign_out(args: ConfigArgs) -> anyhow::Result<()> {
    let (cfg, state, provider) = auth_context(args.config_path)?;

    let watcher = watch(&provider);

    let result = provider.sign_out();

    persist(&cfg, state, watcher)?;

    result?;

    info!("Signed out");

    Ok(())
}

fn reset_password(args: SignInArgs) -> anyhow::Result<()> {
    let (cfg, _, provider) = auth_context(args.config_path)?;

    let email = match args.email {
        Some(e) => e,
        None => cli::ask_email()?,
    };

    provider.reset_password_for_email(&email, &cfg.auth.reset_password_redirect())?;

    println!("Password reset instructions were sent to {}", email);

    Ok(())
}

fn show_session(args: ConfigArgs) -> anyhow::Result<()> {
    let cfg = config::load(args.config_path)?;
    let state = state::load(&cfg.session_path)?;

    let Some(session) = state.session else {
        println!("Not signed in");
        return Ok(());
    };

    let user = &session.user;

    println!("User: {}", user.id);
    println!("Email: {}", user.email.as_deref().unwrap_or("-"));
    println!(
        "Provider: {}",
        user.app_metadata.provider.as_deref().unwrap_or("email")
    );
    println!("Onboarding: {:?}", user.onboarding_status());

    match session.access_token.expire_at() {
        Some(at) if session.is_expired() => println!("Access token expired at {}", at),
        Some(at) => println!("Access token valid until {}", at),
        None => println!("Access token does not expire"),
    }

    Ok(())
}

fn contract(args: ContractArgs) -> anyhow::Result<()> {
    debug!("Подгружаем конфиг из {:?}", args.config_path);
    let cfg = config::load(args.config_path)?;

    let generator = match &cfg.contract_template {
        Some(path) => {
            debug!("Подгружаем шаблон договора из {:?}", path);
            let text = fs::read_to_string(path)
                .with_context(|| format!("read contract template {:?}", path))?;
            ContractGenerator::from_text(&text)?
        }
        None => ContractGenerator::standard(),
    };

    let mut form: ContractFormData = match &args.from {
        Some(path) => serde_json::from_str(
            &fs::read_to_string(path).with_context(|| format!("read contract form {:?}", path))?,
        )?,
        None => ContractFormData::default(),
    };

    if form.duration.is_empty() {
        if let Some(d) = swap_duration(&form.start_date, &form.end_date) {
            form.duration = d;
        }
    }

    if args.from.is_none() {
        cli::ask_contract(&generator.template().fields(), &mut form)?;
    }

    if form.platform_fee_percentage.is_none() {
        form.platform_fee_percentage = cfg.platform_fee_percentage;
    }

    if args.print {
        println!("{}", generator.generate(&form, &SystemClock));
    } else {
        let exporter = FsExporter::new(args.out_dir.unwrap_or(cfg.contracts_dir));

        let file = generator.download(&form, &SystemClock, &exporter)?;

        println!("Contract saved to {}", exporter.path_for(&file).display());
    }

    let pricing = PricingBreakdown::calculate(&form);

    info!(
        "Monthly total with {}% platform fee: Party A €{:.2}, Party B €{:.2}",
        pricing.fee_percentage, pricing.property1_total, pricing.property2_total
    );

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;

    let value = serde_json::from_str(&content).with_context(|| format!("parse {:?}", path))?;

    Ok(value)
}

fn matches(args: MatchesArgs) -> anyhow::Result<()> {
    let records: Vec<MatchRecord> = read_json(&args.file)?;

    let filter = args.filter;

    for option in filter_options(&records) {
        let marker = if option.filter == filter { "*" } else { " " };
        println!("{} {} ({})", marker, option.label, option.count);
    }

    println!();

    for m in filter_matches(&records, filter) {
        let names: Vec<&str> = m.participants.iter().map(|p| p.name.as_str()).collect();

        println!(
            "#{} {} {} {}% {}",
            m.id,
            m.status,
            m.kind,
            m.match_score,
            names.join(", ")
        );
    }

    Ok(())
}

fn cycles(args: FileArgs) -> anyhow::Result<()> {
    let snapshot: BoardSnapshot = read_json(&args.file)?;

    let cycles = SwapBoard::from(snapshot).find_cycles();

    if cycles.is_empty() {
        println!("No swap cycles found");
        return Ok(());
    }

    for c in cycles {
        println!("{}", c.join(" -> "));
    }

    Ok(())
}

fn profile(args: ProfileArgs) -> anyhow::Result<()> {
    let profile: Profile = read_json(&args.file)?;

    let display = DisplayProfile::from_profile(&profile, args.email.as_deref(), &SystemClock);

    println!("{}", serde_json::to_string_pretty(&display)?);

    Ok(())
}

fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let errors = match args.form {
        FormKind::SignUp => validate_sign_up_form(&read_json::<SignUpForm>(&args.file)?),
        FormKind::Profile => validate_profile_form(&read_json::<ProfileForm>(&args.file)?),
    };

    if errors.is_empty() {
        println!("Form is valid");
        return Ok(());
    }

    print_errors(&errors)?;

    Err(anyhow!("form has {} invalid fields", errors.len()))
}
