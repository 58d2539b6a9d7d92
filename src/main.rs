#![warn(clippy::pedantic)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

use crate::{
    api::{LoginReq, RegisterReq},
    backend::{Backend, HttpBackend},
    feed::Feed,
    locale::Locale,
    page::{FilePage, Input},
    render::RenderOptions,
    storage::{LocalStorage, TOKEN_KEY},
    token::Claims,
};

mod api;
mod backend;
mod error;
mod feed;
mod locale;
mod page;
mod render;
mod storage;
mod token;

#[derive(Parser)]
struct Args {
    /// The URL of the server. The API is expected under `/api`.
    #[arg(long, short, global = true, default_value = "http://localhost:8080")]
    server: String,

    /// The local storage file holding the login token
    #[arg(long, global = true, default_value = "local-storage.txt")]
    storage: PathBuf,

    /// The language for messages and dates. Detected from the environment
    /// when omitted.
    #[arg(long, global = true, value_enum)]
    locale: Option<Locale>,

    /// A strftime-style format for post dates, overriding the locale's
    #[arg(long, global = true)]
    time_format: Option<String>,

    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all posts and render them into the output page
    Load {
        /// The HTML page to (re)write
        #[arg(long, short, default_value = "posts.html")]
        output: PathBuf,
    },

    /// Publish a new post, then refresh the output page
    Post {
        /// The HTML page to refresh after posting
        #[arg(long, short, default_value = "posts.html")]
        output: PathBuf,

        /// A draft file holding the post text. It is emptied once the post
        /// has been accepted.
        #[arg(long, short, default_value = "postContent.txt")]
        draft: PathBuf,

        /// The post text, instead of reading the draft file
        #[arg(long, short, conflicts_with = "draft")]
        message: Option<String>,
    },

    /// Like or unlike a post, then refresh the output page
    Like {
        /// The post's ID
        id: i64,

        /// The HTML page to refresh after liking
        #[arg(long, short, default_value = "posts.html")]
        output: PathBuf,
    },

    /// Log in and keep the token in local storage
    Login {
        /// The username on the server
        #[arg(long, short)]
        username: String,

        /// The password on the server. It is discouraged to provide the
        /// password through the command line - by omitting it, it will be
        /// requested on execution.
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Create an account, then keep its token in local storage
    Register {
        /// The username to create
        #[arg(long, short)]
        username: String,

        /// The password for the new account. It is discouraged to provide
        /// the password through the command line - by omitting it, it will
        /// be requested on execution.
        #[arg(long, short)]
        password: Option<String>,

        /// The name shown to other users
        #[arg(long)]
        display_name: Option<String>,
    },

    /// Show who the stored token belongs to
    Whoami,
}

impl Command {
    /// Loading posts is anonymous, so it never reads the token.
    fn reads_storage(&self) -> bool {
        !matches!(self, Self::Load { .. })
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbose)
        .init();

    let locale = args.locale.unwrap_or_else(Locale::detect);
    tracing::debug!("Locale: {locale:?}");
    let mut options = RenderOptions::new(locale);
    if let Some(format) = args.time_format {
        options = options
            .with_time_format(format)
            .context("Invalid --time-format")?;
    }
    let storage = open_storage(&args.command, &args.storage)?;
    let backend = HttpBackend::new(&args.server);

    match args.command {
        Command::Load { output } => {
            let mut feed = Feed::new(backend, storage, FilePage::new(output, Input::None), options);
            feed.load_posts().context("Failed to load posts")?;
            tracing::info!("Posts written to {}", feed.page().output().display());
        }
        Command::Post {
            output,
            draft,
            message,
        } => {
            let input = message.map_or(Input::Draft(draft), Input::Inline);
            let mut feed = Feed::new(backend, storage, FilePage::new(output, input), options);
            feed.create_post().context("Failed to publish post")?;
            tracing::info!("Post published");
        }
        Command::Like { id, output } => {
            let mut feed = Feed::new(backend, storage, FilePage::new(output, Input::None), options);
            let res = feed.like_post(id).context("Failed to like post")?;
            tracing::info!("{} (liked: {})", res.message, res.liked);
        }
        Command::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let res = backend
                .login(&LoginReq { username, password })
                .context("Failed to authenticate")?;
            tracing::info!("Logged in as {} ({})", res.user.username, res.user.role);
            store_token(storage, &args.storage, res.token)?;
        }
        Command::Register {
            username,
            password,
            display_name,
        } => {
            let password = password_or_prompt(password)?;
            let res = backend
                .register(&RegisterReq {
                    username,
                    password,
                    display_name,
                })
                .context("Failed to register")?;
            tracing::info!("Registered as {} ({})", res.user.username, res.user.role);
            store_token(storage, &args.storage, res.token)?;
        }
        Command::Whoami => whoami(&storage)?,
    }

    Ok(())
}

fn open_storage(command: &Command, path: &Path) -> anyhow::Result<LocalStorage> {
    if command.reads_storage() {
        LocalStorage::load(path).context("Failed to read local storage")
    } else {
        Ok(LocalStorage::default())
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if password.is_some() {
        tracing::warn!(
            "The password has been provided on the command line. Note that this is less secure then providing it when requested."
        );
    }
    password
        .or_else(|| {
            tracing::debug!("Prompting for password...");
            rpassword::prompt_password("Enter Password: ").ok()
        })
        .context("Failed to get password")
}

fn store_token(mut storage: LocalStorage, path: &Path, token: String) -> anyhow::Result<()> {
    storage.set(TOKEN_KEY, token);
    storage.save(path).context("Failed to store the token")?;
    tracing::debug!("Token stored in {}", path.display());
    Ok(())
}

fn whoami(storage: &LocalStorage) -> anyhow::Result<()> {
    let Some(credential) = storage.credential() else {
        tracing::warn!("Not logged in");
        return Ok(());
    };
    let claims = Claims::decode(&credential).context("Failed to read the stored token")?;

    match claims.expires_at() {
        Some(at) if claims.is_expired(chrono::Utc::now()) => tracing::warn!(
            "Token for {} ({}) expired at {at}, log in again",
            claims.username,
            claims.role
        ),
        Some(at) => tracing::info!(
            "Logged in as {} ({}) until {at}",
            claims.username,
            claims.role
        ),
        None => tracing::info!("Logged in as {} ({})", claims.username, claims.role),
    }
    Ok(())
}
