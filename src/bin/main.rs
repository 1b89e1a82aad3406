use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use mdd::core::helpers::format_timestamp;
use mdd::listing::{filter_by_text, sort_by_date, SortOrder};
use mdd::models::models::{NewComment, NewPost, Post, PostUpdate, SignupRequest, ThemeRef, UserUpdate};
use mdd::{forms, password, ApiError, ClientConfig, Mdd};

const LOGIN_REFRESH_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "mdd", about = "Command-line client for the MDD developer community")]
struct Cli {
    /// API root, e.g. http://localhost:8080/api (defaults to MDD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session is kept between runs (defaults to MDD_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with a username or email
    Login {
        identifier: String,
        #[arg(long, env = "MDD_PASSWORD")]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "MDD_PASSWORD")]
        password: String,
    },
    Logout,
    /// Show the logged-in user, refreshed from the server
    Whoami,
    /// Edit the logged-in user's profile
    Profile {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// New password; leave out to keep the current one
        #[arg(long)]
        password: Option<String>,
    },
    /// List every theme, marking the ones you follow
    Themes {
        #[arg(long)]
        filter: Option<String>,
    },
    /// List the themes you follow
    Subscriptions,
    Subscribe { theme_id: i64 },
    Unsubscribe { theme_id: i64 },
    /// Follow a theme if you don't, unfollow it if you do
    Toggle { theme_id: i64 },
    /// List posts
    Posts {
        #[arg(long, conflicts_with_all = ["user", "feed"])]
        theme: Option<i64>,
        #[arg(long, conflicts_with = "feed")]
        user: Option<i64>,
        /// Only posts from followed themes
        #[arg(long)]
        feed: bool,
        #[arg(long, default_value = "desc")]
        sort: SortOrder,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a post with its comments
    Post { post_id: i64 },
    NewPost {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        theme: String,
    },
    EditPost {
        post_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    DeletePost { post_id: i64 },
    /// Comment on a post
    Comment { post_id: i64, content: String },
    EditComment { comment_id: i64, content: String },
    DeleteComment { comment_id: i64 },
    /// Report which password rules a candidate fails
    CheckPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    info!(api = %config.base_url, session = %config.session_file.display(), "mdd starting");

    let app = Mdd::with_session_file(config).context("failed to open session")?;
    if let Err(e) = run(&app, cli.command).await {
        error!(error = %e, "command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &Mdd, command: Command) -> Result<(), ApiError> {
    match command {
        Command::Login { identifier, password } => {
            app.session.login(&identifier, &password).await?;
            // Let the background profile load land in the session file
            // before the process exits.
            match app.session.wait_for_profile(LOGIN_REFRESH_WAIT).await? {
                Some(user) => println!("Logged in as {}", user.username),
                None => println!("Logged in (profile not loaded yet)"),
            }
        }
        Command::Register { username, email, password } => {
            let message = app
                .session
                .register(&SignupRequest { username, email, password })
                .await?;
            if message.trim().is_empty() {
                println!("Account created, you can now log in");
            } else {
                println!("{}", message.trim());
            }
        }
        Command::Logout => {
            app.session.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            require_login(app)?;
            let user = app.session.load_current_user().await?;
            println!("{} <{}> (id {})", user.username, user.email, user.id);
            if let Some(bio) = user.bio.as_deref().filter(|b| !b.is_empty()) {
                println!("{}", bio);
            }
            println!("member since {}", format_timestamp(user.created_at));
        }
        Command::Profile { username, email, password } => {
            require_login(app)?;
            if app.session.current_user_value().is_none() {
                app.session.load_current_user().await?;
            }
            let updated = app
                .session
                .update_profile(&UserUpdate::new(username, email, password))
                .await?;
            if app.session.is_logged_in() {
                println!("Profile updated for {}", updated.username);
            } else {
                println!("Profile updated. Your email changed, please log in again.");
            }
        }
        Command::Themes { filter } => {
            let themes = app.api.get_all_themes().await?;
            if app.session.is_logged_in() {
                app.subscriptions.load_user_subscriptions().await?;
            }
            let themes = filter_by_text(themes, filter.as_deref().unwrap_or_default());
            for theme in themes {
                let mark = if app.subscriptions.is_user_subscribed(theme.id) { "x" } else { " " };
                println!(
                    "[{}] {:>4}  {}  {}",
                    mark,
                    theme.id,
                    theme.name,
                    theme.description.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Subscriptions => {
            require_login(app)?;
            for theme in app.subscriptions.load_user_subscriptions().await? {
                println!("{:>4}  {}", theme.id, theme.name);
            }
        }
        Command::Subscribe { theme_id } => {
            require_login(app)?;
            app.subscriptions.subscribe_to_theme(theme_id).await?;
            println!("Subscribed to theme {}", theme_id);
        }
        Command::Unsubscribe { theme_id } => {
            require_login(app)?;
            app.subscriptions.unsubscribe_from_theme(theme_id).await?;
            println!("Unsubscribed from theme {}", theme_id);
        }
        Command::Toggle { theme_id } => {
            require_login(app)?;
            app.subscriptions.load_user_subscriptions().await?;
            let following = app.subscriptions.toggle_subscription(theme_id).await?;
            println!(
                "{} theme {}",
                if following { "Following" } else { "No longer following" },
                theme_id
            );
        }
        Command::Posts { theme, user, feed, sort, filter } => {
            let posts = match (theme, user, feed) {
                (Some(theme_id), _, _) => app.api.get_posts_by_theme(theme_id).await?,
                (_, Some(user_id), _) => app.api.get_posts_by_user(user_id).await?,
                (_, _, true) => {
                    require_login(app)?;
                    let mut posts = Vec::new();
                    for theme in app.subscriptions.load_user_subscriptions().await? {
                        posts.extend(app.api.get_posts_by_theme(theme.id).await?);
                    }
                    posts
                }
                _ => app.api.get_all_posts().await?,
            };
            let posts = filter_by_text(posts, filter.as_deref().unwrap_or_default());
            for post in sort_by_date(posts, sort) {
                print_post_line(&post);
            }
        }
        Command::Post { post_id } => {
            let post = app.api.get_post(post_id).await?;
            println!("{}", post.title);
            println!(
                "by {} on {}{}",
                post.author.as_ref().map(|a| a.username.as_str()).unwrap_or("unknown"),
                format_timestamp(post.created_at),
                post.theme
                    .as_ref()
                    .map(|t| format!(" in {}", t.name))
                    .unwrap_or_default()
            );
            println!();
            println!("{}", post.content);
            let comments = app.api.get_comments_by_post(post_id).await?;
            if !comments.is_empty() {
                println!();
                println!("{} comment(s)", comments.len());
                for comment in sort_by_date(comments, SortOrder::Ascending) {
                    println!(
                        "  [{}] {} ({}): {}",
                        comment.id.map(|id| id.to_string()).unwrap_or_default(),
                        comment.author.as_ref().map(|a| a.username.as_str()).unwrap_or("unknown"),
                        format_timestamp(comment.created_at),
                        comment.content
                    );
                }
            }
        }
        Command::NewPost { title, content, theme } => {
            require_login(app)?;
            let post = NewPost {
                title,
                content,
                theme: ThemeRef { name: theme },
            };
            forms::validate_new_post(&post)?;
            let created = app.api.create_post(&post).await?;
            println!("Created post {}", created.id.map(|id| id.to_string()).unwrap_or_default());
        }
        Command::EditPost { post_id, title, content } => {
            require_login(app)?;
            let update = PostUpdate { title, content };
            forms::validate_post_update(&update)?;
            let updated = app.api.update_post(post_id, &update).await?;
            print_post_line(&updated);
        }
        Command::DeletePost { post_id } => {
            require_login(app)?;
            app.api.delete_post(post_id).await?;
            println!("Deleted post {}", post_id);
        }
        Command::Comment { post_id, content } => {
            require_login(app)?;
            let comment = NewComment { content };
            forms::validate_comment(&comment)?;
            app.api.create_comment(post_id, &comment).await?;
            println!("Comment added to post {}", post_id);
        }
        Command::EditComment { comment_id, content } => {
            require_login(app)?;
            let comment = NewComment { content };
            forms::validate_comment(&comment)?;
            app.api.update_comment(comment_id, &comment).await?;
            println!("Updated comment {}", comment_id);
        }
        Command::DeleteComment { comment_id } => {
            require_login(app)?;
            app.api.delete_comment(comment_id).await?;
            println!("Deleted comment {}", comment_id);
        }
        Command::CheckPassword { password } => {
            let report = password::evaluate(&password);
            if report.satisfied {
                println!("Password meets every requirement");
            } else {
                for requirement in &report.unmet {
                    println!("missing: {}", requirement);
                }
            }
        }
    }
    Ok(())
}

fn require_login(app: &Mdd) -> Result<(), ApiError> {
    if app.session.is_logged_in() {
        Ok(())
    } else {
        Err(ApiError::validation("You need to log in first (mdd login <identifier>)"))
    }
}

fn print_post_line(post: &Post) {
    println!(
        "{:>5}  {}  {:<16}  {}",
        post.id.map(|id| id.to_string()).unwrap_or_default(),
        format_timestamp(post.created_at),
        post.author.as_ref().map(|a| a.username.as_str()).unwrap_or("-"),
        post.title
    );
}
