mod logging;
mod token;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use makerbook_client::models::{
    Interaction, LoginRequest, Post, PostType, RegisterRequest, ReportCategory, ReportRequest,
    SharePlatform, SuggestionRequest, VendorReportRequest,
};
use makerbook_client::{
    split_content, ClientConfig, ClientError, Level, Makerbook, Notification, Notifier,
    QuickCreate, SplitContent, TracingNotifier,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use token::TokenFile;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API base URL (defaults to MAKERBOOK_API_URL)
    #[arg(short, long)]
    server: Option<String>,

    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Send notifications to the log instead of the terminal
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    Logout,

    Status,

    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        limit: u32,

        #[arg(long = "type")]
        post_type: Option<PostType>,
    },

    Get {
        id: String,
    },

    /// Create a post from one block of text; ingredients/materials and steps are split out automatically
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long = "type", default_value = "recipe")]
        post_type: PostType,

        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        publish: bool,
    },

    /// Preview how free text would be split, without contacting the server
    Organize {
        #[arg(long = "type", default_value = "recipe")]
        post_type: PostType,

        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Change an existing post's title, description or steps
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Step number to drop; the remaining steps are renumbered
        #[arg(long)]
        remove_step: Option<usize>,
    },

    Publish {
        id: String,
    },

    Delete {
        id: String,
    },

    Like {
        id: String,
    },

    Bookmark {
        id: String,
    },

    Bookmarks,

    Comments {
        id: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    Comment {
        id: String,

        text: String,

        #[arg(long)]
        reply_to: Option<String>,
    },

    EditComment {
        #[arg(long)]
        post: String,

        id: String,

        text: String,
    },

    DeleteComment {
        #[arg(long)]
        post: String,

        id: String,
    },

    LikeComment {
        #[arg(long)]
        post: String,

        id: String,
    },

    Share {
        id: String,

        #[arg(long, default_value = "copy_link")]
        platform: SharePlatform,
    },

    View {
        id: String,
    },

    Engagement {
        id: String,
    },

    Report {
        #[arg(long)]
        user: String,

        #[arg(long)]
        category: ReportCategory,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        post: Option<String>,
    },

    ReportVendor {
        #[arg(long)]
        vendor: String,

        #[arg(long)]
        category: ReportCategory,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        post: Option<String>,
    },

    Suggest {
        prompt: String,

        #[arg(long = "type", default_value = "recipe")]
        post_type: PostType,
    },

    RecipeDetail {
        title: String,
    },

    Upload {
        path: PathBuf,
    },
}

/// Prints notifications the way the web UI shows toasts.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => eprintln!("{} {}", "❌".red(), notification.message.red()),
            Level::Success => println!("✅ {}", notification.message.green()),
            Level::Info => println!("ℹ️  {}", notification.message),
        }
    }
}

/// Routes a failed API call through the notifier before propagating it.
trait Surface<T> {
    fn surfaced(self, app: &Makerbook) -> Result<T, ClientError>;
}

impl<T> Surface<T> for Result<T, ClientError> {
    fn surfaced(self, app: &Makerbook) -> Result<T, ClientError> {
        self.map_err(|e| app.report_error(e))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    if let Commands::Organize {
        post_type,
        file,
        text,
    } = &cli.command
    {
        let input = read_input(file.as_ref(), text.as_deref())?;
        print_split(&split_content(&input, *post_type));
        return Ok(());
    }

    let mut config = ClientConfig::from_env().context("Failed to read configuration")?;
    if let Some(server) = cli.server {
        config.base_url = server;
    }
    tracing::debug!(base_url = %config.base_url, "Using API");

    let notifier: Arc<dyn Notifier> = if cli.quiet {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let app = Makerbook::new(config, notifier);

    let token_file = TokenFile::locate(cli.token_file)?;
    if let Some(token) = token_file.read()? {
        app.http().set_token(token).await;
    }

    if let Err(e) = run(&app, &token_file, cli.command).await {
        // Client errors were already shown through the notifier.
        if e.downcast_ref::<ClientError>().is_none() {
            eprintln!("{} {:#}", "❌".red(), e);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(app: &Makerbook, token_file: &TokenFile, command: Commands) -> Result<()> {
    let store = app.interactions();

    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let auth = app
                .http()
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await
                .surfaced(app)?;
            token_file.store(&auth.token)?;
            app.notify(Notification::success(format!(
                "Welcome, {}! You are logged in.",
                auth.user.username
            )));
        }

        Commands::Login { email, password } => {
            let auth = app
                .http()
                .login(&LoginRequest { email, password })
                .await
                .surfaced(app)?;
            token_file.store(&auth.token)?;
            app.notify(Notification::success(format!(
                "Logged in as {}",
                auth.user.username
            )));
        }

        Commands::Logout => {
            if !app.http().is_authenticated().await {
                app.notify(Notification::info("You were not logged in"));
                return Ok(());
            }
            token_file.remove()?;
            app.http().clear_token().await;
            app.notify(Notification::success("Logged out"));
        }

        Commands::Status => match token_file.read()? {
            Some(token) => {
                let preview: String = token.chars().take(12).collect();
                println!("🔑 Token file: {:?}", token_file.path());
                println!("   Token: {}...", preview);
                match app.http().me().await {
                    Ok(user) => println!("   Logged in as: {} <{}>", user.username, user.email),
                    Err(e) => println!("   Token could not be verified: {}", e),
                }
            }
            None => {
                println!("❌ No token found");
                println!("   Please login first: makerbook login --email <email> --password <password>");
            }
        },

        Commands::List {
            page,
            limit,
            post_type,
        } => {
            let listing = app
                .http()
                .list_posts(page, limit, post_type)
                .await
                .surfaced(app)?;
            store.seed(&listing.posts);

            println!(
                "📋 Page {}/{} ({} posts total)",
                listing.page,
                listing.total_pages.max(1),
                listing.total
            );
            if listing.posts.is_empty() {
                println!("   No posts found");
            }
            for post in &listing.posts {
                let record = store.displayed(&post.id);
                println!(
                    "   [{}] {} ({}) ❤ {}  🔖 {}  💬 {}",
                    post.id,
                    post.title.bold(),
                    post.post_type,
                    record.like_count,
                    record.bookmark_count,
                    record.comment_count
                );
            }
        }

        Commands::Get { id } => {
            let post = app.http().get_post(&id).await.surfaced(app)?;
            store.seed(std::slice::from_ref(&post));
            if let Some(view) = store.increment_views(&id) {
                view.await.ok();
            }
            print_post(&post, &store.displayed(&id));
        }

        Commands::Create {
            title,
            description,
            post_type,
            file,
            text,
            publish,
        } => {
            let input = read_input(file.as_ref(), text.as_deref())?;
            let quick = QuickCreate {
                title,
                description,
                post_type,
                text: input,
                publish,
            };
            print_split(&quick.organize());
            println!("   Auto-organized from your text. Please review before publishing.\n");

            let draft = quick.into_draft().surfaced(app)?;
            let post = app.http().create_post(&draft).await.surfaced(app)?;
            app.notify(Notification::success(format!(
                "Post created: {} ({:?})",
                post.id, post.status
            )));
        }

        Commands::Organize { .. } => unreachable!("handled before the client is built"),

        Commands::Edit {
            id,
            title,
            description,
            remove_step,
        } => {
            let post = app.http().get_post(&id).await.surfaced(app)?;
            let mut draft = post.to_draft();
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(number) = remove_step {
                if number == 0 || draft.remove_step(number - 1).is_none() {
                    bail!("Post {} has no step {}", id, number);
                }
            }

            let updated = app.http().update_post(&id, &draft).await.surfaced(app)?;
            app.notify(Notification::success(format!(
                "Updated \"{}\" ({} steps)",
                updated.title,
                updated.steps.len()
            )));
        }

        Commands::Publish { id } => {
            let post = app.http().publish_post(&id).await.surfaced(app)?;
            app.notify(Notification::success(format!("Published \"{}\"", post.title)));
        }

        Commands::Delete { id } => {
            app.http().delete_post(&id).await.surfaced(app)?;
            app.notify(Notification::success(format!("Post {} deleted", id)));
        }

        Commands::Like { id } => {
            let record = store.toggle_like(&id).await?;
            let verb = if record.is_liked { "Liked" } else { "Unliked" };
            app.notify(Notification::success(format!(
                "{} ({} likes)",
                verb, record.like_count
            )));
        }

        Commands::Bookmark { id } => {
            let record = store.toggle_bookmark(&id).await?;
            let verb = if record.is_bookmarked {
                "Bookmarked"
            } else {
                "Bookmark removed"
            };
            app.notify(Notification::success(format!(
                "{} ({} bookmarks)",
                verb, record.bookmark_count
            )));
        }

        Commands::Bookmarks => {
            let posts = store.load_bookmarks().await?;
            println!("🔖 {} bookmarked posts", posts.len());
            for post in &posts {
                println!("   [{}] {} ({})", post.id, post.title.bold(), post.post_type);
            }
        }

        Commands::Comments { id, page } => {
            store.load_comments(&id, page).await?;
            for comment in store.comments(&id) {
                let indent = if comment.parent_comment.is_some() { "      ↳ " } else { "   " };
                let edited = if comment.is_edited { " (edited)" } else { "" };
                println!(
                    "{}[{}] {}: {}{}  ❤ {}",
                    indent,
                    comment.id,
                    comment.author.username.bold(),
                    comment.text,
                    edited,
                    comment.like_count
                );
            }
            if store.has_more_comments(&id) {
                println!("   More comments: makerbook comments {} --page {}", id, page + 1);
            }
        }

        Commands::Comment { id, text, reply_to } => {
            let comment = store.add_comment(&id, &text, reply_to.as_deref()).await?;
            app.notify(Notification::success(format!("Comment {} posted", comment.id)));
        }

        Commands::EditComment { post, id, text } => {
            store.edit_comment(&post, &id, &text).await?;
            app.notify(Notification::success("Comment updated"));
        }

        Commands::DeleteComment { post, id } => {
            store.delete_comment(&post, &id).await?;
            app.notify(Notification::success("Comment deleted"));
        }

        Commands::LikeComment { post, id } => {
            let response = store.toggle_comment_like(&post, &id).await?;
            app.notify(Notification::success(format!(
                "Comment now has {} likes",
                response.like_count
            )));
        }

        Commands::Share { id, platform } => {
            let record = store.share_post(&id, platform).await?;
            app.notify(Notification::success(format!(
                "Shared ({} shares)",
                record.share_count
            )));
        }

        Commands::View { id } => {
            if let Some(view) = store.increment_views(&id) {
                view.await.context("View request task failed")?;
            }
            if let Some(record) = store.interaction(&id) {
                println!("👀 {} views", record.views);
            }
        }

        Commands::Engagement { id } => {
            let record = store.load_engagement(&id).await?;
            print_engagement(&record);
        }

        Commands::Report {
            user,
            category,
            reason,
            post,
        } => {
            let receipt = app
                .http()
                .report(&ReportRequest {
                    category,
                    reason,
                    reported_user: user,
                    post,
                })
                .await
                .surfaced(app)?;
            app.notify(Notification::success(format!(
                "Report {} submitted. Thank you.",
                receipt.id
            )));
        }

        Commands::ReportVendor {
            vendor,
            category,
            reason,
            post,
        } => {
            let receipt = app
                .http()
                .report_vendor(&VendorReportRequest {
                    category,
                    reason,
                    vendor,
                    post,
                })
                .await
                .surfaced(app)?;
            app.notify(Notification::success(format!(
                "Vendor report {} submitted. Thank you.",
                receipt.id
            )));
        }

        Commands::Suggest { prompt, post_type } => {
            let response = app
                .http()
                .suggestions(&SuggestionRequest { prompt, post_type })
                .await
                .surfaced(app)?;
            println!("💡 Suggestions:");
            for (i, suggestion) in response.suggestions.iter().enumerate() {
                println!("   {}. {}", i + 1, suggestion);
            }
        }

        Commands::RecipeDetail { title } => {
            let detail = app.http().recipe_detail(&title).await.surfaced(app)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }

        Commands::Upload { path } => {
            let media = app.http().upload_media(&path).await.surfaced(app)?;
            app.notify(Notification::success(format!(
                "Uploaded {}: {}",
                media.kind.as_str(),
                media.url
            )));
        }
    }

    Ok(())
}

fn read_input(file: Option<&PathBuf>, text: Option<&str>) -> Result<String> {
    match (file, text) {
        (Some(path), _) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        (None, Some(text)) => Ok(text.to_string()),
        (None, None) => bail!("Provide the post text with --file or --text"),
    }
}

fn print_split(content: &SplitContent) {
    println!("🧾 {} ({}):", content.item_label(), content.items.len());
    for item in &content.items {
        println!("   • {}", item);
    }
    println!("👣 Steps ({}):", content.steps.len());
    for (i, step) in content.steps.iter().enumerate() {
        println!("   {}. {}", i + 1, step);
    }
}

fn print_post(post: &Post, record: &Interaction) {
    println!("{} ({}, {:?})", post.title.bold(), post.post_type, post.status);
    if let Some(author) = &post.author {
        println!("   by {}", author.username);
    }
    if let Some(created) = post.created_at {
        println!("   Created: {}", created.format("%Y-%m-%d %H:%M"));
    }
    if !post.description.is_empty() {
        println!("\n   {}", post.description);
    }

    let label = match post.post_type {
        PostType::Recipe => "Ingredients",
        PostType::Diy => "Materials",
    };
    println!("\n🧾 {}:", label);
    for material in &post.materials {
        let amount = [material.quantity.as_deref(), material.unit.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if amount.is_empty() {
            println!("   • {}", material.name);
        } else {
            println!("   • {} ({})", material.name, amount);
        }
    }

    println!("\n👣 Steps:");
    for step in &post.steps {
        println!("   {}. {}", step.step_number, step.instruction);
        if let Some(minutes) = step.estimated_time {
            println!("      ⏱ {} min", minutes);
        }
    }
    println!();
    print_engagement(record);
}

fn print_engagement(record: &Interaction) {
    println!(
        "   ❤ {}{}  🔖 {}{}  💬 {}  ↗ {}  👀 {}",
        record.like_count,
        if record.is_liked { " (you)" } else { "" },
        record.bookmark_count,
        if record.is_bookmarked { " (you)" } else { "" },
        record.comment_count,
        record.share_count,
        record.views
    );
}
