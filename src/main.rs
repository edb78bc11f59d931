mod models;
mod storage;
#[cfg(test)]
mod testing;

use models::*;
use storage::{PostRecorder, StorageManager};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let matches = Command::new("publishrs")
        .version("0.1.0")
        .about("Publishes one piece of content to Reddit, Discord and webhook targets")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .default_value("config.json")
                .global(true),
        )
        .subcommand(
            Command::new("publish")
                .about("Publish content to one or more targets")
                .arg(Arg::new("title").long("title").default_value(""))
                .arg(Arg::new("content").long("content").default_value(""))
                .arg(Arg::new("image").long("image").help("Image or link URL"))
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .help("Target id: reddit:<subreddit>, discord:<id> or webhook:<id>")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Validate and resolve targets without publishing")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a stored connection")
                .arg(Arg::new("target").short('t').long("target").required(true)),
        )
        .subcommand(
            Command::new("generate")
                .about("Render a content template")
                .arg(Arg::new("template").long("template").required(true))
                .arg(Arg::new("title").long("title").default_value(""))
                .arg(Arg::new("content").long("content").default_value(""))
                .arg(Arg::new("url").long("url").default_value(""))
                .arg(
                    Arg::new("save")
                        .long("save")
                        .help("Store the result as a draft post")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("wordpress")
                .about("Use posts from the connected WordPress site as content")
                .subcommand_required(true)
                .subcommand(Command::new("verify").about("Check the WordPress connection"))
                .subcommand(Command::new("list").about("List the latest WordPress posts"))
                .subcommand(
                    Command::new("publish")
                        .about("Publish a WordPress post to one or more targets")
                        .arg(
                            Arg::new("post")
                                .long("post")
                                .required(true)
                                .value_parser(clap::value_parser!(u64)),
                        )
                        .arg(
                            Arg::new("target")
                                .short('t')
                                .long("target")
                                .action(ArgAction::Append),
                        )
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("history").about("List recorded posts").arg(
                Arg::new("limit")
                    .long("limit")
                    .default_value("20")
                    .value_parser(clap::value_parser!(usize)),
            ),
        )
        .get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .cloned()
        .unwrap_or_else(|| "config.json".to_string());

    let config = StorageManager::load_config_from_file(&config_file)?;
    config.validate()?;

    let storage_manager = StorageManager::new(
        config.storage.data_dir.clone(),
        config.storage.posts_file.clone(),
    );
    storage_manager.init()?;

    match matches.subcommand() {
        Some(("publish", args)) => run_publish(&config, &storage_manager, args).await,
        Some(("verify", args)) => run_verify(&config, args).await,
        Some(("generate", args)) => run_generate(&config, &storage_manager, args),
        Some(("wordpress", args)) => run_wordpress(&config, &storage_manager, args).await,
        Some(("history", args)) => run_history(&storage_manager, args),
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn http_client(config: &AppConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .build()?)
}

fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    Ok(
        Dispatcher::new(Arc::new(config.connections.clone()), http_client(config)?)
            .with_reddit_endpoints(RedditEndpoints::from(&config.endpoints)),
    )
}

fn with_targets(mut request: PublishRequest, args: &ArgMatches) -> Result<PublishRequest> {
    for raw in args.get_many::<String>("target").into_iter().flatten() {
        request = request.with_target(raw.parse()?);
    }
    Ok(request)
}

fn string_arg(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

async fn run_publish(
    config: &AppConfig,
    storage_manager: &StorageManager,
    args: &ArgMatches,
) -> Result<()> {
    let mut request = PublishRequest::new(string_arg(args, "content"))
        .with_title(string_arg(args, "title"));
    if let Some(image) = args.get_one::<String>("image") {
        request = request.with_image_url(image.clone());
    }
    let request = with_targets(request, args)?;

    publish(config, storage_manager, &request, args.get_flag("dry-run")).await
}

async fn publish(
    config: &AppConfig,
    storage_manager: &StorageManager,
    request: &PublishRequest,
    dry_run: bool,
) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;

    if dry_run {
        request.validate()?;
        for target in &request.targets {
            match dispatcher.adapter_for(target) {
                Ok(adapter) => println!("[DRY RUN] Would publish to {}", adapter.label()),
                Err(e) => println!("[DRY RUN] {}: {}", target.default_label(), e),
            }
        }
        return Ok(());
    }

    let result = dispatcher.dispatch(request).await?;
    let aggregate = aggregate(&result);
    println!("{}", aggregate.summary);

    let post = Post::from_dispatch(request, &result);
    storage_manager.record(&post)?;
    println!("Post recorded as {}", aggregate.status);

    Ok(())
}

async fn run_verify(config: &AppConfig, args: &ArgMatches) -> Result<()> {
    let target: TargetId = string_arg(args, "target").parse()?;
    let dispatcher = build_dispatcher(config)?;

    match dispatcher.verify(&target).await {
        Ok(message) => {
            println!("✓ {}: {}", target, message);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("{}: {}", target, e)),
    }
}

fn run_generate(
    config: &AppConfig,
    storage_manager: &StorageManager,
    args: &ArgMatches,
) -> Result<()> {
    let name = string_arg(args, "template");
    let template = config
        .templates
        .get(&name)
        .ok_or_else(|| anyhow::anyhow!("Template '{}' not found in config", name))?;

    let context = TemplateContext {
        title: string_arg(args, "title"),
        content: string_arg(args, "content"),
        url: string_arg(args, "url"),
    };

    let generated = TemplateRenderer::new().render(template, &context)?;
    println!("{}", generated);

    if args.get_flag("save") {
        let post = Post::draft(generated, template.platform.clone(), Some(name));
        storage_manager.record(&post)?;
        println!("Saved as draft {}", post.id);
    }

    Ok(())
}

fn wordpress_source(config: &AppConfig) -> Result<WordPressSource> {
    let connection = config
        .connections
        .wordpress
        .clone()
        .filter(|c| c.connected)
        .ok_or_else(|| anyhow::anyhow!("WordPress is not connected"))?;
    Ok(WordPressSource::new(connection, http_client(config)?))
}

async fn run_wordpress(
    config: &AppConfig,
    storage_manager: &StorageManager,
    args: &ArgMatches,
) -> Result<()> {
    let source = wordpress_source(config)?;

    match args.subcommand() {
        Some(("verify", _)) => {
            let message = source.verify().await?;
            println!("✓ {}: {}", source.site_label(), message);
        }
        Some(("list", _)) => {
            for post in source.fetch_posts().await? {
                let image = if post.featured_image_url.is_some() {
                    " [image]"
                } else {
                    ""
                };
                println!("{:>6}  {}  {}{}", post.id, post.date, post.title, image);
            }
        }
        Some(("publish", publish_args)) => {
            let id = publish_args.get_one::<u64>("post").copied().unwrap_or_default();
            let post = source.fetch_post(id).await?;
            let request = with_targets(post.to_request(), publish_args)?;
            publish(config, storage_manager, &request, publish_args.get_flag("dry-run")).await?;
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    Ok(())
}

fn run_history(storage_manager: &StorageManager, args: &ArgMatches) -> Result<()> {
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(20);
    let history = storage_manager.load_posts()?;

    if history.posts.is_empty() {
        println!("No posts recorded yet");
        return Ok(());
    }

    for post in history.recent(limit) {
        let when = post
            .published_at
            .unwrap_or(post.created_at)
            .format("%Y-%m-%d %H:%M");
        let first_line = post.content.lines().next().unwrap_or_default();
        println!(
            "{}  {:<9} {:<8} {}",
            when,
            post.status.to_string(),
            post.platform,
            first_line
        );
        for line in &post.delivery_log {
            println!("    {}", line);
        }
    }

    println!(
        "\n{} posts: {} published, {} partial, {} failed, {} drafts",
        history.posts.len(),
        history.count_by_status(PostStatus::Published),
        history.count_by_status(PostStatus::Partial),
        history.count_by_status(PostStatus::Failed),
        history.count_by_status(PostStatus::Draft)
    );

    Ok(())
}
