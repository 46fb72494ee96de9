use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use futures_util::future::join_all;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chat_gallery::application::{AttachmentPaginator, ChannelReport, ChannelReporter};
use chat_gallery::domain::{Attachment, ChannelKey};
use chat_gallery::domain::ports::AttachmentSourcePort;
use chat_gallery::infrastructure::{
    AppConfig, CliArgs, ConfigStore, HttpAttachmentSource, ImagePreloader, JsonFileSource,
    MediaPreloadCache, OutputFormat,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let store = ConfigStore::new(args.config.as_deref())?;
    let mut config = store.load()?;
    config.merge_with_args(args);
    Ok(config)
}

async fn create_source(args: &CliArgs, config: &AppConfig) -> Result<Arc<dyn AttachmentSourcePort>> {
    if let Some(dump) = &args.dump {
        return Ok(Arc::new(JsonFileSource::load(dump).await?));
    }

    let base_url = config
        .api
        .base_url
        .clone()
        .ok_or_else(|| eyre!("no attachment source: pass a dump file or --api-url"))?;
    let timeout = Duration::from_secs(config.api.timeout_secs);
    Ok(Arc::new(HttpAttachmentSource::with_timeout(base_url, timeout)?))
}

/// Pages a channel from the newest item back until the server runs out or
/// `max_pages` pages were applied.
async fn load_channel(
    paginator: &AttachmentPaginator,
    channel: &ChannelKey,
    max_pages: Option<usize>,
) -> Result<usize> {
    let limit = paginator.config().limit;
    let mut outcome = paginator.fetch_initial(channel, limit).await?;
    let mut pages = 0;

    while let Some(summary) = outcome.summary() {
        pages += 1;
        if !summary.has_more || max_pages.is_some_and(|max| pages >= max) {
            break;
        }
        outcome = paginator.fetch_before(channel, limit).await?;
    }

    debug!(channel = %channel, pages, ?outcome, "Channel loaded");
    Ok(pages)
}

/// Render URL of an image, loading it only if the cache has not seen it.
fn thumbnail(preloader: &ImagePreloader, item: &Attachment) -> String {
    let image = preloader.resolve(item);
    if image.already_loaded {
        format!("{} (cached)", image.url)
    } else {
        preloader.mark_loaded(item);
        image.url
    }
}

fn print_text(report: &ChannelReport, preloader: &ImagePreloader) {
    let counts = report.counts;
    println!("# {}", report.channel);
    println!(
        "{} images, {} videos, {} audio, {} documents{}",
        counts.images,
        counts.videos,
        counts.audio,
        counts.documents,
        if report.has_more_before {
            " (older pages remain)"
        } else {
            ""
        }
    );

    for section in &report.page.sections {
        let day = &section.section;
        if day.is_first_of_year {
            println!();
            println!("== {} ==", day.year);
        }
        let date = chrono::DateTime::from_timestamp_millis(day.day_ts)
            .map(|at| at.with_timezone(&chrono::Local).format("%a %d %b").to_string())
            .unwrap_or_default();
        println!("-- {date} ({} items)", day.len());

        for row in &section.rows {
            let cells: Vec<String> = row
                .items
                .iter()
                .map(|item| format!("{} [{}]", item.filename(), thumbnail(preloader, item)))
                .collect();
            println!("   {}", cells.join("  |  "));
        }
    }

    for album in &report.albums {
        let style = album.layout.container_style;
        println!();
        println!(
            "album {} ({} images, {:.0}x{:.0})",
            album.message_id,
            album.images.len(),
            style.width,
            style.height
        );
        for (image, cell) in album.images.iter().zip(&album.layout.layout) {
            let rect = cell.dimensions;
            println!(
                "   {:<24} x={:>6.1} y={:>6.1} w={:>6.1} h={:>6.1}{}  {}",
                image.filename(),
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                if rect.is_small { " small" } else { "" },
                thumbnail(preloader, image)
            );
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = chat_gallery::VERSION, "Starting {}", chat_gallery::NAME);

    let source = create_source(&args, &config).await?;
    let paginator = AttachmentPaginator::with_config(source, config.gallery.paginator());
    let channels: Vec<ChannelKey> = args
        .channels
        .iter()
        .map(|channel| ChannelKey::new(args.clan.clone(), channel.clone()))
        .collect();

    let loads = join_all(
        channels
            .iter()
            .map(|channel| load_channel(&paginator, channel, args.pages)),
    )
    .await;

    let cache = Arc::new(MediaPreloadCache::new(config.gallery.max_loaded_cache));
    let preloader = ImagePreloader::new(cache.clone(), config.api.preloader());
    let reporter = ChannelReporter::new(
        config.gallery.chunk_size,
        config.album.constraints(args.mobile),
        args.width,
    );

    let mut reports = Vec::with_capacity(channels.len());
    for (channel, loaded) in channels.iter().zip(loads) {
        if let Err(e) = loaded {
            warn!(channel = %channel, error = %e, "Failed to load channel");
            eprintln!("{channel}: {e}");
            continue;
        }

        let has_more = paginator
            .state(channel)
            .is_some_and(|state| state.has_more_before());
        reports.push(reporter.report(channel, &paginator.items(channel), has_more));
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                print_text(report, &preloader);
            }
            debug!(stats = %cache.stats(), "Thumbnail cache");
        }
    }

    if reports.len() < channels.len() {
        return Err(eyre!(
            "{} of {} channels failed to load",
            channels.len() - reports.len(),
            channels.len()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_gallery::domain::ports::PreloadCachePort;
    use chat_gallery::infrastructure::image::PreloaderConfig;

    #[test]
    fn test_thumbnail_loads_each_url_once() {
        let cache = Arc::new(MediaPreloadCache::new(10));
        let preloader = ImagePreloader::new(cache.clone(), PreloaderConfig::default());
        let item = Attachment::new(
            "a",
            "https://cdn.example.com/a.png",
            "a.png",
            "image/png",
            chrono::Utc::now(),
        );

        let first = thumbnail(&preloader, &item);
        let second = thumbnail(&preloader, &item);

        assert!(!first.ends_with("(cached)"));
        assert_eq!(second, format!("{first} (cached)"));
        assert_eq!(cache.len(), 1);
    }
}
