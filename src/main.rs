// ABOUTME: CLI entrypoint for md2canvas command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2canvas::{
    api::ApiClient,
    auth::resolve_credentials,
    cli::{Cli, Commands},
    download::download_pages,
    logging,
    modules::delete_module,
    publish::publish,
    storage::write_atomic,
    CanvasCourse, ContentItem, Error, Result,
};
use regex::Regex;
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_file().as_deref()) {
        eprintln!("md2canvas: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }

    if let Err(e) = run(cli) {
        tracing::error!("{}", e);
        eprintln!("md2canvas: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn open_course(cli: &Cli) -> Result<CanvasCourse> {
    let course_id = cli
        .course
        .ok_or_else(|| Error::Setup("a course id is required (--course or CANVAS_COURSE_ID)".into()))?;
    let creds = resolve_credentials(cli.api_url.clone())?;
    let client = ApiClient::new(creds.api_key, creds.api_url)?;
    CanvasCourse::open(client, course_id)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.clone() {
        Commands::Publish {
            folders,
            overwrite,
            fail_fast,
        } => {
            let course = open_course(&cli)?;
            publish_all(&course, &folders, overwrite, fail_fast)?;
        }
        Commands::Render { folder } => {
            let item = ContentItem::load(&folder)?;
            match &item.rendered {
                Some(rendered) => {
                    write_atomic(&item.result_path(), rendered.html.as_bytes())?;
                    println!(
                        "Rendered {} ({} local images) to {}",
                        item,
                        rendered.images.len(),
                        item.result_path().display()
                    );
                }
                None => println!("{} has no body to render", item),
            }
        }
        Commands::DownloadPages {
            destination,
            even_if_exists,
            filter,
        } => {
            let filter = filter
                .map(|f| Regex::new(&f))
                .transpose()
                .map_err(|e| Error::Setup(format!("invalid --filter: {}", e)))?;
            let course = open_course(&cli)?;
            let saved = download_pages(&course, &destination, even_if_exists, filter.as_ref())?;
            println!("Downloaded {} pages to {}", saved.len(), destination.display());
        }
        Commands::DeleteModule { name, missing_ok } => {
            let course = open_course(&cli)?;
            if delete_module(&course, &name, missing_ok)? {
                println!("Deleted module {}", name);
            } else {
                println!("No module named {}", name);
            }
        }
    }

    Ok(())
}

fn publish_all(
    course: &CanvasCourse,
    folders: &[PathBuf],
    overwrite: bool,
    fail_fast: bool,
) -> Result<()> {
    let pb = ProgressBar::new(folders.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} items {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    let mut published = 0;
    let mut first_error = None;

    for folder in folders {
        pb.set_message(folder.display().to_string());
        let outcome = ContentItem::load(folder).and_then(|mut item| publish(&mut item, course, overwrite));

        match outcome {
            Ok(result) => {
                tracing::info!(
                    folder = %folder.display(),
                    created = result.created,
                    module_items = result.module_items_created,
                    "published"
                );
                published += 1;
            }
            Err(e) if fail_fast => {
                pb.abandon();
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(folder = %folder.display(), "failed to publish: {}", e);
                first_error.get_or_insert(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "published {} of {} items",
        published,
        folders.len()
    ));

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
