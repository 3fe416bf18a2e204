use anyhow::Context;
use clap::{Parser, Subcommand};
use lunch_finder::ocr::{self, PSM_BLOCK};
use lunch_finder::pdf::{self, PdfKind};
use lunch_finder::{Config, Day, LunchService, logging, web};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lunch-finder", version, about = "Weekly lunch menus around the office")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web UI and JSON API (default)
    Serve,
    /// Print the menu for one day
    Menu {
        /// Monday-Friday or Montag-Freitag, defaults to today
        #[arg(long)]
        day: Option<Day>,
        /// Only this restaurant
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_images: bool,
    },
    /// Print the lines of a local PDF for parser debugging
    Dump {
        file: PathBuf,
        /// Force OCR even when the PDF has a text layer
        #[arg(long)]
        ocr: bool,
        /// Tesseract page segmentation mode
        #[arg(long, default_value_t = PSM_BLOCK)]
        psm: u8,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let service = Arc::new(LunchService::from_config(&cli.config)?);
            web::serve(service, &cli.config.bind).await
        }
        Command::Menu {
            day,
            provider,
            json,
            no_images,
        } => {
            let service = LunchService::from_config(&cli.config)?;
            let day = day.unwrap_or_else(Day::today);
            let with_images = !no_images && service.images_enabled();
            let menus = match provider {
                Some(name) => {
                    let provider = service
                        .provider(&name)
                        .with_context(|| format!("unknown provider '{name}'"))?;
                    vec![service.provider_menu(provider.as_ref(), day, with_images).await]
                }
                None => service.menus(day, with_images).await,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&menus)?);
                return Ok(());
            }
            println!("{}", day.label());
            for menu in &menus {
                println!("\n== {} ==", menu.provider_name);
                if menu.items.is_empty() {
                    println!("No menu from {} for this day", menu.provider_name);
                }
                for item in &menu.items {
                    let price = item.price.as_deref().unwrap_or("");
                    println!("- {} {price}", item.name_german);
                    if !item.name_english.is_empty() && item.name_english != item.name_german {
                        println!("  {}", item.name_english);
                    }
                }
            }
            Ok(())
        }
        Command::Dump {
            file,
            ocr: force_ocr,
            psm,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let doc = pdf::load_document(&bytes);
            println!("kind: {:?}", doc.kind);

            let text = if force_ocr || doc.kind == PdfKind::ImageBased {
                let settings = cli.config.ocr();
                let rasterized = ocr::rasterize(&bytes, settings.dpi).await?;
                let mut pages = Vec::new();
                for image in &rasterized.pages {
                    pages.push(ocr::recognize_text(image, &settings.lang, psm).await?);
                }
                pages.join("\n")
            } else {
                doc.text
            };

            for (i, line) in text.lines().enumerate() {
                if !line.trim().is_empty() {
                    println!("{}: {:?}", i, line);
                }
            }
            Ok(())
        }
    }
}
