use clap::{Parser, Subcommand};
use frontdesk::host::{Host, ProcessWorkbench};
use frontdesk::message::Request;
use frontdesk::sorting::GroupOption;
use frontdesk::store::{PushOutcome, ViewStateStore};
use frontdesk::types::ViewType;
use frontdesk::{bridge, config, output, version};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli_version() -> &'static str {
    // Leaked once at startup
    Box::leak(version::version_string().into_boxed_str())
}

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(about = "Content dashboard for markdown and MDX sites")]
#[command(long_about = "\
Content dashboard for markdown and MDX sites

Reads the front-matter of every .md/.mdx file in the content folders listed in
frontdesk.toml and serves the resulting pages to a dashboard, or lists them
on the command line.

Workspace structure:

  my-site/
  ├── frontdesk.toml             # Folders, fields, sorting, scripts
  ├── content/blog/              # [[folders]] path = \"content/blog\"
  │   ├── hello.md               # ---\\n title: Hello\\n date: 2024-03-01\\n ---
  │   └── 2023/recap.mdx         # Folders are walked recursively
  └── static/                    # static_folder, for `preview:` images

Files without a `title` are skipped. Files whose front-matter cannot be read
are reported and skipped.

Run 'frontdesk gen-config' to print a documented frontdesk.toml.")]
#[command(version = cli_version())]
struct Cli {
    /// Workspace root (where frontdesk.toml lives)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ListArgs {
    /// View to list
    #[arg(long, default_value = "contents")]
    view: ViewType,
    /// Only pages with this tag
    #[arg(long)]
    tag: Option<String>,
    /// Only pages with this category
    #[arg(long)]
    category: Option<String>,
    /// Only pages from this content folder (by title)
    #[arg(long)]
    folder: Option<String>,
    /// Case-insensitive search over title, description and slug
    #[arg(long)]
    search: Option<String>,
    /// Sort option id, e.g. "Last modified (desc)" or "weight-asc"
    #[arg(long)]
    sort: Option<String>,
    /// Group pages: none, year or draft
    #[arg(long, default_value = "none")]
    group: GroupOption,
}

#[derive(Subcommand)]
enum Command {
    /// List pages with filters, sorting and grouping applied
    List(ListArgs),
    /// Print the settings snapshot a dashboard would receive
    Settings,
    /// Persist one setting, e.g. `set open_on_start true`
    Set {
        /// Dotted key, e.g. dashboard.contents.default_sorting
        name: String,
        /// JSON value; anything that is not valid JSON is taken as a string.
        /// `null` removes the key.
        value: String,
    },
    /// Serve the dashboard bridge over stdin/stdout (JSON lines)
    Serve,
    /// Write a stock frontdesk.toml if the workspace has none
    Init,
    /// Print a stock frontdesk.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::List(args) => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            list(&cli.root, args)?;
        }
        Command::Settings => {
            let config = config::load_config(&cli.root)?;
            let settings =
                config.to_settings(config::is_initialized(&cli.root), version::version_info());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Set { name, value } => {
            let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            config::update_setting(&cli.root, &name, &value)?;
            println!("Updated {}", name);
        }
        Command::Serve => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            tracing::info!(root = %cli.root.display(), "serving dashboard bridge on stdio");
            let mut host = Host::new(&cli.root, ProcessWorkbench::from_env());
            bridge::serve(&mut host, std::io::stdin().lock(), std::io::stdout().lock())?;
        }
        Command::Init => {
            if config::initialize(&cli.root)? {
                println!("Wrote {}", cli.root.join(config::CONFIG_FILE).display());
            } else {
                println!("{} already exists", config::CONFIG_FILE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run both sides in-process: one `getData` round trip, then render.
fn list(root: &std::path::Path, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut host = Host::new(root, ProcessWorkbench::from_env());
    let mut store = ViewStateStore::new();

    let request = store.request(Request::GetData);
    for push in host.handle(request) {
        if let PushOutcome::Notification(note) = store.apply(push) {
            eprintln!("{}", output::format_notification(&note));
        }
    }

    store.set_view(args.view);
    let filters = store.filters_mut();
    filters.set_tag(args.tag);
    filters.set_category(args.category);
    filters.set_folder(args.folder);
    if let Some(term) = &args.search {
        filters.set_search(term);
    }
    if let Some(id) = args.sort {
        let options = store.sort_options();
        let Some(option) = options.iter().find(|o| o.id == id) else {
            let known: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
            return Err(format!("unknown sort '{}' (available: {})", id, known.join(", ")).into());
        };
        store.set_sort(Some(option.clone()));
    }
    store.set_grouping(args.group);

    output::print_listing(&store.grouped_pages(), &store.effective_sort(), root);
    Ok(())
}

/// Log to stderr; stdout carries listings and bridge traffic.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frontdesk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
