use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pd_analysis::{
    ChartKind, ChartOptions, ChartRenderer, ChartSurface, CsvRenderer, JsonRenderer,
    RenderReceipt, RenderableTable, TextTableRenderer,
};
use pd_app::{
    AppError, AppResult, ComparisonPanel, PanelAxis, PanelFilter, SeriesChoice, import_upload,
    load_upload_report, refresh_from_store, summarize,
};
use pd_core::{ApproachId, CategoryId, MachineId, ProblemId, ThreadCount};
use pd_data::{Architecture, DashboardConfig, load_config, load_upload};
use pd_store::{Collection, JsonStore, MeasurementStore, PatchOp};

#[derive(Parser)]
#[command(name = "pd-cli")]
#[command(about = "perfdash CLI - Parallel performance measurement dashboard", long_about = None)]
struct Cli {
    /// Dashboard configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an upload file and report coverage warnings
    Summarize {
        /// Path to the upload file
        file: PathBuf,
    },
    /// Chart an upload file
    Chart {
        /// Path to the upload file
        file: PathBuf,
        /// Chart kind (execution-time, speedup, karp-flatt, perf-counter)
        #[arg(long, default_value = "execution-time")]
        kind: ChartKind,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import an upload file into a store
    Import {
        /// Store root directory
        store: PathBuf,
        /// Path to the upload file
        file: PathBuf,
        #[arg(long)]
        problem: String,
        #[arg(long)]
        approach: String,
        #[arg(long)]
        machine: String,
    },
    /// List documents of a collection
    List {
        store: PathBuf,
        collection: Collection,
    },
    /// Show one document
    Show {
        store: PathBuf,
        collection: Collection,
        id: String,
    },
    /// Apply a JSON patch file to a document
    Patch {
        store: PathBuf,
        collection: Collection,
        id: String,
        /// JSON array of patch operations
        patch_file: PathBuf,
    },
    /// Delete one document
    Delete {
        store: PathBuf,
        collection: Collection,
        id: String,
    },
    /// List categories, or the ones filing a problem
    Categories {
        store: PathBuf,
        #[arg(long)]
        problem: Option<String>,
    },
    /// List the problems of a category
    Problems {
        store: PathBuf,
        #[arg(long)]
        category: String,
    },
    /// Compare approaches or machines from a store
    Compare {
        store: PathBuf,
        #[arg(long)]
        problem: String,
        /// Architecture filter (shared, distributed)
        #[arg(long)]
        arch: Option<Architecture>,
        #[arg(long, value_enum, default_value_t = Axis::Approach)]
        axis: Axis,
        /// Entities compared side by side
        #[arg(long, num_args = 1.., required = true)]
        entities: Vec<String>,
        /// Fixed machine (approach axis) or approach (machine axis)
        #[arg(long)]
        pivot: String,
        #[arg(long, num_args = 1.., required = true)]
        threads: Vec<u32>,
        /// Plot end-to-end times
        #[arg(long)]
        e2e: bool,
        /// Do not plot algorithm times
        #[arg(long)]
        no_alg: bool,
        #[arg(long, default_value = "execution-time")]
        kind: ChartKind,
        /// Chart the mean of this performance counter instead (e.g. cacheMisses)
        #[arg(long)]
        counter: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

impl Format {
    fn renderer(self) -> Box<dyn ChartRenderer> {
        match self {
            Format::Table => Box::new(TextTableRenderer::default()),
            Format::Csv => Box::new(CsvRenderer),
            Format::Json => Box::new(JsonRenderer),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Axis {
    Approach,
    Machine,
}

impl From<Axis> for PanelAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Approach => PanelAxis::ApproachCentric,
            Axis::Machine => PanelAxis::MachineCentric,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(config = ?cli.config, "pd-cli starting");
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DashboardConfig::default(),
    };

    match cli.command {
        Commands::Summarize { file } => cmd_summarize(&config, &file),
        Commands::Chart {
            file,
            kind,
            format,
            output,
        } => cmd_chart(&config, &file, kind, format, output.as_deref()),
        Commands::Import {
            store,
            file,
            problem,
            approach,
            machine,
        } => cmd_import(&store, &file, &problem, &approach, &machine),
        Commands::List { store, collection } => cmd_list(&store, collection),
        Commands::Show {
            store,
            collection,
            id,
        } => cmd_show(&store, collection, &id),
        Commands::Patch {
            store,
            collection,
            id,
            patch_file,
        } => cmd_patch(&store, collection, &id, &patch_file),
        Commands::Delete {
            store,
            collection,
            id,
        } => cmd_delete(&store, collection, &id),
        Commands::Categories { store, problem } => cmd_categories(&store, problem.as_deref()),
        Commands::Problems { store, category } => cmd_problems(&store, &category),
        Commands::Compare {
            store,
            problem,
            arch,
            axis,
            entities,
            pivot,
            threads,
            e2e,
            no_alg,
            kind,
            counter,
            format,
            output,
        } => {
            let filter = PanelFilter::new(parse_id(ProblemId::new(&problem))?, pivot, entities);
            let filter = match arch {
                Some(arch) => filter.with_architecture(arch),
                None => filter,
            };
            let choice = SeriesChoice {
                threads: threads.into_iter().map(ThreadCount).collect(),
                plot_e2e: e2e,
                plot_alg: !no_alg,
            };
            cmd_compare(
                &config,
                &store,
                axis.into(),
                filter,
                choice,
                kind,
                counter.as_deref(),
                format,
                output.as_deref(),
            )
        }
    }
}

fn parse_id<T>(id: Result<T, pd_core::CoreError>) -> AppResult<T> {
    id.map_err(|e| AppError::InvalidInput(e.to_string()))
}

fn base_options(config: &DashboardConfig) -> ChartOptions {
    ChartOptions::base().merged(&ChartOptions::from(&config.chart))
}

fn cmd_summarize(config: &DashboardConfig, file: &Path) -> AppResult<()> {
    let upload = load_upload(file)?;
    for err in &upload.errors {
        println!("  skipped: {}", err);
    }
    let summary = summarize(&upload.records)?;
    let report = pd_app::analyze_upload(upload, &config.thresholds);

    println!("\nUpload Summary:");
    println!("  Records: {}", summary.record_count);
    println!(
        "  Problem sizes: {} ({} - {})",
        summary.problem_sizes, summary.size_range.0, summary.size_range.1
    );
    let threads: Vec<String> = summary.thread_counts.iter().map(|p| p.to_string()).collect();
    println!("  Thread counts: {}", threads.join(", "));
    println!("  Runs: {}", summary.runs);

    if report.flags.any() {
        println!("\nWarnings:");
        for message in report.flags.messages(&config.thresholds) {
            println!("  ! {}", message);
        }
    }
    for advisory in &report.speedup_advisories {
        println!(
            "  ! no {} speedup at n = {} ({:?})",
            advisory.metric, advisory.problem_size, advisory.gap
        );
    }
    Ok(())
}

fn cmd_chart(
    config: &DashboardConfig,
    file: &Path,
    kind: ChartKind,
    format: Format,
    output: Option<&Path>,
) -> AppResult<()> {
    let report = load_upload_report(file, &config.thresholds)?;
    if !report.parse_errors.is_empty() {
        eprintln!("Skipped {} malformed line(s)", report.parse_errors.len());
    }

    let mut options = base_options(config);
    options.apply_preset(kind);
    let receipt = draw(&report.view(kind), &options, format)?;
    emit(&receipt, output)
}

fn draw(table: &RenderableTable, options: &ChartOptions, format: Format) -> AppResult<RenderReceipt> {
    let mut renderer = format.renderer();
    let mut surface = ChartSurface::acquire(renderer.as_mut())?;
    Ok(surface.draw(table, options)?)
}

fn emit(receipt: &RenderReceipt, output: Option<&Path>) -> AppResult<()> {
    if receipt.placeholder {
        eprintln!("No series to plot");
    }
    match output {
        Some(path) => {
            std::fs::write(path, &receipt.artifact)?;
            println!(
                "✓ Wrote {} chart ({} series, {} rows) to {}",
                receipt.kind,
                receipt.series_count,
                receipt.row_count,
                path.display()
            );
        }
        None => print!("{}", receipt.artifact),
    }
    Ok(())
}

fn open_store(root: &Path) -> AppResult<JsonStore> {
    Ok(JsonStore::new(root.to_path_buf())?)
}

fn cmd_import(
    store: &Path,
    file: &Path,
    problem: &str,
    approach: &str,
    machine: &str,
) -> AppResult<()> {
    let store = open_store(store)?;
    let upload = load_upload(file)?;
    let summary = import_upload(
        &store,
        &upload,
        &parse_id(ProblemId::new(problem))?,
        &parse_id(ApproachId::new(approach))?,
        &parse_id(MachineId::new(machine))?,
    )?;

    println!("✓ Imported {} record(s)", summary.written);
    if summary.skipped_lines > 0 {
        println!("  Skipped {} malformed line(s)", summary.skipped_lines);
    }
    if summary.collapsed > 0 {
        println!("  Stored {} duplicate line(s) once", summary.collapsed);
    }
    Ok(())
}

fn cmd_list(store: &Path, collection: Collection) -> AppResult<()> {
    let docs = open_store(store)?.index(collection)?;
    if docs.is_empty() {
        println!("No {} documents found", collection);
        return Ok(());
    }
    println!("{} ({}):", collection.dir_name(), docs.len());
    for doc in docs {
        let id = doc.get("_id").and_then(|v| v.as_str()).unwrap_or("?");
        match doc.get("name").and_then(|v| v.as_str()) {
            Some(name) => println!("  {} - {}", id, name),
            None => println!("  {}", id),
        }
    }
    Ok(())
}

fn print_doc(doc: &serde_json::Value) -> AppResult<()> {
    let text = serde_json::to_string_pretty(doc).map_err(|e| AppError::Data(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn cmd_show(store: &Path, collection: Collection, id: &str) -> AppResult<()> {
    let doc = open_store(store)?.show(collection, id)?;
    print_doc(&doc)
}

fn cmd_patch(store: &Path, collection: Collection, id: &str, patch_file: &Path) -> AppResult<()> {
    let content = std::fs::read_to_string(patch_file)?;
    let ops: Vec<PatchOp> = serde_json::from_str(&content)
        .map_err(|e| AppError::InvalidInput(format!("patch file: {e}")))?;
    let doc = open_store(store)?.patch(collection, id, &ops)?;
    println!("✓ Applied {} operation(s)", ops.len());
    print_doc(&doc)
}

fn cmd_delete(store: &Path, collection: Collection, id: &str) -> AppResult<()> {
    open_store(store)?.destroy(collection, id)?;
    println!("✓ Deleted {} {}", collection, id);
    Ok(())
}

fn cmd_categories(store: &Path, problem: Option<&str>) -> AppResult<()> {
    let store = open_store(store)?;
    let categories = match problem {
        Some(problem) => store.categories_by_problem(&parse_id(ProblemId::new(problem))?)?,
        None => store.categories()?,
    };
    if categories.is_empty() {
        println!("No categories found");
    }
    for category in categories {
        println!("  {} - {}", category.id, category.name);
    }
    Ok(())
}

fn cmd_problems(store: &Path, category: &str) -> AppResult<()> {
    let store = open_store(store)?;
    let problems = store.problems_by_category(&parse_id(CategoryId::new(category))?)?;
    if problems.is_empty() {
        println!("No problems in category {}", category);
    }
    for problem in problems {
        match &problem.description {
            Some(description) => println!("  {} - {} ({})", problem.id, problem.name, description),
            None => println!("  {} - {}", problem.id, problem.name),
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    config: &DashboardConfig,
    store: &Path,
    axis: PanelAxis,
    filter: PanelFilter,
    choice: SeriesChoice,
    kind: ChartKind,
    counter: Option<&str>,
    format: Format,
    output: Option<&Path>,
) -> AppResult<()> {
    let store = open_store(store)?;
    let entities = filter.compared.clone();

    let mut panel = ComparisonPanel::with_options(axis, base_options(config));
    refresh_from_store(&mut panel, &store, filter)?;

    for entity in &entities {
        let Some(selection) = panel.selection(entity) else {
            continue;
        };
        let available = selection.available_threads.clone();
        let mut entity_choice = choice.clone();
        entity_choice.threads.retain(|p| available.contains(p));
        if entity_choice.threads.len() < choice.threads.len() {
            eprintln!("  {}: some thread counts have no runs and were skipped", entity);
        }
        panel.update_series(entity, entity_choice)?;
    }
    match counter {
        Some(counter) => {
            panel.select_counter(counter)?;
            panel.change_chart(ChartKind::PerfCounter);
        }
        None => panel.change_chart(kind),
    }

    let related = panel.related_entities();
    if !related.is_empty() {
        let names: Vec<&str> = related.iter().map(|(_, name)| name.as_str()).collect();
        eprintln!("Related: {}", names.join(", "));
    }
    let penvs: Vec<String> = panel.related_penvs().iter().map(|p| p.to_string()).collect();
    if !penvs.is_empty() {
        eprintln!("Environments: {}", penvs.join(", "));
    }

    let mut renderer = format.renderer();
    let receipt = panel.render(renderer.as_mut())?;
    emit(&receipt, output)
}
