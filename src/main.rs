use std::path::Path;

use clap::Parser;
use keysift::{
    Analyzer,
    DataDir,
    EnablementConfig,
    Error,
    IndexStore,
    JsonDirProvider,
    LazyStore,
    QueryOptions,
    Result,
    SearchConfig,
    TextProcessor,
    builder,
    enablement,
    search,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{BuildArgs, Cli, Command, SearchArgs, StatusArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("KEYSIFT_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let config_path = cli.config.unwrap_or_else(|| data_dir.config_file());
    let config = SearchConfig::load(&config_path)?;

    match cli.command {
        Command::ScanTypes => {
            let provider = JsonDirProvider::new(config.source_dir(&data_dir));
            let path = enablement::scan_types(
                &provider,
                &config,
                &config.enablement_dir(&data_dir),
            )?;
            println!("Wrote {}", path.display());
        }
        Command::ScanFields => {
            let provider = JsonDirProvider::new(config.source_dir(&data_dir));
            let paths = enablement::scan_fields(
                &provider,
                &config,
                &config.enablement_dir(&data_dir),
            )?;
            for path in paths {
                println!("Wrote {}", path.display());
            }
        }
        Command::Build(args) => {
            cmd_build(&config, &data_dir, &args)?;
        }
        Command::Search(args) => {
            cmd_search(&config, &data_dir, &args)?;
        }
        Command::Status(args) => {
            cmd_status(&config, &data_dir, &args)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_build(
    config: &SearchConfig,
    data_dir: &DataDir,
    args: &BuildArgs,
) -> Result<()> {
    let provider = JsonDirProvider::new(config.source_dir(data_dir));
    let enablement =
        EnablementConfig::load(config, &config.enablement_dir(data_dir))?;
    let text = Analyzer::new(&config.text);
    let index_dir = config.index_dir(data_dir);

    let mut store = IndexStore::new();
    let report = builder::build_index(
        &provider,
        &enablement,
        &text,
        &config.collections,
        &mut store,
    )?;

    if args.purge {
        purge_collections(&index_dir, &config.collections)?;
    }
    store.save(&index_dir, &config.collection_set())?;

    eprintln!(
        "Indexed {} record(s) from {} entity type(s) in {} collection(s) into {}",
        report.records,
        report.entity_types,
        report.collections,
        index_dir.display()
    );
    Ok(())
}

fn purge_collections(index_dir: &Path, collections: &[String]) -> Result<()> {
    for collection in collections {
        let dir = index_dir.join(collection);
        if dir.is_dir() {
            tracing::info!(dir = %dir.display(), "purging collection");
            std::fs::remove_dir_all(&dir)?;
        }
    }
    Ok(())
}

/// Config `[query]` defaults with the command line's overrides applied.
fn query_options(config: &SearchConfig, args: &SearchArgs) -> QueryOptions {
    QueryOptions {
        full_match: config.query.full_match && !args.no_full,
        word_match: config.query.word_match && !args.no_word,
        regex_match: config.query.regex_match || args.regex,
    }
}

fn cmd_search(
    config: &SearchConfig,
    data_dir: &DataDir,
    args: &SearchArgs,
) -> Result<()> {
    let text = Analyzer::new(&config.text);
    if text.clean(&args.query).trim().is_empty() {
        return Err(Error::Config(
            "query is empty once punctuation is removed".into(),
        ));
    }

    let store =
        LazyStore::new(config.index_dir(data_dir), config.collection_set());
    let store = store.get()?;

    let limit = (!args.all).then_some(args.count);
    let results = search::execute_query(
        &store,
        &text,
        &args.query,
        &query_options(config, args),
        limit,
    )?;

    if args.json {
        search::format_json(&results, &args.query)?;
    } else {
        search::format_human(&results);
    }
    Ok(())
}

fn cmd_status(
    config: &SearchConfig,
    data_dir: &DataDir,
    args: &StatusArgs,
) -> Result<()> {
    let index_dir = config.index_dir(data_dir);
    let mut store = IndexStore::new();
    store.load(&index_dir, &config.collection_set())?;

    let counts: Vec<(&str, usize)> = config
        .collections
        .iter()
        .map(|name| {
            let count = store
                .records()
                .iter()
                .filter(|r| r.identity().collection() == name)
                .count();
            (name.as_str(), count)
        })
        .collect();

    if args.json {
        let collections: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(name, count)| (name.to_string(), (*count).into()))
            .collect();
        let output = serde_json::json!({
            "data_dir": data_dir.root(),
            "index_dir": index_dir,
            "collections": collections,
            "records": store.len(),
        });
        println!("{output}");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Index directory: {}", index_dir.display());
        println!("Collections: {}", counts.len());
        for (name, count) in &counts {
            println!("  {name}: {count} record(s)");
        }
        println!("Records: {}", store.len());
    }
    Ok(())
}
