use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use pagemill::build::run_cycle;
use pagemill::config::Config;
use pagemill::scrape::{record_articles, DedupLog, HttpFetcher, Scraper};
use pagemill::store::Store;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let project_arg = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .default_value(".")
        .help("The project directory (or any directory beneath it)");

    let matches = App::new("pagemill")
        .version(crate_version!())
        .about("Generates clusters of templated, internally-linked HTML pages")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("generate")
                .about("Runs one or more generation cycles")
                .arg(project_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory (overrides the project setting)"),
                )
                .arg(
                    Arg::with_name("count")
                        .long("count")
                        .short("n")
                        .takes_value(true)
                        .help("The number of pages per cycle"),
                )
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .takes_value(true)
                        .help("Seeds the random generator so a run can be replayed"),
                )
                .arg(
                    Arg::with_name("cycles")
                        .long("cycles")
                        .takes_value(true)
                        .default_value("1")
                        .help("The number of generation cycles to run"),
                ),
        )
        .subcommand(
            SubCommand::with_name("scrape")
                .about("Adds article titles and descriptions from a sitemap to the keyword corpus")
                .arg(project_arg)
                .arg(
                    Arg::with_name("sitemap")
                        .long("sitemap")
                        .takes_value(true)
                        .help("The sitemap index URL (overrides the project setting)"),
                )
                .arg(
                    Arg::with_name("limit")
                        .long("limit")
                        .takes_value(true)
                        .help("The most articles to scrape"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("generate", Some(matches)) => generate(matches),
        ("scrape", Some(matches)) => scrape(matches),
        _ => Ok(()),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        let mut source = e.source();
        while let Some(err) = source {
            log::error!("  caused by: {}", err);
            source = err.source();
        }
        std::process::exit(1);
    }
}

fn generate(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(matches)?;
    if let Some(output) = matches.value_of("output") {
        config.output_directory = PathBuf::from(output);
    }
    if let Some(count) = parse_arg(matches, "count")? {
        config.page_count = count;
    }
    let cycles: usize = parse_arg(matches, "cycles")?.unwrap_or(1);
    let seed: u64 = match parse_arg(matches, "seed")? {
        Some(seed) => seed,
        None => rand::rng().random(),
    };
    log::info!("Using seed {}", seed);

    let store = Store::load(&config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    for cycle in 0..cycles {
        if cycles > 1 {
            log::info!("Cycle {}/{}", cycle + 1, cycles);
        }
        run_cycle(&config, &store, chrono::Utc::now(), &mut rng)?;
    }
    Ok(())
}

fn scrape(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(matches)?;
    let settings = config.scrape;
    let sitemap_index = match matches.value_of("sitemap") {
        Some(url) => url.to_owned(),
        None => settings
            .sitemap_index
            .ok_or("No sitemap index configured; set `scrape.sitemap_index` or pass --sitemap")?,
    };
    let limit = parse_arg(matches, "limit")?.or(settings.limit);

    let fetcher = HttpFetcher::new(
        &settings.user_agent,
        Duration::from_secs(settings.timeout_secs),
    )?;
    let mut seen = DedupLog::open(&settings.dedup_log)?;
    log::info!("{} URLs already processed", seen.len());

    let articles = Scraper {
        fetcher: &fetcher,
        sitemap_index: &sitemap_index,
        limit,
    }
    .run(&seen)?;
    record_articles(&settings.corpus_output, &mut seen, &articles)?;
    log::info!(
        "Added {} articles to `{}`",
        articles.len(),
        settings.corpus_output.display()
    );
    Ok(())
}

fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
    let project = matches.value_of("project").unwrap_or(".");
    Ok(Config::from_directory(Path::new(project))?)
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Error + 'static,
{
    match matches.value_of(name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value `{}` for --{}: {}", value, name, e).into()),
    }
}
