use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use log::debug;
use quire::build::{build_site, write_site_data};
use quire::config::Config;
use quire::index::build_index;
use quire::post::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();

    let project = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .value_name("DIR")
        .help("Directory to search (with its ancestors) for quire.yaml");

    let matches = App::new("quire")
        .version(crate_version!())
        .about("Indexes a blog's Markdown posts into routes, tags and page data")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site data and writes site-data.yaml")
                .arg(project.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Output directory (defaults to `build` beside quire.yaml)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("index")
                .about("Prints the post list and tag map as YAML")
                .arg(project.clone()),
        )
        .subcommand(
            SubCommand::with_name("route")
                .about("Prints the route for a post slug")
                .arg(project)
                .arg(
                    Arg::with_name("SLUG")
                        .required(true)
                        .index(1)
                        .help("A post file name without extension, e.g. 2021-03-07-hello-world"),
                ),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match matches.subcommand() {
        ("build", Some(sub)) => {
            let output = sub.value_of("output").map(PathBuf::from);
            let config = load_config(sub, output.as_deref())?;
            let data = build_site(&config)?;
            let path = write_site_data(&data, &config.output_directory)?;
            println!("{}", path.display());
        }
        ("index", Some(sub)) => {
            let config = load_config(sub, None)?;
            let index = build_index(&parser(&config)?, &config.posts_source_directory())?;
            print!("{}", serde_yaml::to_string(&index)?);
        }
        ("route", Some(sub)) => {
            let config = load_config(sub, None)?;
            // SLUG is required, so clap guarantees a value
            let slug = sub.value_of("SLUG").unwrap_or_default();
            println!("{}", parser(&config)?.route(slug)?);
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

fn load_config(matches: &ArgMatches, output: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let dir = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    debug!("searching for project file from `{}`", dir.display());
    Ok(Config::from_directory(&dir, output)?)
}

fn parser(config: &Config) -> Result<Parser, Box<dyn Error>> {
    Ok(Parser::new(
        &config.filename_pattern,
        &config.route_pattern,
        &config.extensions,
    )?)
}
