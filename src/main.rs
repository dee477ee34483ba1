use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};

use course_grabber::config::{self, AppConfig, ConfigManager, LoginConfig, PortalSettings};
use course_grabber::finder::{
    self, CatalogStorage, CourseFinder, CourseQuery, FinderOptions, SortField, export, generate_config, query,
};
use course_grabber::finder::query::{CatalogStats, group_by_teacher};
use course_grabber::portal::{Grabber, StdinCaptcha};
use course_grabber::utils::logging;

/// Course registration helper: grab courses, scrape timetables, rebuild configs
#[derive(Debug, Parser)]
#[command(name = "course-grabber")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and grab every course in the config
    Grab {
        /// INI file with credentials and course ids
        #[arg(short, long, default_value = "config.ini")]
        config: PathBuf,

        /// Portal address, overriding the config
        #[arg(long)]
        base_url: Option<String>,

        /// Milliseconds between retries, overriding the config
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop each loop after this many requests
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: Option<u32>,
    },
    /// Scrape every teacher's timetable for a semester
    Find {
        /// Semester to look up, e.g. 2024-2025-2
        #[arg(short, long)]
        semester: String,

        /// Portal address
        #[arg(long)]
        base_url: Option<String>,

        /// Cookie header copied from a logged-in browser
        #[arg(long)]
        cookie: Option<String>,

        /// Timetables downloaded at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Threads used to parse timetables
        #[arg(long)]
        parse_threads: Option<usize>,

        /// Where to write the catalog
        #[arg(long, default_value = "all_courses.json")]
        catalog: PathBuf,

        /// Also write every course as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write a summary of the online courses
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Search a saved catalog
    Search {
        #[arg(long, default_value = "all_courses.json")]
        catalog: PathBuf,

        /// Course name contains
        #[arg(long)]
        name: Option<String>,

        /// Teacher name contains
        #[arg(long)]
        teacher: Option<String>,

        /// More credit hours than this
        #[arg(long)]
        min_credits: Option<f64>,

        /// Room contains
        #[arg(long)]
        location: Option<String>,

        /// Only online courses
        #[arg(long)]
        online: bool,

        /// name, teacher, enrollment, credits, or weekday
        #[arg(long)]
        sort_by: Option<SortField>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        #[arg(long)]
        limit: Option<usize>,

        /// Write the matches as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the matches as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show counts for a saved catalog
    Stats {
        #[arg(long, default_value = "all_courses.json")]
        catalog: PathBuf,

        /// Write one JSON file per teacher into this directory
        #[arg(long)]
        split_dir: Option<PathBuf>,
    },
    /// Rebuild the config's public electives from the online courses in a catalog
    GenConfig {
        #[arg(long, default_value = "all_courses.json")]
        catalog: PathBuf,

        /// Existing config to take credentials and required courses from
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// jx0404id prefix of the semester, needed without --config
        #[arg(long)]
        semester_prefix: Option<String>,

        /// Where to write the new config
        #[arg(short, long, default_value = "config.ini")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::level_from_verbosity(cli.verbose), cli.log_file.as_deref())?;

    match cli.command {
        Commands::Grab { config, base_url, interval_ms, max_attempts } => {
            run_grab(&config, base_url, interval_ms, max_attempts).await?
        }
        Commands::Find { semester, base_url, cookie, concurrency, parse_threads, catalog, csv, summary } => {
            finder::configure_parse_threads(parse_threads)?;
            let mut options = FinderOptions::new(semester);
            if let Some(base_url) = base_url {
                options.base_url = base_url;
            }
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            options.cookie = cookie;
            run_find(options, &catalog, csv.as_deref(), summary.as_deref()).await?
        }
        Commands::Search {
            catalog, name, teacher, min_credits, location, online, sort_by, desc, limit, json, csv,
        } => {
            let options = CourseQuery {
                name,
                teacher,
                min_credit_hours: min_credits,
                location,
                online_only: online,
                sort_by,
                descending: desc,
                limit,
            };
            run_search(&catalog, &options, json.as_deref(), csv.as_deref())?
        }
        Commands::Stats { catalog, split_dir } => run_stats(&catalog, split_dir.as_deref())?,
        Commands::GenConfig { catalog, config, semester_prefix, output } => {
            run_gen_config(&catalog, config.as_deref(), semester_prefix, &output)?
        }
    }

    Ok(())
}

async fn run_grab(
    path: &Path,
    base_url: Option<String>,
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> Result<()> {
    let mut app_config = ConfigManager::load(path)?.app_config()?;
    if let Some(base_url) = base_url {
        app_config.settings.base_url = base_url.trim_end_matches('/').to_string();
        app_config.rebuild_urls();
    }
    if let Some(interval) = interval_ms {
        app_config.settings.retry_interval = Duration::from_millis(interval);
    }
    if max_attempts.is_some() {
        app_config.settings.max_attempts = max_attempts;
    }

    let grabber = Grabber::new(app_config)?;

    tokio::select! {
        report = grabber.run(Arc::new(StdinCaptcha)) => {
            let report = report?;
            println!("{}", report);
            info!("Course selection finished, exiting");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user");
        }
    }

    Ok(())
}

async fn run_find(
    options: FinderOptions,
    catalog_path: &Path,
    csv: Option<&Path>,
    summary: Option<&Path>,
) -> Result<()> {
    let finder = CourseFinder::new(options)?;
    let result = finder.get_teacher_courses().await?;

    CatalogStorage::new(catalog_path).save(&result.catalog)?;
    if let Some(path) = csv {
        export::save_to_csv(&result.catalog.courses, path)?;
    }
    if let Some(path) = summary {
        export::save_summary(&result.catalog.courses, path)?;
    }

    for teacher in &result.stats.failed_teachers {
        warn!("No timetable for {} ({})", teacher.name, teacher.id);
    }
    println!(
        "{} courses from {} teachers, {} online",
        result.stats.total_courses,
        result.stats.fetched_timetables,
        result.catalog.online_courses().count()
    );
    Ok(())
}

fn run_search(
    catalog_path: &Path,
    options: &CourseQuery,
    json: Option<&Path>,
    csv: Option<&Path>,
) -> Result<()> {
    let catalog = CatalogStorage::new(catalog_path).load()?;
    let matches: Vec<_> = query::query(&catalog.courses, options).into_iter().cloned().collect();

    print!("{}", export::format_course_info(&matches));
    if let Some(path) = json {
        export::save_to_json(&matches, path)?;
    }
    if let Some(path) = csv {
        export::save_to_csv(&matches, path)?;
    }
    Ok(())
}

fn run_stats(catalog_path: &Path, split_dir: Option<&Path>) -> Result<()> {
    let catalog = CatalogStorage::new(catalog_path).load()?;
    let stats = CatalogStats::from_courses(&catalog.courses);

    println!("semester:       {}", catalog.semester);
    println!("fetched at:     {}", catalog.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("courses:        {}", stats.total_courses);
    println!("teachers:       {}", stats.teachers);
    println!("locations:      {}", stats.locations);
    println!("online courses: {}", stats.online_courses);
    println!();
    for (teacher, courses) in group_by_teacher(&catalog.courses) {
        println!("{}: {} courses", teacher, courses.len());
    }

    if let Some(dir) = split_dir {
        let written = export::save_per_teacher(&catalog.courses, dir)?;
        info!("Wrote {} teacher files to {}", written.len(), dir.display());
    }
    Ok(())
}

fn run_gen_config(
    catalog_path: &Path,
    base_config: Option<&Path>,
    semester_prefix: Option<String>,
    output: &Path,
) -> Result<()> {
    let catalog = CatalogStorage::new(catalog_path).load()?;

    let mut base = match base_config {
        Some(path) => ConfigManager::load(path)?.app_config()?,
        None => {
            let Some(semester) = semester_prefix.clone() else {
                bail!("Pass --config or --semester-prefix so course ids can be derived");
            };
            AppConfig {
                login: LoginConfig {
                    username: "your_student_id".to_string(),
                    password: "your_password".to_string(),
                    semester,
                },
                courses: Vec::new(),
                settings: PortalSettings::default(),
            }
        }
    };
    if let Some(semester) = semester_prefix {
        base.login.semester = semester;
        base.rebuild_urls();
    }

    let generated = generate_config(&catalog, &base);
    if !generated.skipped.is_empty() {
        warn!("{} online courses skipped: jx0404id without the semester prefix", generated.skipped.len());
    }

    config::save_config(&generated.config, output)
        .with_context(|| format!("Failed to write generated config to {}", output.display()))?;
    println!(
        "Wrote {} online courses to {}",
        generated.config.courses_of(course_grabber::CourseKind::Public).count(),
        output.display()
    );
    Ok(())
}
