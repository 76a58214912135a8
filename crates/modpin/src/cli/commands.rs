use std::path::Path;

use console::style;
use modpin_fetch::{EngineConfig, FetchResult, Fetcher, ReqwestClient};
use modpin_lock::{Manifest, Requirements};
use modpin_source::PackageRef;
use tracing::{debug, info};

use super::args::{FetchArgs, InputArgs, LockArgs, TreeHashArgs, UpdateArgs, VerifyArgs};
use super::plan::{self, Job};
use crate::error::{CliError, CliResult};

pub async fn fetch(args: FetchArgs, config: &EngineConfig) -> CliResult<()> {
    let packages = parse_modules(&args.modules)?;
    let fetcher = fetcher(config)?;

    for result in fetch_all(&fetcher, &packages).await? {
        println!("{}  {}  {}", result.package, style(&result.hash).green(), result.dir.display());
    }
    Ok(())
}

pub async fn lock(args: LockArgs, config: &EngineConfig) -> CliResult<()> {
    let requirements = read_requirements(&args.input)?;
    let toolchain = args.toolchain.clone().or_else(|| requirements.toolchain.clone()).unwrap_or_default();
    let fetcher = fetcher(config)?;

    let mut manifest = Manifest::new(toolchain);
    plan::sync(&mut manifest, &requirements);
    if let Some(toolchain) = &args.toolchain {
        manifest.toolchain = toolchain.clone();
    }

    let jobs = plan::full(&requirements);
    info!("fetching {} modules", jobs.len());
    run_jobs(&fetcher, &jobs, &mut manifest).await?;

    manifest.save(&args.output)?;
    println!(
        "{} {} with {} modules ({} replacements)",
        style("Locked").green().bold(),
        args.output.display(),
        manifest.modules.len(),
        manifest.replace.len()
    );
    Ok(())
}

pub fn verify(args: VerifyArgs) -> CliResult<()> {
    let requirements = read_requirements(&args.input)?;
    let manifest = Manifest::load(&args.lock)?;

    let diff = manifest.diff(&requirements);
    if diff.is_clean() {
        println!("{} {}", style("OK").green().bold(), diff);
        return Ok(());
    }
    println!("{diff}");
    Err(CliError::OutOfSync)
}

pub async fn update(args: UpdateArgs, config: &EngineConfig) -> CliResult<()> {
    let requirements = read_requirements(&args.input)?;
    let mut manifest = Manifest::load(&args.lock)?;

    let jobs = plan::update(&requirements, &manifest, &args.modules)?;
    plan::sync(&mut manifest, &requirements);

    if jobs.is_empty() {
        debug!("no stale modules");
    } else {
        let fetcher = fetcher(config)?;
        // Named modules are downloaded again, not served from the cache.
        if !args.modules.is_empty() {
            for job in &jobs {
                if fetcher.cache().evict(&job.package).await.map_err(CliError::from)? {
                    debug!("evicted cached {}", job.package);
                }
            }
        }
        for job in &jobs {
            match manifest.modules.get(job.key()) {
                Some(locked) if locked.version != job.package.version() => {
                    info!("updating {}: {} -> {}", job.key(), locked.version, job.package.version())
                }
                Some(_) => info!("re-fetching {}", job.package),
                None => info!("adding {}", job.package),
            }
        }
        run_jobs(&fetcher, &jobs, &mut manifest).await?;
    }

    manifest.save(&args.lock)?;
    println!("{} {} ({} modules fetched)", style("Updated").green().bold(), args.lock.display(), jobs.len());
    Ok(())
}

pub async fn tree_hash(args: TreeHashArgs, config: &EngineConfig) -> CliResult<()> {
    let packages = parse_modules(&args.modules)?;
    let fetcher = fetcher(config)?;

    for result in fetch_all(&fetcher, &packages).await? {
        let sri = fetcher.tree_hash(&result).await?;
        println!("{}  {}", result.package, style(sri).green());
    }
    Ok(())
}

fn fetcher(config: &EngineConfig) -> CliResult<Fetcher<ReqwestClient>> {
    debug!(proxy = ?config.proxy, cache = %config.cache_dir.display(), "engine configuration");
    let client = ReqwestClient::new().map_err(modpin_fetch::FetchError::from)?;
    Ok(Fetcher::from_config(client, config)?)
}

fn parse_modules(modules: &[String]) -> CliResult<Vec<PackageRef>> {
    modules.iter().map(|m| m.parse::<PackageRef>().map_err(CliError::from)).collect()
}

fn read_requirements(input: &InputArgs) -> CliResult<Requirements> {
    if input.requirements == Path::new("-") {
        let text = std::io::read_to_string(std::io::stdin())
            .map_err(|source| CliError::Io { what: "module list from stdin", source })?;
        return Ok(Requirements::parse(&text)?);
    }
    Ok(Requirements::load(&input.requirements)?)
}

/// Fetch everything, reporting each failure. Fails if any module failed.
async fn fetch_all(fetcher: &Fetcher<ReqwestClient>, packages: &[PackageRef]) -> CliResult<Vec<FetchResult>> {
    let results = fetcher.fetch_all(packages).await;
    let total = results.len();

    let mut fetched = Vec::with_capacity(total);
    let mut failed = 0;
    for (package, result) in packages.iter().zip(results) {
        match result {
            Ok(result) => fetched.push(result),
            Err(e) => {
                failed += 1;
                eprintln!("{} {package}: {e}", style("failed").red().bold());
                if let Some(hint) = e.hint() {
                    eprintln!("  {} {hint}", style("Hint:").yellow());
                }
            }
        }
    }

    if failed > 0 {
        return Err(CliError::FetchFailed { failed, total });
    }
    Ok(fetched)
}

async fn run_jobs(fetcher: &Fetcher<ReqwestClient>, jobs: &[Job<'_>], manifest: &mut Manifest) -> CliResult<()> {
    let packages: Vec<PackageRef> = jobs.iter().map(|job| job.package.clone()).collect();
    let results = fetch_all(fetcher, &packages).await?;
    for (job, result) in jobs.iter().zip(&results) {
        job.record(manifest, result);
    }
    Ok(())
}
