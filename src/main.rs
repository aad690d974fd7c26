use anyhow::{Context, Result, anyhow};
use log::debug;

use pn_complement::analysis::{Complement, ReachabilityGraph, UpwardClosure};
use pn_complement::config::AnalysisConfig;
use pn_complement::net::io::NetDescription;
use pn_complement::options::Options;
use pn_complement::report::ComplementReport;

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("PN_FLAGS is not a valid argument list")?;
    flags.extend(std::env::args().skip(1));

    let options = match Options::parse_from_args(&flags) {
        Ok(options) => options,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(err) => return Err(anyhow!("{err}")),
        },
    };
    debug!("PN options: {:?}", options);

    let mut config = AnalysisConfig::load_from_file(&options.config)?;
    if let Some(limit) = options.state_limit {
        config.state_limit = Some(limit);
    }
    debug!("analysis config: {:?}", config);

    let problem = NetDescription::load(&options.net)
        .with_context(|| format!("Failed to read net description: {:?}", options.net))?
        .into_problem()
        .with_context(|| format!("Invalid net description: {:?}", options.net))?;
    let forbidden = UpwardClosure::new(problem.forbidden);

    if let Some(path) = &options.net_dot {
        problem
            .net
            .write_dot(path)
            .with_context(|| format!("Failed to write net DOT file: {:?}", path))?;
    }

    let graph =
        ReachabilityGraph::explore_with(&problem.net, &problem.initial, &config.explore_config())
            .context("Reachability analysis failed")?;
    if let Some(path) = &options.dot {
        graph
            .write_dot(&problem.net, path)
            .with_context(|| format!("Failed to write reachability DOT file: {:?}", path))?;
    }

    let complement = Complement::from_graph(&problem.net, &graph, &forbidden)
        .context("Complementation failed")?;
    let report = ComplementReport::new(&complement, &graph, config.include_zero_tokens);

    if let Some(path) = &options.output {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        log::info!("report written to {:?}", path);
    }
    if !options.quiet {
        print!("{report}");
    }

    Ok(())
}
