//! Check command - validate configuration and print effective settings

use std::path::Path;

use anyhow::Result;
use eventlog_config::Config;
use eventlog_protocol::SiteId;

/// Run the check command
///
/// The configuration was already parsed and validated on load; this prints
/// what the pipeline will use.
pub fn run(config: &Config, path: Option<&Path>) -> Result<()> {
    println!("{}", render(config, path));
    Ok(())
}

fn render(config: &Config, path: Option<&Path>) -> String {
    let source = path.map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
    let log = &config.event_log;
    let queue = &log.queue;

    let mut out = vec![
        format!("config:             {source} (ok)"),
        format!("machine name:       {}", config.global.machine_name),
        format!("logging enabled:    {}", log.enabled),
        format!("log size:           {}", log.log_size),
        format!("keep percent:       {}", log.keep_percent),
        format!("max delete per run: {}", log.max_delete_per_run),
        format!(
            "queue:              capacity={} retry={:?} unavailable={:?} max_retained={}",
            queue.capacity, queue.retry_interval, queue.unavailable, queue.max_retained
        ),
        format!("sinks:              {}", config.enabled_sinks().join(", ")),
    ];

    for site in &config.sites {
        let id = SiteId::new(site.id);
        out.push(format!(
            "{id} ({}): log_size={} keep_percent={}",
            site.name.as_deref().unwrap_or("unnamed"),
            config.log_size(id),
            config.keep_percent(id)
        ));
    }
    out.join("\n")
}
