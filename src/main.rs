use std::path::PathBuf;

use anyhow::{Result, bail};
use snackbar::config::Config;
use snackbar::demos::{Demo, format_routes};
use snackbar::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();
    let list = args.contains("--list");
    let config_path: Option<PathBuf> = args.opt_value_from_str("--config")?;
    let route = args
        .finish()
        .into_iter()
        .next()
        .and_then(|arg| arg.into_string().ok());

    let config = Config::load_or_default(config_path.as_deref())?;
    init_logging(&config);

    let Some(route) = route.filter(|_| !list) else {
        println!("usage: snackbar [--config PATH] [--list] <demo>\n\ndemos:\n{}", format_routes());
        return Ok(());
    };
    let Some(demo) = Demo::from_route(&route) else {
        bail!("unknown demo '{route}'; run with --list to see the available demos");
    };
    demo.run(&config).await
}
