use lucky_sha::{cli, config, telemetry};

fn main() {
    let code = run();
    std::process::exit(code);
}

fn run() -> i32 {
    let cli = cli::parse_from(std::env::args_os());
    let cfg = load_config();

    let _telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        cli.quiet,
        cfg.logging.clone(),
    ));

    match cli::run(cli, cfg) {
        Ok(()) => 0,
        Err(e) => {
            for line in cli::error_lines(&e) {
                tracing::error!("{line}");
            }
            cli::exit_code(&e)
        }
    }
}

fn load_config() -> config::Config {
    match config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}
