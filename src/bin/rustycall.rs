//! The RustyCall client: loads the configuration, starts the logger and
//! opens the call window.

use std::{env, sync::Arc};

use rustycall::{
    app::CallApp,
    client::build_call_machine,
    config::{CallConfig, Config},
    log::{LogSink, logger::Logger},
};

fn main() -> eframe::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = match args.get(1) {
        Some(path) => Config::load(path),
        None => Config::load("client_rustycall.conf"),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error loading config: {e}. Using defaults.");
        Config::empty()
    });

    let logger = Logger::start(&config, 4096, 256, 10);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());
    let call_config = CallConfig::from_config(&config);

    let machine = match build_call_machine(&call_config, sink) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Could not set up signaling ({}): {e}", call_config.signaling);
            std::process::exit(1);
        }
    };

    eframe::run_native(
        "RustyCall",
        eframe::NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(CallApp::new(cc, machine, Some(logger))))),
    )
}
