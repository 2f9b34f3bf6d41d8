// src/main.rs

use aldev::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level, args.verbose) {
        eprintln!("aldev error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        logging::fatal(&err).await;
        std::process::exit(1);
    }
}
