// src/main.rs

use taskwave::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("taskwave error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the run finished without failures or interruption.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    match run(args).await? {
        Some(summary) => {
            println!("{summary}");
            Ok(summary.is_clean())
        }
        None => Ok(true),
    }
}
