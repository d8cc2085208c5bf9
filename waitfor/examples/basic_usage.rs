//! Basic usage: defer a greeting until a simulated login completes
//!
//! Run with: WAITFOR_LOG_MODE=debug cargo run --example basic_usage

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use waitfor::logging;
use waitfor::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let logged_in = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&logged_in);

    let welcome = Poller::create(
        move || flag.load(Ordering::SeqCst),
        |(greeting, user): (&'static str, &'static str)| println!("{} {}!", greeting, user),
        WaitForOptions::new(Duration::from_secs(2)).with_frequency(Duration::from_millis(50)),
    )?;

    let handle = welcome(("Welcome", "Ben"))?;
    println!("Waiting for login...");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        logged_in.store(true, Ordering::SeqCst);
    });

    match handle.outcome().await {
        Ok(outcome) => println!("Finished: {:?}", outcome),
        Err(e) => eprintln!("Gave up: {}", e),
    }

    // A resolver that never passes
    let never = Poller::new(
        || false,
        |_: ()| {
            unreachable!("resolver never passes");
        },
        WaitForOptions::new(Duration::from_millis(200)),
    )?;

    if let Err(e) = never.fire(())?.outcome().await {
        println!("Expected failure: {}", e);
    }

    Ok(())
}
