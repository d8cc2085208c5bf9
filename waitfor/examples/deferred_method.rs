//! Deferred method: a speaker that only plays once it has buffered enough audio
//!
//! Run with: cargo run --example deferred_method

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use waitfor::prelude::*;

struct Speaker {
    buffered_ms: AtomicU32,
}

impl Speaker {
    fn is_buffered(&self) -> bool {
        self.buffered_ms.load(Ordering::SeqCst) >= 500
    }

    fn play(&self, track: &str) {
        println!(
            "Playing {} with {}ms buffered",
            track,
            self.buffered_ms.load(Ordering::SeqCst)
        );
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let play = DeferredMethod::new(
        Speaker::is_buffered,
        |speaker: &Speaker, (track,): (String,)| speaker.play(&track),
        WaitForOptions::new(Duration::from_secs(1)).with_frequency(Duration::from_millis(20)),
    )?;

    let speaker = Arc::new(Speaker {
        buffered_ms: AtomicU32::new(0),
    });

    let handle = play.call(&speaker, ("Blue in Green".to_string(),))?;
    println!("play() returned immediately");

    let filler = Arc::clone(&speaker);
    tokio::spawn(async move {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            filler.buffered_ms.fetch_add(100, Ordering::SeqCst);
        }
    });

    println!("Outcome: {:?}", handle.outcome().await?);
    Ok(())
}
