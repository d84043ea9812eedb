//! Print road conditions as they arrive
//!
//! ```text
//! cargo run -p roadvision-connectors --example watch_feed -- ws://localhost:9001 processed_data_topic
//! ```

use std::time::Duration;

use roadvision_connectors::feed;
use roadvision_core::{constants::feed::DASHBOARD_HISTORY_LEN, FeedConfig, MeasurementKind};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "ws://localhost:9001".into());
    let topic = args.next().unwrap_or_else(|| "processed_data_topic".into());

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let handle = feed::open(FeedConfig::new(address, topic).capacity(DASHBOARD_HISTORY_LEN))?;

            handle.on_update(|snapshot| {
                let Some(latest) = snapshot.latest() else { return };
                print!("[{}] road {}", latest.timestamp(), latest.road_state());
                for kind in MeasurementKind::ALL {
                    let m = latest.measurement(kind);
                    match m.value {
                        Some(value) => print!(" | {} {value:.1}{} ({})", kind.name(), m.unit, m.status),
                        None => print!(" | {} n/a ({})", kind.name(), m.status),
                    }
                }
                println!(" ({} kept)", snapshot.len());
            })?;

            let mut status = tokio::time::interval(Duration::from_secs(10));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = status.tick() => {
                        let stats = handle.stats();
                        println!(
                            "state {} received {} dropped {} reconnects {}",
                            handle.state(),
                            stats.messages_received,
                            stats.messages_dropped,
                            stats.reconnections
                        );
                    }
                }
            }

            handle.shutdown().await;
            Ok::<_, Box<dyn std::error::Error>>(())
        })
        .await
}
