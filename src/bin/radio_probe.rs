use std::env;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use airsentry::capture::clock::MonotonicClock;
use airsentry::capture::manager::ModeCoordinator;
use airsentry::models::config::AppConfig;
use airsentry::models::state::RadioMode;
use airsentry::radio::{SimulatedRadio, TrafficProfile};

/// Walks the simulated radio through every mode and prints what each produced
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Radio Probe");
    println!("This exercises every radio mode against the simulated driver");

    let dwell = env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(2));
    println!("Dwell time per mode: {:?}", dwell);

    let clock = MonotonicClock::new();
    let profile = TrafficProfile {
        deauth_burst_every_ms: dwell.as_millis() as u64 / 2,
        ..TrafficProfile::default()
    };
    let radio = Arc::new(SimulatedRadio::new(clock, profile));
    let config = AppConfig {
        scan_interval_ms: 500,
        ..AppConfig::default()
    };
    let mut coordinator = ModeCoordinator::with_clock(config, radio.clone(), clock);
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    println!("\nScanning...");
    coordinator.start_mode(RadioMode::Scanning).await?;
    tokio::time::sleep(dwell).await;
    for network in coordinator.get_networks() {
        println!(
            "  {:<24} {} ch {:>2} {:>4} dBm {:?}",
            network.display_name(),
            network.bssid,
            network.channel,
            network.rssi,
            network.encryption
        );
    }

    println!("\nSniffing on channel {}...", coordinator.status().channel);
    coordinator.start_mode(RadioMode::Sniffing).await?;
    tokio::time::sleep(dwell).await;
    let signal = coordinator.get_signal_statistics();
    println!(
        "  packets={} mgmt={} data={} ctrl={} deauth={} rssi={} dBm",
        signal.packet_count,
        signal.mgmt_count,
        signal.data_count,
        signal.ctrl_count,
        signal.deauth_count,
        signal.rssi
    );
    println!("  history: {:?}", coordinator.get_signal_history(10));

    println!("\nDetecting deauth attacks...");
    coordinator.start_mode(RadioMode::DetectingAttack).await?;
    tokio::time::sleep(dwell).await;
    let deauth = coordinator.get_deauth_statistics();
    println!(
        "  total={} broadcast={} suspicious={}",
        deauth.total_deauths, deauth.broadcast_deauths, deauth.suspicious_count
    );
    if deauth.attack_detected {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stdout, "  ATTACK DETECTED")?;
    } else {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "  no attack")?;
    }
    stdout.reset()?;
    match deauth.suspicious_ap {
        Some(ap) => writeln!(stdout, " (suspicious source {})", ap)?,
        None => writeln!(stdout)?,
    }

    println!("\nSpamming beacons...");
    coordinator.start_mode(RadioMode::Spamming).await?;
    tokio::time::sleep(dwell).await;
    println!("  transmitted={}", coordinator.get_signal_statistics().transmitted);

    coordinator.stop_all().await;
    let pipeline = coordinator.get_pipeline_counters();
    println!(
        "\nDone. processed={} dropped={} skipped={} radio transmitted={}",
        pipeline.processed_events,
        pipeline.dropped_events,
        pipeline.skipped_updates,
        radio.transmitted()
    );

    Ok(())
}
