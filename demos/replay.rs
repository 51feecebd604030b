use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use clap_stdin::FileOrStdin;
use serde::Deserialize;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{Instant, sleep_until};

use konke_quirks::catalog::Catalog;
use konke_quirks::cluster::AttributeEvent;
use konke_quirks::config;
use konke_quirks::device::QuirkDevice;
use konke_quirks::error::QuirkError;
use konke_quirks::signature::DiscoveredDevice;
use zcl::attr::{ZclAttr, ZclAttrValue};

/// One input to the quirked device, at a point in (virtual) time
#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Step {
    /// Raw zcl payload, header included
    Zcl {
        at: f64,
        endpoint: u8,
        cluster: u16,
        #[serde(with = "hex::serde")]
        data: Vec<u8>,
    },
    /// Already decoded numeric attribute report
    Report {
        at: f64,
        endpoint: u8,
        cluster: u16,
        attribute: u16,
        value: u32,
    },
}

impl Step {
    const fn at(&self) -> f64 {
        match self {
            Self::Zcl { at, .. } | Self::Report { at, .. } => *at,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ReplayError {
    #[error(transparent)]
    QuirkError(#[from] QuirkError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeYaml(#[from] serde_yml::Error),

    #[error("Invalid scenario time {0}: must be finite and not negative")]
    InvalidTime(f64),
}

type ReplayResult<T> = Result<T, ReplayError>;

/// Scenario seconds as a clock offset
fn offset(secs: f64) -> ReplayResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| ReplayError::InvalidTime(secs))
}

#[derive(Deserialize, Debug)]
struct Scenario {
    device: DiscoveredDevice,
    #[serde(default)]
    steps: Vec<Step>,
    /// Seconds to keep running after the last step, so pending resets fire
    #[serde(default)]
    linger: f64,
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Scenario file (yaml)
    #[arg(name = "scenario")]
    scenario: FileOrStdin,

    /// Quirk configuration file (yaml)
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,
}

fn drain(dev: &QuirkDevice, rx: &mut Receiver<AttributeEvent>, start: Instant) {
    loop {
        match rx.try_recv() {
            Ok(evt) => log::info!(
                "t={:>7.1}s [{}] ep {} / {:04x}: {:04x} = {:?}",
                start.elapsed().as_secs_f64(),
                dev.quirk(),
                evt.endpoint,
                evt.cluster,
                evt.attr.key,
                evt.attr.value
            ),
            Err(TryRecvError::Lagged(n)) => log::warn!("Missed {n} attribute events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

async fn replay(scenario: Scenario, conf: &config::QuirkConfig) -> ReplayResult<()> {
    let Some(dev) = Catalog::default().instantiate(&scenario.device, conf)? else {
        log::warn!(
            "No quirk matches [{}] [{}], nothing to replay",
            scenario.device.manufacturer,
            scenario.device.model
        );
        return Ok(());
    };

    let linger = offset(scenario.linger)?;
    for step in &scenario.steps {
        offset(step.at())?;
    }

    let mut rx = dev.subscribe();
    let start = Instant::now();
    let mut last = Duration::ZERO;

    for step in scenario.steps {
        let at = step.at();
        let due = offset(at)?;
        sleep_until(start + due).await;
        drain(&dev, &mut rx, start);
        last = last.max(due);

        let res = match step {
            Step::Zcl {
                endpoint,
                cluster,
                data,
                ..
            } => dev.handle_zcl(endpoint, cluster, &data),
            Step::Report {
                endpoint,
                cluster,
                attribute,
                value,
                ..
            } => dev.update_attribute(
                endpoint,
                cluster,
                ZclAttr::new(attribute, ZclAttrValue::U32(value)),
            ),
        };

        if let Err(err) = res {
            log::error!("t={at:>7.1}s step failed: {err}");
        }
        drain(&dev, &mut rx, start);
    }

    sleep_until(start + last.saturating_add(linger)).await;
    drain(&dev, &mut rx, start);

    Ok(())
}

fn main() -> ReplayResult<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let conf = match &args.config {
        Some(path) => config::parse(path)?,
        None => config::QuirkConfig::default(),
    };

    let scenario: Scenario = serde_yml::from_reader(
        args.scenario
            .into_reader()
            .map_err(std::io::Error::other)?,
    )?;

    // virtual time: timers fire instantly, in order
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()?;

    rt.block_on(replay(scenario, &conf))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use konke_quirks::config::QuirkConfig;

    use crate::{ReplayError, Scenario, offset, replay};

    const DEVICE: &str = "
device:
  manufacturer: Konke
  model: 3AFE28010402000D
  endpoints:
    1:
      profile_id: 260
      device_type: 1026
      input_clusters: [0, 1, 3, 1280]
      output_clusters: [3]
";

    fn scenario(rest: &str) -> Scenario {
        serde_yml::from_str(&format!("{DEVICE}{rest}")).unwrap()
    }

    #[test]
    fn offsets() {
        assert_eq!(offset(0.0).unwrap(), Duration::ZERO);
        assert_eq!(offset(1.5).unwrap(), Duration::from_millis(1500));

        for bad in [f64::INFINITY, f64::NAN, -1.0, 1e30] {
            assert!(matches!(offset(bad), Err(ReplayError::InvalidTime(_))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn infinite_times_are_rejected() {
        let conf = QuirkConfig::default();

        let res = replay(scenario("linger: .inf\n"), &conf).await;
        assert!(matches!(res, Err(ReplayError::InvalidTime(_))));

        let steps = "steps:\n  - { kind: report, at: .inf, endpoint: 1, cluster: 1, attribute: 32, value: 30 }\n";
        let res = replay(scenario(steps), &conf).await;
        assert!(matches!(res, Err(ReplayError::InvalidTime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn replays_finite_scenario() {
        let steps = "steps:\n  - { kind: zcl, at: 1, endpoint: 1, cluster: 1280, data: \"191000010000010000\" }\nlinger: 45\n";
        replay(scenario(steps), &QuirkConfig::default())
            .await
            .unwrap();
    }
}
