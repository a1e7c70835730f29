//! Fixed-rate hop loop

use super::{Decision, HopError, LocationPicker, collect, decide};
use crate::config::RotationConfig;
use crate::nordvpn::VpnControl;
use crate::probe::Reachability;
use std::future::Future;
use std::io;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Run one collect-decide-act pass
///
/// Used both for the startup pass and for every tick of the loop.
pub async fn run_cycle<C, R, P>(
    control: &C,
    probe: &R,
    config: &RotationConfig,
    picker: &mut P,
) -> Result<Decision, HopError>
where
    C: VpnControl,
    R: Reachability,
    P: LocationPicker,
{
    let snapshot = collect(control, probe).await?;
    let decision = decide(&snapshot, config, picker)?;

    match &decision {
        Decision::Rotate { target } => {
            info!(
                "Rotating ({}, uptime {:?}) to {}",
                snapshot.state.connectivity, snapshot.state.uptime, target
            );
            control.connect(target).await?;
            info!("Now connected to {}", target);
        }
        Decision::Stay { country, uptime } => {
            info!(
                "Already connected to {}, uptime {:?} (minimum {:?})",
                country.as_deref().unwrap_or("unknown location"),
                uptime,
                config.min_uptime()
            );
        }
    }

    Ok(decision)
}

/// Resolves on Ctrl+C
///
/// On Unix the SIGINT listener is installed when this is called rather than
/// on first poll.
fn interrupt() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let signal = {
        use tokio::signal::unix::{SignalKind, signal};
        let registered = signal(SignalKind::interrupt());
        async move {
            let mut stream = registered?;
            stream.recv().await;
            Ok::<(), io::Error>(())
        }
    };

    #[cfg(not(unix))]
    let signal = tokio::signal::ctrl_c();

    wait_for_interrupt(signal)
}

/// Complete when `signal` fires; never complete if it cannot be listened for
///
/// A failed listener must not read as a shutdown request, or the loop would
/// exit with success right after the startup cycle.
async fn wait_for_interrupt<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Interrupted, stopping"),
        Err(e) => {
            warn!("Cannot listen for Ctrl+C ({}), running until killed", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Drives [`run_cycle`] every hop interval
pub struct Hopper<C, R, P> {
    control: C,
    probe: R,
    config: RotationConfig,
    picker: P,
}

impl<C, R, P> Hopper<C, R, P>
where
    C: VpnControl,
    R: Reachability,
    P: LocationPicker,
{
    pub fn new(control: C, probe: R, config: RotationConfig, picker: P) -> Self {
        Self {
            control,
            probe,
            config,
            picker,
        }
    }

    /// Run forever, stopping cleanly on Ctrl+C between cycles
    ///
    /// The interrupt handler is registered before the startup cycle, so a
    /// Ctrl+C arriving mid-cycle is honored once that cycle finishes. A
    /// subprocess that hangs holds the cycle open; set `command_timeout_secs`
    /// to bound it.
    pub async fn run(&mut self) -> Result<(), HopError> {
        let shutdown = interrupt();
        self.run_until(shutdown).await
    }

    /// Run until `shutdown` completes or a cycle fails
    ///
    /// The config is validated before anything touches the VPN. One cycle
    /// runs immediately, then one per hop interval. A slow cycle delays the
    /// following tick rather than causing a burst, so cycles never overlap.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), HopError>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;

        info!(
            "Hopping every {:?}, minimum uptime {:?}",
            self.config.hop_interval(),
            self.config.min_uptime()
        );

        self.cycle().await?;

        let mut ticker = interval(self.config.hop_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the startup cycle covered it
        ticker.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(()),
                _ = ticker.tick() => {
                    self.cycle().await?;
                }
            }
        }
    }

    async fn cycle(&mut self) -> Result<Decision, HopError> {
        info!("Starting cycle");
        let decision =
            run_cycle(&self.control, &self.probe, &self.config, &mut self.picker).await?;
        info!("Cycle complete");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::hop::RandomPicker;
    use crate::hop::mock::{MockControl, MockProbe, SequencePicker};
    use std::time::Duration;

    const OLD_SESSION: &str = "Status: Connected\n\
                               Country: Germany\n\
                               City: Berlin\n\
                               Uptime: 2h 5m 10s";
    const YOUNG_SESSION: &str = "Status: Connected\n\
                                 Country: Germany\n\
                                 City: Berlin\n\
                                 Uptime: 5m 10s";

    fn config() -> RotationConfig {
        RotationConfig {
            min_uptime_secs: 600,
            hop_interval_secs: 3600,
        }
    }

    #[tokio::test]
    async fn test_cycle_rotates_old_session() {
        let control = MockControl::new(OLD_SESSION, &["Germany", "France"]);
        let probe = MockProbe::new(true);

        let decision = run_cycle(&control, &probe, &config(), &mut SequencePicker::new(&[1]))
            .await
            .unwrap();

        assert!(matches!(decision, Decision::Rotate { .. }));
        assert_eq!(*control.connects.borrow(), vec!["France".to_string()]);
    }

    #[tokio::test]
    async fn test_cycle_stays_on_young_session() {
        let control = MockControl::new(YOUNG_SESSION, &["Germany", "France"]);
        let probe = MockProbe::new(true);

        let decision = run_cycle(&control, &probe, &config(), &mut RandomPicker)
            .await
            .unwrap();

        match decision {
            Decision::Stay { country, uptime } => {
                assert_eq!(country.as_deref(), Some("Germany"));
                assert_eq!(uptime, Duration::from_secs(310));
            }
            other => panic!("expected Stay, got {:?}", other),
        }
        assert!(control.connects.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_connect_failure_is_fatal() {
        let mut control = MockControl::new("Status: Disconnected", &["Germany"]);
        control.fail_connect = true;

        let result = run_cycle(&control, &MockProbe::new(true), &config(), &mut RandomPicker).await;
        assert!(matches!(result, Err(HopError::Control(_))));
    }

    #[tokio::test]
    async fn test_cycle_broken_tunnel_does_not_connect() {
        let control = MockControl::new(OLD_SESSION, &["Germany"]);

        let result = run_cycle(&control, &MockProbe::new(false), &config(), &mut RandomPicker).await;
        assert!(matches!(result, Err(HopError::BrokenTunnel)));
        assert!(control.connects.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_reconnecting_is_fatal() {
        let control = MockControl::new("Status: Reconnecting", &["Germany"]);

        for reachable in [true, false] {
            let result =
                run_cycle(&control, &MockProbe::new(reachable), &config(), &mut RandomPicker)
                    .await;
            assert!(matches!(result, Err(HopError::Stuck)));
        }
    }

    #[tokio::test]
    async fn test_invalid_config_runs_no_cycle() {
        let control = MockControl::new(OLD_SESSION, &["Germany"]);
        let bad = RotationConfig {
            min_uptime_secs: 3600,
            hop_interval_secs: 3600,
        };
        let mut hopper = Hopper::new(control, MockProbe::new(true), bad, RandomPicker);

        let result = hopper.run_until(std::future::pending()).await;

        assert!(matches!(
            result,
            Err(HopError::Config(ConfigError::HopIntervalTooShort { .. }))
        ));
        assert_eq!(hopper.control.status_calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let control = MockControl::new(YOUNG_SESSION, &["Germany"]);
        let mut hopper = Hopper::new(control, MockProbe::new(true), config(), RandomPicker);

        // Startup cycle plus ticks at 1h and 2h
        let shutdown = tokio::time::sleep(Duration::from_secs(2 * 3600 + 60));
        hopper.run_until(shutdown).await.unwrap();

        assert_eq!(hopper.control.status_calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_tick() {
        let control = MockControl::new(YOUNG_SESSION, &["Germany"]);
        let mut hopper = Hopper::new(control, MockProbe::new(true), config(), RandomPicker);

        hopper
            .run_until(tokio::time::sleep(Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(hopper.control.status_calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_shutdown_stops_after_startup_cycle() {
        let control = MockControl::new(YOUNG_SESSION, &["Germany"]);
        let mut hopper = Hopper::new(control, MockProbe::new(true), config(), RandomPicker);

        hopper.run_until(std::future::ready(())).await.unwrap();

        assert_eq!(hopper.control.status_calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_interrupt_keeps_running() {
        let control = MockControl::new(YOUNG_SESSION, &["Germany"]);
        let mut hopper = Hopper::new(control, MockProbe::new(true), config(), RandomPicker);

        let shutdown = wait_for_interrupt(async {
            Err::<(), _>(io::Error::other("signal driver unavailable"))
        });
        let result = tokio::time::timeout(
            Duration::from_secs(2 * 3600 + 60),
            hopper.run_until(shutdown),
        )
        .await;

        // Still looping when the outer deadline hit
        assert!(result.is_err());
        assert_eq!(hopper.control.status_calls.get(), 3);
    }

    #[tokio::test]
    async fn test_interrupt_completes_on_signal() {
        wait_for_interrupt(async { Ok::<(), io::Error>(()) }).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_tick_stops_loop() {
        let mut control = MockControl::new("Status: Disconnected", &["Germany"]);
        control.fail_connect = true;
        let mut hopper = Hopper::new(control, MockProbe::new(true), config(), RandomPicker);

        let result = hopper.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(HopError::Control(_))));
        assert_eq!(hopper.control.status_calls.get(), 1);
    }
}
