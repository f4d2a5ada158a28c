//! End-to-end chaos injection tests driven by process environment

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockpicker_chaos::{
    inject_chaos_if_enabled, ChaosDecision, ChaosError, ChaosInjector, FaultConfig, Sleeper,
};

const CHAOS_VARS: [&str; 3] = [
    "CHAOS_ENABLED",
    "CHAOS_INJECT_ERROR_RATE",
    "CHAOS_DELAY_SECONDS_MAX",
];

/// Sets chaos variables for the duration of a test, clearing them on drop
struct EnvGuard;

impl EnvGuard {
    fn set(pairs: &[(&str, &str)]) -> Self {
        for name in CHAOS_VARS {
            std::env::remove_var(name);
        }
        for (name, value) in pairs {
            std::env::set_var(name, value);
        }
        EnvGuard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in CHAOS_VARS {
            std::env::remove_var(name);
        }
    }
}

/// Records requested sleeps instead of waiting
#[derive(Clone, Default)]
struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// Counts every draw taken from the wrapped generator
struct CountingRng {
    inner: StdRng,
    draws: usize,
}

impl CountingRng {
    fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws += 1;
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws += 1;
        self.inner.try_fill_bytes(dest)
    }
}

#[tokio::test]
#[serial]
async fn test_force_error() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "1.0"),
        ("CHAOS_DELAY_SECONDS_MAX", "0"),
    ]);

    for _ in 0..20 {
        let err = inject_chaos_if_enabled().await.unwrap_err();
        assert!(err.is_simulated());
        assert!(err
            .to_string()
            .contains("Chaos engineering: simulated service failure"));
    }
}

#[tokio::test]
#[serial]
async fn test_force_error_never_sleeps() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "1.0"),
        ("CHAOS_DELAY_SECONDS_MAX", "10"),
    ]);

    let sleeper = RecordingSleeper::default();
    let injector = ChaosInjector::with_sleeper(sleeper.clone());

    let result = injector.inject().await;
    assert!(matches!(result, Err(ChaosError::SimulatedFailure(_))));
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn test_no_error_no_delay() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "0.0"),
        ("CHAOS_DELAY_SECONDS_MAX", "0"),
    ]);

    let sleeper = RecordingSleeper::default();
    let injector = ChaosInjector::with_sleeper(sleeper.clone());

    let decision = injector.inject().await.unwrap();
    assert_eq!(decision, ChaosDecision::Pass);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn test_delay_injection() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "0.0"),
        ("CHAOS_DELAY_SECONDS_MAX", "2"),
    ]);

    let sleeper = RecordingSleeper::default();
    let injector = ChaosInjector::with_sleeper(sleeper.clone());

    let decision = injector.inject().await.unwrap();

    let calls = sleeper.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0] <= Duration::from_secs(2));
    match decision {
        ChaosDecision::Delay { delay_seconds, .. } => {
            assert!((0.0..=2.0).contains(&delay_seconds));
            assert_eq!(calls[0], Duration::from_secs_f64(delay_seconds));
        }
        other => panic!("Expected Delay, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_chaos_disabled() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "false"),
        ("CHAOS_INJECT_ERROR_RATE", "1.0"),
        ("CHAOS_DELAY_SECONDS_MAX", "10"),
    ]);

    let sleeper = RecordingSleeper::default();
    let injector = ChaosInjector::with_sleeper(sleeper.clone());

    for _ in 0..20 {
        assert_eq!(injector.inject().await.unwrap(), ChaosDecision::Pass);
    }
    assert!(sleeper.calls().is_empty());
    assert!(inject_chaos_if_enabled().await.is_ok());
}

#[tokio::test]
async fn test_disabled_draws_no_randomness() {
    let config = FaultConfig {
        enabled: false,
        error_rate: 1.0,
        max_delay_seconds: 10,
    };
    let sleeper = RecordingSleeper::default();
    let injector = ChaosInjector::with_sleeper(sleeper.clone());
    let mut rng = CountingRng::new(11);

    let decision = injector.inject_with(&config, &mut rng).await.unwrap();

    assert_eq!(decision, ChaosDecision::Pass);
    assert_eq!(rng.draws, 0);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_enabled_draws_randomness() {
    let config = FaultConfig {
        enabled: true,
        error_rate: 0.0,
        max_delay_seconds: 0,
    };
    let injector = ChaosInjector::with_sleeper(RecordingSleeper::default());
    let mut rng = CountingRng::new(12);

    injector.inject_with(&config, &mut rng).await.unwrap();
    assert!(rng.draws > 0);
}

#[tokio::test]
async fn test_error_and_delay_are_exclusive() {
    let config = FaultConfig {
        enabled: true,
        error_rate: 0.3,
        max_delay_seconds: 4,
    };
    let mut rng = StdRng::seed_from_u64(21);

    for _ in 0..200 {
        let sleeper = RecordingSleeper::default();
        let injector = ChaosInjector::with_sleeper(sleeper.clone());

        match injector.inject_with(&config, &mut rng).await {
            Err(err) => {
                assert!(err.is_simulated());
                assert!(sleeper.calls().is_empty());
            }
            Ok(ChaosDecision::Delay { .. }) => assert_eq!(sleeper.calls().len(), 1),
            Ok(ChaosDecision::Pass) => panic!("Pass is impossible with a positive delay bound"),
            Ok(ChaosDecision::Fail { .. }) => panic!("Fail must surface as an error"),
        }
    }
}

#[test]
#[serial]
fn test_get_chaos_config_defaults() {
    let _env = EnvGuard::set(&[]);

    let config = FaultConfig::from_env().unwrap();
    assert!(!config.enabled);
    assert_eq!(config.error_rate, 0.1);
    assert_eq!(config.max_delay_seconds, 5);
}

#[test]
#[serial]
fn test_get_chaos_config_custom() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "0.25"),
        ("CHAOS_DELAY_SECONDS_MAX", "3"),
    ]);

    let config = FaultConfig::from_env().unwrap();
    assert!(config.enabled);
    assert_eq!(config.error_rate, 0.25);
    assert_eq!(config.max_delay_seconds, 3);
}

#[test]
#[serial]
fn test_config_is_read_fresh_each_call() {
    let _env = EnvGuard::set(&[("CHAOS_ENABLED", "true")]);
    assert!(FaultConfig::from_env().unwrap().enabled);

    std::env::set_var("CHAOS_ENABLED", "no");
    assert!(!FaultConfig::from_env().unwrap().enabled);
}

#[tokio::test]
#[serial]
async fn test_malformed_env_surfaces_config_error() {
    let _env = EnvGuard::set(&[
        ("CHAOS_ENABLED", "true"),
        ("CHAOS_INJECT_ERROR_RATE", "sometimes"),
    ]);

    let err = inject_chaos_if_enabled().await.unwrap_err();
    assert!(matches!(err, ChaosError::InvalidConfig { .. }));
    assert!(!err.is_simulated());
}

#[test]
fn test_config_serializes_snapshot() {
    let config = FaultConfig {
        enabled: true,
        error_rate: 0.25,
        max_delay_seconds: 3,
    };
    let json = serde_json::to_value(config).unwrap();
    assert_eq!(json["enabled"], true);
    assert_eq!(json["error_rate"], 0.25);
    assert_eq!(json["max_delay_seconds"], 3);
}
