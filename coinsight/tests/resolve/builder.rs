use std::sync::Arc;
use std::time::Duration;

use coinsight::{Coinsight, CoinsightError, ProviderConfig};

use crate::helpers::{mock, pcfg};

fn invalid(err: &CoinsightError, needle: &str) -> bool {
    matches!(err, CoinsightError::InvalidArg(msg) if msg.contains(needle))
}

#[test]
fn no_providers_is_rejected() {
    let err = Coinsight::builder().build().err().unwrap();
    assert!(invalid(&err, "no providers"), "{err:?}");
}

#[test]
fn duplicate_names_are_rejected() {
    let a = mock("A");
    let again = mock("A");
    let err = Coinsight::builder()
        .with_provider(Arc::clone(&a.client), pcfg(1))
        .with_provider(Arc::clone(&again.client), pcfg(2))
        .build()
        .err()
        .unwrap();
    assert!(invalid(&err, "registered twice"), "{err:?}");
}

#[test]
fn zero_provider_limits_are_rejected() {
    let cases: [(ProviderConfig, &str); 3] = [
        (pcfg(1).with_rate_limit(5, Duration::ZERO), "window"),
        (pcfg(1).with_rate_limit(0, Duration::from_secs(60)), "max_requests"),
        (pcfg(1).with_timeout(Duration::ZERO), "timeout"),
    ];
    for (cfg, field) in cases {
        let a = mock("A");
        let err = Coinsight::builder()
            .with_provider(a.client, cfg)
            .build()
            .err()
            .unwrap();
        assert!(invalid(&err, field), "{field}: {err:?}");
    }
}

#[test]
fn zero_maintenance_interval_is_rejected() {
    let a = mock("A");
    let err = Coinsight::builder()
        .with_provider(a.client, pcfg(1))
        .sweep_interval(Duration::ZERO)
        .build()
        .err()
        .unwrap();
    assert!(invalid(&err, "sweep_interval"), "{err:?}");

    let a = mock("A");
    let err = Coinsight::builder()
        .with_provider(a.client, pcfg(1))
        .refresh_interval(Duration::ZERO)
        .build()
        .err()
        .unwrap();
    assert!(invalid(&err, "refresh_interval"), "{err:?}");
}

#[test]
fn popular_symbols_are_opt_in() {
    let a = mock("A");
    let cs = Coinsight::builder()
        .with_provider(a.client, pcfg(1))
        .build()
        .unwrap();
    assert!(cs.config().popular_symbols.is_empty());

    let b = mock("B");
    let cs = Coinsight::builder()
        .with_provider(b.client, pcfg(1))
        .popular_symbols(coinsight::POPULAR_SYMBOLS)
        .build()
        .unwrap();
    assert_eq!(cs.config().popular_symbols.len(), 16);
    assert_eq!(cs.config().popular_symbols[0], "btc");
}

#[test]
fn defaults_match_documented_values() {
    let a = mock("A");
    let cs = Coinsight::builder()
        .with_provider(a.client, pcfg(1))
        .build()
        .unwrap();
    let cfg = cs.config();
    assert_eq!(cfg.cache.ttl, Duration::from_secs(60));
    assert_eq!(cfg.cache.max_age, Duration::from_secs(30 * 60));
    assert_eq!(cfg.health_reset_interval, Duration::from_secs(3600));
    assert!(cfg.serve_stale);
    let h = &cs.health_status()[0];
    assert_eq!(h.max_requests, 30);
    assert_eq!(h.requests_in_window, 0);
}
