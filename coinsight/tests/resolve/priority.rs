use coinsight::{CircuitState, CoinsightError};

use crate::helpers::{coinsight, cool_off, mock};

#[tokio::test(start_paused = true)]
async fn healthy_then_failing_then_open() {
    let a = mock("A");
    let b = mock("B");
    let c = mock("C");
    b.down_for("dead", "DEAD").await;
    c.down_for("dead", "DEAD").await;
    // C is registered with the best static priority
    let cs = coinsight(&[(&c, 1), (&a, 2), (&b, 3)]);
    assert_eq!(cs.provider_order(), ["C", "A", "B"]);

    for round in 1..=5 {
        if round == 4 {
            // B now answers "not listed", which leaves its counters alone
            b.fail_fetch("DEAD", CoinsightError::identity_not_found("B", "dead"))
                .await;
        }
        let err = cs.resolve("dead", false).await.unwrap_err();
        assert!(matches!(err, CoinsightError::NoProviderAvailable { .. }));
        cool_off().await;
    }

    let health = cs.health_status();
    let by_name = |n: &str| health.iter().find(|h| h.provider == n).unwrap();
    assert_eq!(by_name("A").consecutive_failures, 0);
    assert_eq!(by_name("B").consecutive_failures, 3);
    assert!(matches!(by_name("C").circuit_state, CircuitState::Open { .. }));

    assert_eq!(cs.provider_order(), ["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn one_outage_demotes_below_next_priority() {
    let a = mock("A");
    let b = mock("B");
    a.down_for("dead", "DEAD").await;
    let cs = coinsight(&[(&a, 1), (&b, 2)]);

    let _ = cs.resolve("dead", false).await;
    assert_eq!(cs.provider_order(), ["B", "A"]);
}
