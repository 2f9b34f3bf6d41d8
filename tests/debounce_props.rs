use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use aldev::watch::{DebounceCache, DEBOUNCE_TTL};

// Reference model: an event is kept when no kept event of the same key
// happened less than a TTL before it.
fn expected_kept(offsets_ms: &[u64], ttl_ms: u64) -> usize {
    let mut last_kept: Option<u64> = None;
    let mut kept = 0;
    for &t in offsets_ms {
        if last_kept.is_none_or(|last| t - last >= ttl_ms) {
            last_kept = Some(t);
            kept += 1;
        }
    }
    kept
}

fn sorted_offsets() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(0u64..20_000, 1..40).prop_map(|mut v| {
        v.sort_unstable();
        v
    })
}

proptest! {
    #[test]
    fn one_key_follows_the_reference_model(offsets in sorted_offsets()) {
        let base = Instant::now();
        let mut cache = DebounceCache::new(DEBOUNCE_TTL, Duration::from_secs(5));

        let kept = offsets
            .iter()
            .filter(|&&t| cache.check_and_insert("Modify: /cfg/app.yaml", base + Duration::from_millis(t)))
            .count();

        prop_assert_eq!(kept, expected_kept(&offsets, DEBOUNCE_TTL.as_millis() as u64));
    }

    #[test]
    fn a_burst_inside_the_window_is_kept_once(burst in proptest::collection::vec(0u64..2_999, 1..30)) {
        let base = Instant::now();
        let mut cache = DebounceCache::default();
        let mut burst = burst;
        burst.sort_unstable();

        let kept = burst
            .iter()
            .filter(|&&t| cache.check_and_insert("k", base + Duration::from_millis(t)))
            .count();

        prop_assert_eq!(kept, 1);
    }

    #[test]
    fn keys_never_debounce_each_other(
        a in sorted_offsets(),
        b in sorted_offsets(),
    ) {
        let base = Instant::now();
        let mut cache = DebounceCache::default();

        // Interleave both streams in time order.
        let mut events: Vec<(u64, &str)> = a.iter().map(|&t| (t, "a"))
            .chain(b.iter().map(|&t| (t, "b")))
            .collect();
        events.sort();

        let mut kept_a = 0;
        let mut kept_b = 0;
        for (t, key) in events {
            if cache.check_and_insert(key, base + Duration::from_millis(t)) {
                if key == "a" { kept_a += 1 } else { kept_b += 1 }
            }
        }

        let ttl = DEBOUNCE_TTL.as_millis() as u64;
        prop_assert_eq!(kept_a, expected_kept(&a, ttl));
        prop_assert_eq!(kept_b, expected_kept(&b, ttl));
    }
}
