//! Canonical view of published container ports
//!
//! The runtime reports one row per bound address, so a port published on
//! both stacks shows up twice (`0.0.0.0` and `::`), and a port published on
//! a specific interface may also show up on the wildcard. [`dedupe`]
//! collapses those into one row per container and port pair.

use crate::models::{CanonicalPortBinding, RawPortBinding, WILDCARD_V4, WILDCARD_V6};
use std::collections::HashMap;

/// Identity of a canonical binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    container_name: String,
    public_port: u16,
    private_port: u16,
}

impl DedupKey {
    fn of(binding: &CanonicalPortBinding) -> Self {
        Self {
            container_name: binding.container_name.clone(),
            public_port: binding.public_port,
            private_port: binding.private_port,
        }
    }
}

fn is_wildcard(ip: &str) -> bool {
    ip == WILDCARD_V4
}

/// Whether `candidate` should replace `current` for the same key
fn prefer(candidate: &CanonicalPortBinding, current: &CanonicalPortBinding) -> bool {
    is_wildcard(&current.ip) && !is_wildcard(&candidate.ip)
}

/// Normalize a raw binding, or `None` if it never belongs in the output
fn canonicalize(raw: &RawPortBinding) -> Option<CanonicalPortBinding> {
    let public_port = raw.public_port.filter(|&p| p != 0)?;
    let ip = match raw.ip.as_deref() {
        None | Some("") => WILDCARD_V4,
        Some(WILDCARD_V6) => return None,
        Some(ip) => ip,
    };

    Some(CanonicalPortBinding {
        container_name: raw.container_name.clone(),
        container_id: raw.container_id.clone(),
        private_port: raw.private_port,
        public_port,
        protocol: raw.protocol.clone(),
        ip: ip.to_string(),
    })
}

/// Collapse raw bindings into one row per (container, public port, private port).
///
/// Unpublished ports and IPv6 wildcard rows are dropped. For each key a
/// specific address beats `0.0.0.0`; otherwise the first row seen is kept.
/// Output is sorted by public port, ties keeping first-seen order.
pub fn dedupe(bindings: &[RawPortBinding]) -> Vec<CanonicalPortBinding> {
    let mut slots: HashMap<DedupKey, usize> = HashMap::new();
    let mut kept: Vec<CanonicalPortBinding> = Vec::new();

    for binding in bindings.iter().filter_map(canonicalize) {
        match slots.get(&DedupKey::of(&binding)) {
            Some(&slot) => {
                if prefer(&binding, &kept[slot]) {
                    kept[slot] = binding;
                }
            }
            None => {
                slots.insert(DedupKey::of(&binding), kept.len());
                kept.push(binding);
            }
        }
    }

    kept.sort_by_key(|b| b.public_port);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, public: Option<u16>, private: u16, ip: Option<&str>) -> RawPortBinding {
        RawPortBinding {
            container_id: format!("{name}-id"),
            container_name: name.to_string(),
            private_port: private,
            public_port: public,
            protocol: "tcp".to_string(),
            ip: ip.map(str::to_string),
        }
    }

    #[test]
    fn test_specific_ip_beats_wildcard() {
        let out = dedupe(&[
            raw("nginx", Some(80), 80, Some("0.0.0.0")),
            raw("nginx", Some(80), 80, Some("10.0.0.5")),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ip, "10.0.0.5");
    }

    #[test]
    fn test_specific_ip_kept_when_seen_first() {
        let out = dedupe(&[
            raw("nginx", Some(80), 80, Some("10.0.0.5")),
            raw("nginx", Some(80), 80, Some("0.0.0.0")),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ip, "10.0.0.5");
    }

    #[test]
    fn test_first_specific_wins_between_specifics() {
        let out = dedupe(&[
            raw("nginx", Some(80), 80, Some("10.0.0.5")),
            raw("nginx", Some(80), 80, Some("192.168.1.2")),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ip, "10.0.0.5");
    }

    #[test]
    fn test_ipv6_wildcard_never_emitted() {
        let out = dedupe(&[
            raw("pihole", Some(53), 53, Some("::")),
            raw("nginx", Some(443), 443, Some("0.0.0.0")),
            raw("nginx", Some(443), 443, Some("::")),
        ]);

        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|b| b.ip != WILDCARD_V6));
        assert_eq!(out[0].container_name, "nginx");
    }

    #[test]
    fn test_unpublished_ports_dropped() {
        let out = dedupe(&[
            raw("db", None, 5432, None),
            raw("db", Some(0), 5433, Some("0.0.0.0")),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_ip_is_wildcard() {
        let out = dedupe(&[
            raw("portainer", Some(9000), 9000, None),
            raw("portainer", Some(9000), 9000, Some("")),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ip, "0.0.0.0");
    }

    #[test]
    fn test_key_includes_private_port_and_name() {
        let out = dedupe(&[
            raw("immich", Some(2283), 3001, Some("0.0.0.0")),
            raw("immich", Some(2283), 2283, Some("0.0.0.0")),
            raw("other", Some(2283), 3001, Some("0.0.0.0")),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_sorted_by_public_port_and_stable() {
        let out = dedupe(&[
            raw("nginx", Some(443), 443, None),
            raw("b", Some(80), 8080, None),
            raw("pihole", Some(53), 53, None),
            raw("a", Some(80), 80, None),
        ]);

        let ports: Vec<u16> = out.iter().map(|b| b.public_port).collect();
        assert_eq!(ports, vec![53, 80, 80, 443]);
        assert!(ports.windows(2).all(|w| w[0] <= w[1]));
        // Ties keep first-seen order
        assert_eq!(out[1].container_name, "b");
        assert_eq!(out[2].container_name, "a");
    }

    /// Deterministic xorshift so generated mixes are reproducible
    struct Mixer(u64);

    impl Mixer {
        fn next(&mut self) -> usize {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0 as usize
        }

        fn pick<T: Copy>(&mut self, items: &[T]) -> T {
            items[self.next() % items.len()]
        }

        fn shuffle<T>(&mut self, items: &mut [T]) {
            for i in (1..items.len()).rev() {
                let j = self.next() % (i + 1);
                items.swap(i, j);
            }
        }
    }

    /// Small pools so duplicate keys and mixed wildcards are common
    fn generated_mix(seed: u64) -> Vec<RawPortBinding> {
        let mut mixer = Mixer(seed);
        let names = ["nginx", "pihole", "immich"];
        let publics = [None, Some(0), Some(53), Some(80), Some(443), Some(8080)];
        let privates = [53, 80, 443];
        let ips = [
            None,
            Some(""),
            Some("::"),
            Some("0.0.0.0"),
            Some("10.0.0.5"),
            Some("192.168.1.2"),
        ];

        let len = 5 + mixer.next() % 30;
        let mut input: Vec<RawPortBinding> = (0..len)
            .map(|_| {
                raw(
                    mixer.pick(&names),
                    mixer.pick(&publics),
                    mixer.pick(&privates),
                    mixer.pick(&ips),
                )
            })
            .collect();
        mixer.shuffle(&mut input);
        input
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let input = vec![
            raw("nginx", Some(443), 443, Some("::")),
            raw("nginx", Some(443), 443, Some("0.0.0.0")),
            raw("nginx", Some(80), 80, Some("0.0.0.0")),
            raw("nginx", Some(80), 80, Some("10.0.0.5")),
            raw("pihole", Some(53), 53, None),
            raw("db", None, 5432, None),
        ];

        let once = dedupe(&input);
        let again: Vec<RawPortBinding> = once.iter().cloned().map(Into::into).collect();
        assert_eq!(dedupe(&again), once);
    }

    #[test]
    fn test_generated_mixes_hold_dedupe_properties() {
        for seed in 1..=200u64 {
            let input = generated_mix(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let once = dedupe(&input);

            let again: Vec<RawPortBinding> = once.iter().cloned().map(Into::into).collect();
            assert_eq!(dedupe(&again), once, "not idempotent for seed {seed}");

            assert!(
                once.windows(2).all(|w| w[0].public_port <= w[1].public_port),
                "unsorted output for seed {seed}"
            );
            assert!(once.iter().all(|b| b.ip != "::" && !b.ip.is_empty()));
            assert!(once.iter().all(|b| b.public_port != 0));

            let mut keys: Vec<_> = once
                .iter()
                .map(|b| (b.container_name.clone(), b.public_port, b.private_port))
                .collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), total, "duplicate key for seed {seed}");

            // A key that had a specific address in the input keeps one
            for binding in &once {
                let had_specific = input.iter().any(|r| {
                    r.container_name == binding.container_name
                        && r.public_port == Some(binding.public_port)
                        && r.private_port == binding.private_port
                        && matches!(r.ip.as_deref(), Some(ip) if ip != "0.0.0.0" && ip != "::" && !ip.is_empty())
                });
                assert_eq!(had_specific, binding.ip != "0.0.0.0", "seed {seed}");
            }
        }
    }

    #[test]
    fn test_same_input_same_output() {
        let input = vec![
            raw("x", Some(9), 9, Some("0.0.0.0")),
            raw("y", Some(9), 9, Some("1.2.3.4")),
            raw("x", Some(9), 9, Some("5.6.7.8")),
        ];
        assert_eq!(dedupe(&input), dedupe(&input));
    }
}
