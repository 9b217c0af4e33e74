use core_types::Millis;

/// Type and delete paces for the next action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pace {
    pub typing: Millis,
    pub deleting: Millis,
}

/// Deterministic jitter source for life-like pacing.
#[derive(Clone, Debug)]
pub struct Pacer {
    state: u64,
}

impl Pacer {
    pub fn new(seed: u64) -> Self {
        // xorshift64 never leaves zero.
        Self {
            state: seed.wrapping_add(1).max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.state = s;
        s
    }

    /// `value` itself, or uniformly within `value ± value / 2` when `life_like`.
    pub fn jitter(&mut self, value: Millis, life_like: bool) -> Millis {
        let range = value / 2;
        if !life_like || range == 0 {
            return value;
        }
        let low = value - range;
        let span = 2 * range + 1;
        low + self.next_u64() % span
    }

    pub fn pace(&mut self, speed: Millis, delete_speed: Millis, life_like: bool) -> Pace {
        Pace {
            typing: self.jitter(speed, life_like),
            deleting: self.jitter(delete_speed, life_like),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_life_like_the_speed_is_exact() {
        let mut pacer = Pacer::new(7);
        assert_eq!(pacer.pace(100, 33, false), Pace { typing: 100, deleting: 33 });
    }

    #[test]
    fn jitter_stays_within_half_the_value() {
        let mut pacer = Pacer::new(42);
        for _ in 0..1000 {
            let v = pacer.jitter(100, true);
            assert!((50..=150).contains(&v), "{v}");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Pacer::new(3);
        let mut b = Pacer::new(3);
        let xs: Vec<_> = (0..16).map(|_| a.jitter(200, true)).collect();
        let ys: Vec<_> = (0..16).map(|_| b.jitter(200, true)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().any(|&x| x != 200));
    }

    #[test]
    fn zero_and_one_never_jitter() {
        let mut pacer = Pacer::new(0);
        assert_eq!(pacer.jitter(0, true), 0);
        assert_eq!(pacer.jitter(1, true), 1);
    }
}
