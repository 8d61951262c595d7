//! Push ids in the realtime database format: 8 characters of millisecond
//! timestamp followed by 12 random characters, drawn from an alphabet whose
//! ASCII order matches its value order. Ids therefore sort lexicographically in
//! creation order.

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_timestamp: u64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_id(now)
    }

    /// Ids generated within the same millisecond (or after the clock moved
    /// backwards) reuse the previous timestamp and increment the random part.
    pub fn next_id(&mut self, timestamp_millis: u64) -> String {
        if timestamp_millis <= self.last_timestamp && self.last_timestamp != 0 {
            self.increment_random();
        } else {
            let mut rng = rand::thread_rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
            self.last_timestamp = timestamp_millis;
        }

        let mut id = Vec::with_capacity(20);
        let mut remaining = self.last_timestamp;
        let mut time_chars = [0u8; 8];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        id.extend_from_slice(&time_chars);
        id.extend(self.last_random.iter().map(|&n| PUSH_CHARS[n as usize]));

        String::from_utf8_lossy(&id).into_owned()
    }

    fn increment_random(&mut self) {
        for slot in self.last_random.iter_mut().rev() {
            if *slot == 63 {
                *slot = 0;
            } else {
                *slot += 1;
                return;
            }
        }
    }
}
