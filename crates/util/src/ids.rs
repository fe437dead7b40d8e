use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Alphabet of push ids, in ascending ASCII order so that ids compare
/// chronologically as plain strings.
pub const PUSH_CHARS: &str = "-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const ENDPOINT_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
const ENDPOINT_NAME_LEN: usize = 12;
const PUSH_TIME_CHARS: usize = 8;
const PUSH_RAND_CHARS: usize = 12;

/// Generator for endpoint names and push ids.
///
/// Uses the xoshiro256** PRNG so a seeded generator yields the same sequence
/// on every run.
///
/// # Examples
///
/// ```
/// use mockbase_util::ids::IdGenerator;
///
/// let mut a = IdGenerator::new(Some(7));
/// let mut b = IdGenerator::new(Some(7));
/// assert_eq!(a.endpoint_name(), b.endpoint_name());
///
/// let first = a.push_id(1_000);
/// let second = a.push_id(1_000);
/// assert_eq!(first.len(), 20);
/// assert!(first < second);
/// ```
#[derive(Debug, Clone)]
pub struct IdGenerator {
    /// The seed used to initialize the PRNG.
    pub seed: u64,
    rng: Xoshiro256StarStar,
    last_push_time: Option<i64>,
    last_rand: [u8; PUSH_RAND_CHARS],
}

impl IdGenerator {
    /// Create a generator with an optional seed.
    ///
    /// If no seed is provided, one is drawn from `OsRng`.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| OsRng.next_u64());
        Self {
            seed,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            last_push_time: None,
            last_rand: [0; PUSH_RAND_CHARS],
        }
    }

    /// Generate a random lowercase alphanumeric endpoint name.
    pub fn endpoint_name(&mut self) -> String {
        let chars = ENDPOINT_CHARS.as_bytes();
        (0..ENDPOINT_NAME_LEN)
            .map(|_| chars[self.rng.gen_range(0..chars.len())] as char)
            .collect()
    }

    /// Generate a 20 character push id for the given time in milliseconds.
    ///
    /// The first 8 characters encode the time, the remaining 12 are random.
    /// Two ids generated for the same millisecond share the random suffix
    /// incremented by one, so ids from one generator are strictly increasing
    /// as long as time does not go backwards.
    pub fn push_id(&mut self, now_millis: i64) -> String {
        let chars = PUSH_CHARS.as_bytes();
        let base = chars.len() as i64;

        let mut time_part = [0u8; PUSH_TIME_CHARS];
        let mut t = now_millis.max(0);
        for slot in time_part.iter_mut().rev() {
            *slot = chars[(t % base) as usize];
            t /= base;
        }

        if self.last_push_time == Some(now_millis) {
            // carry the increment through trailing max digits
            let mut i = PUSH_RAND_CHARS;
            while i > 0 {
                i -= 1;
                if self.last_rand[i] as usize == chars.len() - 1 {
                    self.last_rand[i] = 0;
                } else {
                    self.last_rand[i] += 1;
                    break;
                }
            }
        } else {
            self.last_push_time = Some(now_millis);
            for slot in self.last_rand.iter_mut() {
                *slot = self.rng.gen_range(0..chars.len()) as u8;
            }
        }

        let mut id = String::with_capacity(PUSH_TIME_CHARS + PUSH_RAND_CHARS);
        id.extend(time_part.iter().map(|&b| b as char));
        id.extend(self.last_rand.iter().map(|&i| chars[i as usize] as char));
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}
