use rand::prelude::IndexedRandom;
use rand::Rng;
use std::time::Duration;

/// Short randomized pause between sequential detail fetches.
pub fn random_delay() {
    let delays = [1000, 1500, 2000];
    let delay = delays.choose(&mut rand::rng()).unwrap();
    std::thread::sleep(Duration::from_millis(*delay));
}

/// Longer human-like pause for paginated sites, uniform over the given
/// range in seconds.
pub fn human_delay(min_secs: f64, max_secs: f64) {
    let secs = rand::rng().random_range(min_secs..max_secs);
    std::thread::sleep(Duration::from_secs_f64(secs));
}
