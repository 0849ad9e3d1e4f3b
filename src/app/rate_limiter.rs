use crate::utils::time_utils::current_timestamp;

/**
 * Just count the amount of times sensible endpoints are
 * being called per unit of time, supposed to block them
 * entirely for a specific "block time" when that happens.
 * Used for the login form.
 */
pub struct BasicRateLimiter {
  counter: u32,
  last_update: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32
  ) -> Self {
    Self {
      counter: 0,
      last_update: current_timestamp(),
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  pub fn is_expired(&self, now: i64) -> bool {
    // If currently locked, check if past block_duration.
    // Check if past max_request_time otherwise.
    if self.is_locked() {
      now - self.last_update >= self.block_duration.into()
    } else {
      now - self.last_update >= self.max_requests_time.into()
    }
  }

  // Counts one request, returns true if the caller
  // should be turned away.
  pub fn update(&mut self, now: i64) -> bool {
    if self.is_expired(now) {
      // Reset, and this request is the first of
      // the new window:
      self.counter = 1;
      self.last_update = now;
      self.is_limited = false;
    } else if !self.is_limited {
      self.counter += 1;
      // Are we above the rate limit?
      if self.counter > self.max_requests {
        self.is_limited = true;
        self.last_update = now;
      }
    }
    self.is_limited
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blocks_after_max_requests() {
    let mut rl = BasicRateLimiter::new(3, 60, 300);
    let now = rl.last_update;
    assert!(!rl.update(now));
    assert!(!rl.update(now));
    assert!(!rl.update(now));
    assert!(rl.update(now + 1));
    assert!(rl.is_locked());
    // Still blocked before the block duration:
    assert!(rl.update(now + 200));
  }

  #[test]
  fn block_expires() {
    let mut rl = BasicRateLimiter::new(1, 60, 300);
    let now = rl.last_update;
    rl.update(now);
    assert!(rl.update(now));
    assert!(!rl.update(now + 300));
    assert!(!rl.is_locked());
  }

  #[test]
  fn window_resets_the_counter() {
    let mut rl = BasicRateLimiter::new(2, 60, 300);
    let now = rl.last_update;
    rl.update(now);
    rl.update(now);
    assert!(!rl.update(now + 60));
    assert!(!rl.update(now + 61));
  }
}
