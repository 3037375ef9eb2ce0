use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration;

/// Above this much remaining time the gate sleeps in coarse steps
pub const COARSE_THRESHOLD: Duration = Duration::from_millis(5000);

/// Sleep step while far from the release instant
pub const COARSE_STEP: Duration = Duration::from_millis(1000);

/// Sleep step once within [`COARSE_THRESHOLD`] of the release instant
pub const FINE_STEP: Duration = Duration::from_millis(50);

/// Source of the current wall-clock instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Next instant at which `release` occurs in `zone`, strictly after `now`.
///
/// Today's release (in the zone's calendar) is used when it is still ahead;
/// otherwise tomorrow's. A release time that falls in a daylight-saving gap is
/// moved forward past the gap.
pub fn next_release(now: DateTime<Utc>, zone: Tz, release: NaiveTime) -> DateTime<Utc> {
    let today = now.with_timezone(&zone).date_naive();
    let candidate = resolve_local(zone, today.and_time(release));
    if candidate > now {
        return candidate;
    }

    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    resolve_local(zone, tomorrow.and_time(release))
}

/// Weekday of `instant` in `zone`, 0 = Sunday ... 6 = Saturday
pub fn weekday_in(zone: Tz, instant: DateTime<Utc>) -> u8 {
    instant.with_timezone(&zone).weekday().num_days_from_sunday() as u8
}

/// Absolute instant of a zoned wall-clock time.
///
/// Ambiguous times (autumn fall-back) resolve to the earlier instant.
fn resolve_local(zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Spring-forward gap; no zone skips more than an hour
            let shifted = local + chrono::Duration::hours(1);
            zone.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}

/// Sleep until `clock` reports `target` or later.
///
/// Sleeps [`COARSE_STEP`] at a time while more than [`COARSE_THRESHOLD`]
/// remains, then [`FINE_STEP`] to keep the overshoot small without spinning.
pub async fn wait_until(clock: &dyn Clock, target: DateTime<Utc>) {
    loop {
        let now = clock.now();
        if now >= target {
            return;
        }

        let remaining = (target - now).to_std().unwrap_or_default();
        let step = if remaining > COARSE_THRESHOLD {
            COARSE_STEP
        } else {
            FINE_STEP
        };
        tokio::time::sleep(step).await;
    }
}

/// Blocks the booking flow until registration opens.
pub struct ReleaseGate<C: Clock = SystemClock> {
    zone: Tz,
    release: NaiveTime,
    clock: C,
}

impl ReleaseGate<SystemClock> {
    pub fn new(zone: Tz, release: NaiveTime) -> Self {
        Self::with_clock(zone, release, SystemClock)
    }
}

impl<C: Clock> ReleaseGate<C> {
    pub fn with_clock(zone: Tz, release: NaiveTime, clock: C) -> Self {
        Self {
            zone,
            release,
            clock,
        }
    }

    /// Release instant the gate would wait for if started now
    pub fn target(&self) -> DateTime<Utc> {
        next_release(self.clock.now(), self.zone, self.release)
    }

    /// Wait for the next release instant and return it
    pub async fn wait(&self) -> DateTime<Utc> {
        let target = self.target();
        self.wait_for(target).await;
        target
    }

    /// Wait for a release instant computed earlier with [`ReleaseGate::target`]
    pub async fn wait_for(&self, target: DateTime<Utc>) {
        let now = self.clock.now();

        tracing::info!("Waiting until {} {}...", self.release, self.zone);
        tracing::info!(
            "Current time ({}): {}",
            self.zone,
            now.with_timezone(&self.zone).format("%Y-%m-%d %H:%M:%S")
        );
        tracing::info!(
            "Target time ({}): {}",
            self.zone,
            target.with_timezone(&self.zone).format("%Y-%m-%d %H:%M:%S")
        );
        tracing::info!("Waiting {} seconds...", (target - now).num_seconds().max(0));

        wait_until(&self.clock, target).await;

        tracing::info!("{}! Starting booking process...", self.release);
    }
}

/// Wait for the next `release` in `zone` on the system clock
pub async fn await_release(zone: Tz, release: NaiveTime) -> DateTime<Utc> {
    ReleaseGate::new(zone, release).wait().await
}
