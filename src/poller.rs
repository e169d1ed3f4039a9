use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::PollError;
use crate::format::NumberLocale;
use crate::pool::{AccountReader, BalanceSnapshot, PoolAccounts, PoolBalance, PoolSide, TokenAmount};

pub type UpdateCallback = Arc<dyn Fn(BalanceSnapshot) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(PollError) + Send + Sync>;

/// Liveness flag shared by a session's task and its handle.
///
/// Deliveries are serialized on `delivery`; `close` waits on it so that once
/// it returns no callback of this session can start. A `close` issued from
/// inside a callback (same thread as the delivery) skips the wait.
struct SessionGate {
    id: Uuid,
    live: AtomicBool,
    delivery: Mutex<()>,
    deliverer: Mutex<Option<ThreadId>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Clears the deliverer mark even if the callback panics.
struct DeliveryMark<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> DeliveryMark<'a> {
    fn set(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(slot) = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for DeliveryMark<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionGate {
    fn new() -> (Arc<Self>, watch::Receiver<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let gate = Arc::new(Self {
            id: Uuid::new_v4(),
            live: AtomicBool::new(true),
            delivery: Mutex::new(()),
            deliverer: Mutex::new(None),
            shutdown_tx,
        });
        (gate, shutdown_rx)
    }

    fn publish(&self, deliver: impl FnOnce()) -> Result<(), PollError> {
        let _delivery = lock(&self.delivery);
        if !self.live.load(Ordering::Acquire) {
            return Err(PollError::SessionDisposed(self.id));
        }
        let _mark = DeliveryMark::set(&self.deliverer);
        deliver();
        Ok(())
    }

    /// Returns true if this call was the one that closed the session.
    fn close(&self) -> bool {
        let was_live = self.live.swap(false, Ordering::AcqRel);
        self.shutdown_tx.send_replace(true);

        let reentrant = *lock(&self.deliverer) == Some(thread::current().id());
        if !reentrant {
            // Wait out a delivery already in progress on another thread
            drop(lock(&self.delivery));
        }
        was_live
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Handle to a running poll session. Dropping it stops the session.
pub struct PollHandle {
    gate: Arc<SessionGate>,
    accounts: PoolAccounts,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn session_id(&self) -> Uuid {
        self.gate.id
    }

    pub fn accounts(&self) -> &PoolAccounts {
        &self.accounts
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_live()
    }

    /// True once the background task has exited (it lingers while a
    /// pre-stop fetch is still outstanding).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the timer. Idempotent. An in-flight fetch is left to finish
    /// and its result dropped.
    pub fn stop(&self) {
        if self.gate.close() {
            info!("🛑 Poll session {} stopped", self.gate.id);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodically reads the three pool balances of a market.
#[derive(Clone)]
pub struct LivePoolBalancePoller {
    reader: Arc<dyn AccountReader>,
    period: Duration,
    locale: NumberLocale,
}

impl LivePoolBalancePoller {
    pub fn new(reader: Arc<dyn AccountReader>, period: Duration) -> Result<Self, PollError> {
        if period.is_zero() {
            return Err(PollError::InvalidPeriod(period.as_millis()));
        }
        Ok(Self {
            reader,
            period,
            locale: NumberLocale::default(),
        })
    }

    pub fn with_locale(mut self, locale: NumberLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a session: one cycle now, then one per period until stopped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<U, E>(&self, accounts: PoolAccounts, on_update: U, on_error: E) -> PollHandle
    where
        U: Fn(BalanceSnapshot) + Send + Sync + 'static,
        E: Fn(PollError) + Send + Sync + 'static,
    {
        self.spawn_session(accounts, Arc::new(on_update), Arc::new(on_error))
    }

    fn spawn_session(
        &self,
        accounts: PoolAccounts,
        on_update: UpdateCallback,
        on_error: ErrorCallback,
    ) -> PollHandle {
        let (gate, shutdown_rx) = SessionGate::new();
        info!(
            "📡 Poll session {} started every {:?} (YES {}, NO {}, LP {})",
            gate.id,
            self.period,
            accounts.side_a.truncated(8),
            accounts.side_b.truncated(8),
            accounts.lp_supply.truncated(8)
        );

        let session = Session {
            gate: gate.clone(),
            reader: self.reader.clone(),
            accounts: accounts.clone(),
            period: self.period,
            locale: self.locale,
            on_update,
            on_error,
        };
        let task = tokio::spawn(session.run(shutdown_rx));

        PollHandle {
            gate,
            accounts,
            task,
        }
    }
}

struct Session {
    gate: Arc<SessionGate>,
    reader: Arc<dyn AccountReader>,
    accounts: PoolAccounts,
    period: Duration,
    locale: NumberLocale,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
}

impl Session {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let started = Instant::now();
        let mut cycles: u64 = 0;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // Not raced against shutdown: a fetch already issued runs to completion
            let outcome = fetch_balances(self.reader.as_ref(), &self.accounts).await;
            cycles += 1;

            let published = match outcome {
                Ok([a, b, lp]) => {
                    let snapshot = self.snapshot(&a, &b, &lp);
                    self.gate.publish(|| (self.on_update)(snapshot))
                }
                Err(err) => {
                    warn!("⚠️ Poll session {} cycle {} failed: {}", self.gate.id, cycles, err);
                    self.gate.publish(|| (self.on_error)(err))
                }
            };
            if let Err(disposed) = published {
                debug!("{}", disposed);
                break;
            }

            // Next period boundary after now; boundaries missed by a slow cycle are skipped
            let elapsed = started.elapsed().as_nanos();
            let period = self.period.as_nanos();
            let offset = period.saturating_mul(elapsed / period + 1);
            let deadline = started + Duration::from_nanos(offset.min(u64::MAX as u128) as u64);

            tokio::select! {
                _ = sleep_until(deadline) => {}
                _ = shutdown_rx.changed() => break,
            }
        }

        debug!("Poll session {} exited after {} cycles", self.gate.id, cycles);
    }

    fn snapshot(&self, a: &TokenAmount, b: &TokenAmount, lp: &TokenAmount) -> BalanceSnapshot {
        BalanceSnapshot {
            session: self.gate.id,
            accounts: self.accounts.clone(),
            side_a: PoolBalance::new(a.ui_value(), self.locale),
            side_b: PoolBalance::new(b.ui_value(), self.locale),
            lp_supply: PoolBalance::new(lp.ui_value(), self.locale),
            fetched_at: Utc::now(),
        }
    }
}

async fn lookup(
    reader: &dyn AccountReader,
    accounts: &PoolAccounts,
    side: PoolSide,
) -> Result<TokenAmount, PollError> {
    let account = accounts.get(side);
    reader
        .get_token_account_balance(account)
        .await
        .map_err(|source| PollError::LookupFailure {
            side,
            account: account.clone(),
            source,
        })
}

/// Read all three balances concurrently. Any failure fails the whole set.
pub async fn fetch_balances(
    reader: &dyn AccountReader,
    accounts: &PoolAccounts,
) -> Result<[TokenAmount; 3], PollError> {
    let (a, b, lp) = tokio::try_join!(
        lookup(reader, accounts, PoolSide::A),
        lookup(reader, accounts, PoolSide::B),
        lookup(reader, accounts, PoolSide::Lp)
    )?;
    Ok([a, b, lp])
}

/// Keeps exactly one session alive for the pool currently on screen.
pub struct PoolWatcher {
    poller: LivePoolBalancePoller,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
    current: Option<PollHandle>,
}

impl PoolWatcher {
    pub fn new<U, E>(poller: LivePoolBalancePoller, on_update: U, on_error: E) -> Self
    where
        U: Fn(BalanceSnapshot) + Send + Sync + 'static,
        E: Fn(PollError) + Send + Sync + 'static,
    {
        Self {
            poller,
            on_update: Arc::new(on_update),
            on_error: Arc::new(on_error),
            current: None,
        }
    }

    /// Watch `accounts`. A running session for the same accounts is kept;
    /// otherwise the old session is stopped before the new one starts.
    /// Returns true if a new session was started.
    pub fn retarget(&mut self, accounts: PoolAccounts) -> bool {
        if let Some(current) = &self.current {
            if current.accounts() == &accounts && current.is_running() {
                return false;
            }
        }
        self.start_fresh(accounts);
        true
    }

    /// Restart on the same accounts, e.g. after a trade changed the pool.
    pub fn restart(&mut self) -> bool {
        match self.current.as_ref().map(|h| h.accounts().clone()) {
            Some(accounts) => {
                self.start_fresh(accounts);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop();
        }
    }

    pub fn current(&self) -> Option<&PollHandle> {
        self.current.as_ref()
    }

    fn start_fresh(&mut self, accounts: PoolAccounts) {
        self.stop();
        let handle = self.poller.spawn_session(
            accounts,
            self.on_update.clone(),
            self.on_error.clone(),
        );
        self.current = Some(handle);
    }
}
