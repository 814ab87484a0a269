use std::{
    sync::Arc,
    time::Duration,
};
use futures::{
    select_biased,
    channel::{mpsc, oneshot},
    future::{BoxFuture, FutureExt},
    stream::{
        FuturesUnordered,
        StreamExt,
    },
};
use log::{
    debug, info
};
use tokio::{
    sync::watch,
    task::{self, JoinError, JoinHandle},
    time::{interval, MissedTickBehavior},
};
use tokio_stream::wrappers::IntervalStream;

use crate::{
    acquisition::CycleId,
    engine::{
        Command, Engine, ViewSnapshot
    },
    error::SourceError,
    push::Subscription,
    record::EvidenceRecord,
    source::LogSource,
};

type Fetch = BoxFuture<'static, (CycleId, Result<Vec<EvidenceRecord>, SourceError>)>;

/// Control side of a running engine.
///
/// Dropping the handle stops the engine just like [`EngineHandle::shutdown`],
/// minus getting the engine back.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,

    snapshots: watch::Receiver<ViewSnapshot>,

    shutdown: oneshot::Sender<()>,

    task: JoinHandle<Engine>,
}

impl EngineHandle {
    pub fn search(&self, term: impl Into<String>) {
        self.send(Command::Search(term.into()));
    }

    pub fn toggle_sort(&self) {
        self.send(Command::ToggleSort);
    }

    pub fn go_to_page(&self, page: usize) {
        self.send(Command::GoToPage(page));
    }

    pub fn send(&self, command: Command) {
        if let Err(e) = self.commands.unbounded_send(command) {
            debug!("Engine is stopped, dropped `{:?}`.", e.into_inner());
        }
    }

    pub fn current(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.clone()
    }

    // stop polling, drop in-flight fetches and the push subscription
    pub async fn shutdown(self) -> Result<Engine, JoinError> {
        let _ = self.shutdown.send(());
        self.task.await
    }
}

/// Run `engine` on its own task: poll `source` every `poll_interval`, merge
/// pushed records, apply operator commands, publish a snapshot after each change.
pub fn spawn<S>(
    engine: Engine,
    source: Arc<S>,
    subscription: Option<Subscription>,
    poll_interval: Duration,
) -> EngineHandle
where
    S: LogSource + ?Sized + 'static,
{
    let (commands_tx, commands_rx) = mpsc::unbounded();
    let (snapshots_tx, snapshots_rx) = watch::channel(engine.snapshot());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = task::spawn(run(
        engine,
        source,
        subscription,
        poll_interval,
        commands_rx,
        snapshots_tx,
        shutdown_rx,
    ));
    EngineHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        shutdown: shutdown_tx,
        task: task,
    }
}

async fn run<S>(
    mut engine: Engine,
    source: Arc<S>,
    subscription: Option<Subscription>,
    poll_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<ViewSnapshot>,
    mut shutdown: oneshot::Receiver<()>,
) -> Engine
where
    S: LogSource + ?Sized + 'static,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires right away
    let mut timer_poll = IntervalStream::new(ticker).fuse();

    // without a push channel the stream is terminated from the start
    let mut push = subscription.unwrap_or_else(|| Subscription::pair(1).1);

    let mut fetches = FuturesUnordered::<Fetch>::new();

    info!("Engine started, polling every `{poll_interval:?}`.");
    loop {
        // teardown wins over any other ready branch
        let changed = select_biased! {
            // teardown, or the handle was dropped
            _ = shutdown => break,

            _i = timer_poll.select_next_some() => {
                let cycle = engine.begin_cycle();
                let source = Arc::clone(&source);
                fetches.push(
                    async move {
                        let result = source.fetch().await;
                        (cycle, result)
                    }
                    .boxed()
                );
                false
            },

            (cycle, result) = fetches.select_next_some() => {
                engine.complete_cycle(cycle, result)
            },

            record = push.select_next_some() => {
                engine.deliver(record)
            },

            command = commands.select_next_some() => {
                engine.apply_or_warn(command);
                true
            },

            complete => break,
        };
        if changed {
            snapshots.send_replace(engine.snapshot());
        }
    }
    if !fetches.is_empty() {
        debug!("Dropped `{}` in-flight poll cycles.", fetches.len());
    }
    info!("Engine stopped.");
    engine
}
