use std::sync::Arc;

use billing_client::{CustomerDirectory, MonthReadingProvider};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::{
    calendar::CalendarWidget,
    dashboard::{Command, Dashboard, Event, Frontend},
    fetcher::settle_all,
};

const COMPLETION_CAPACITY: usize = 64;

/// The API collaborators behind the dashboard.
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<dyn CustomerDirectory>,
    pub readings: Arc<dyn MonthReadingProvider>,
}

impl Services {
    pub fn new<A>(api: Arc<A>) -> Self
    where
        A: CustomerDirectory + MonthReadingProvider + 'static,
    {
        Self {
            directory: api.clone(),
            readings: api,
        }
    }
}

/// Carry out one command and return the event reporting its completion.
pub async fn perform(command: Command, services: &Services) -> Event {
    match command {
        Command::LoadCustomers => Event::CustomersLoaded(services.directory.list_customers().await),
        Command::Prefetch {
            generation,
            customer,
            months,
        } => {
            let results = settle_all(services.readings.as_ref(), &customer, &months).await;
            Event::PrefetchSettled { generation, results }
        }
        Command::FetchMonth {
            generation,
            customer,
            month,
        } => {
            let result = services.readings.fetch_month(&customer, month).await;
            Event::MonthFetched {
                generation,
                month,
                result,
            }
        }
    }
}

fn spawn_all(commands: Vec<Command>, services: &Services, tx: &mpsc::Sender<Event>) {
    for command in commands {
        let services = services.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = perform(command, &services).await;
            if tx.send(event).await.is_err() {
                tracing::debug!("event loop gone, dropping completion");
            }
        });
    }
}

/// Drive the dashboard until `inputs` ends.
///
/// User input and fetch completions are handled one at a time on this task;
/// network requests run as spawned tasks and report back over a channel.
pub async fn run<F, W, S>(
    mut dashboard: Dashboard<F, W>,
    services: Services,
    mut inputs: S,
) -> anyhow::Result<Dashboard<F, W>>
where
    F: Frontend,
    W: CalendarWidget,
    S: Stream<Item = Event> + Unpin,
{
    let (tx, mut completions) = mpsc::channel::<Event>(COMPLETION_CAPACITY);

    let startup = dashboard.start();
    spawn_all(startup, &services, &tx);

    loop {
        let event = tokio::select! {
            input = inputs.next() => match input {
                Some(event) => event,
                None => break,
            },
            Some(event) = completions.recv() => event,
        };

        let commands = dashboard.handle(event);
        spawn_all(commands, &services, &tx);
    }

    tracing::info!("input closed, shutting down");
    Ok(dashboard)
}
