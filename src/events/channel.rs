//! Event delivery over crossbeam-channel.

use super::{Event, Progress};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiving half of an [`EventChannel`]
pub type EventReceiver = Receiver<Event>;

/// Sends pipeline events to an optional subscriber.
///
/// The default sender is disconnected and drops every event, which is what
/// [`null_sender`] hands out for runs without a front end.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Send an event. Events are discarded once the receiver is gone.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// Adapt a phase's per-item progress hook into numbered [`Progress`] events.
    ///
    /// `wrap` places the payload in the phase's event variant.
    pub fn ticker(&self, total: usize, wrap: fn(Progress) -> Event) -> ProgressTicker<'_> {
        ProgressTicker {
            events: self,
            completed: AtomicUsize::new(0),
            total,
            wrap,
        }
    }
}

/// Counts completed items for one phase and reports each one.
///
/// `tick` may be called from rayon workers; every call gets a distinct
/// `completed` value in `1..=n`.
pub struct ProgressTicker<'a> {
    events: &'a EventSender,
    completed: AtomicUsize,
    total: usize,
    wrap: fn(Progress) -> Event,
}

impl ProgressTicker<'_> {
    /// Record one finished item
    pub fn tick(&self) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.send((self.wrap)(Progress {
            completed,
            total: self.total,
        }));
    }
}

/// Factory for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded channel, so senders on worker threads never block.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender {
                inner: Some(sender),
            },
            receiver,
        )
    }
}

/// A sender whose events go nowhere
pub fn null_sender() -> EventSender {
    EventSender::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FingerprintEvent, GroupEvent, PipelineEvent, ScanEvent};
    use std::thread;

    fn fingerprint_progress(progress: Progress) -> Event {
        Event::Fingerprint(FingerprintEvent::Progress(progress))
    }

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Scan(ScanEvent::Completed { total_images: 25 }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Scan(ScanEvent::Completed { total_images }) => {
                assert_eq!(total_images, 25);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn ticker_numbers_progress_from_one() {
        let (sender, receiver) = EventChannel::new();

        let ticker = sender.ticker(3, |p| Event::Group(GroupEvent::Progress(p)));
        ticker.tick();
        ticker.tick();
        ticker.tick();
        drop(ticker);
        drop(sender);

        let progress: Vec<Progress> = receiver
            .iter()
            .map(|event| match event {
                Event::Group(GroupEvent::Progress(p)) => p,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(
            progress,
            (1..=3)
                .map(|completed| Progress { completed, total: 3 })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn ticker_counts_every_tick_from_many_threads() {
        let (sender, receiver) = EventChannel::new();
        let ticker = sender.ticker(40, fingerprint_progress);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        ticker.tick();
                    }
                });
            }
        });
        drop(ticker);
        drop(sender);

        let mut completed: Vec<usize> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Fingerprint(FingerprintEvent::Progress(p)) => Some(p.completed),
                _ => None,
            })
            .collect();
        completed.sort_unstable();
        assert_eq!(completed, (1..=40).collect::<Vec<_>>());
    }

    #[test]
    fn null_sender_discards_events() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.ticker(1, fingerprint_progress).tick();
    }

    #[test]
    fn send_after_receiver_dropped_is_ignored() {
        let (sender, receiver) = EventChannel::new();
        drop(receiver);

        sender.send(Event::Pipeline(PipelineEvent::Started));
    }
}
