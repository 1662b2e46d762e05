//! Fakes for the port traits, shared by the unit tests.

use crate::ports;
use crate::types::push::{PushMessage, Subscription};

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::oneshot;

#[derive(Clone)]
pub(crate) struct TestTime {
    now: Arc<Mutex<OffsetDateTime>>,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn set_now(&self, now: OffsetDateTime) {
        *self.now.lock().expect("now lock") = now;
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub(crate) fn pending_sleeps(&self) -> usize {
        self.sleeps.lock().expect("sleeps lock").len()
    }

    pub(crate) fn trigger_all(&self) {
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }
}

pub(crate) struct ManualSleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = ManualSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("now lock")
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        let (sender, receiver) = oneshot::channel();
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        self.sleeps.lock().expect("sleeps lock").push(sender);
        ManualSleep { receiver }
    }
}

#[derive(Debug)]
pub(crate) struct TestSendError;

impl std::fmt::Display for TestSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("test send error")
    }
}

/// Records every push; endpoints registered with `fail_endpoint` return an error.
#[derive(Clone, Default)]
pub(crate) struct TestPushSender {
    sent: Arc<Mutex<Vec<(String, PushMessage)>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl TestPushSender {
    pub(crate) fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn fail_endpoint(&self, endpoint: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .push(endpoint.to_string());
    }
}

impl ports::PushSender for TestPushSender {
    type Error = TestSendError;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        message: &'a PushMessage,
    ) -> Self::Fut<'a> {
        let failing = self.failing.lock().expect("failing lock");
        if failing.contains(&subscription.endpoint) {
            return std::future::ready(Err(TestSendError));
        }
        self.sent
            .lock()
            .expect("sent lock")
            .push((subscription.endpoint.clone(), message.clone()));
        std::future::ready(Ok(()))
    }
}

#[derive(Clone, Default)]
pub(crate) struct TestSmsSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<Mutex<bool>>,
}

impl TestSmsSender {
    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn fail_all(&self) {
        *self.fail.lock().expect("fail lock") = true;
    }
}

impl ports::SmsSender for TestSmsSender {
    type Error = TestSendError;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn send<'a>(&'a self, phone: &'a str, text: &'a str) -> Self::Fut<'a> {
        if *self.fail.lock().expect("fail lock") {
            return std::future::ready(Err(TestSendError));
        }
        self.sent
            .lock()
            .expect("sent lock")
            .push((phone.to_string(), text.to_string()));
        std::future::ready(Ok(()))
    }
}

/// Holds every send until `release` is called; `entered` resolves once a send started.
#[derive(Clone, Default)]
pub(crate) struct GatedSmsSender {
    inner: TestSmsSender,
    entered: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
}

impl GatedSmsSender {
    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.inner.sent()
    }

    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }
}

impl ports::SmsSender for GatedSmsSender {
    type Error = TestSendError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, phone: &'a str, text: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            self.entered.notify_one();
            self.release.notified().await;
            ports::SmsSender::send(&self.inner, phone, text).await
        })
    }
}
