pub trait SmsSender: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    /// `phone` is the raw number as captured at intake; senders normalize it.
    fn send<'a>(&'a self, phone: &'a str, text: &'a str) -> Self::Fut<'a>;
}
