/// A `Future` that is `Send`.
macro_rules! future_send {
    ($t:ty) => {
        impl ::core::future::Future<Output = $t> + Send
    };
}

/// A `Stream` that is `Send` and borrows from `'a`.
macro_rules! stream_send {
    ($t:ty, $a:lifetime) => {
        impl ::futures::Stream<Item = $t> + Send + $a
    };
}

pub(crate) use {future_send, stream_send};
