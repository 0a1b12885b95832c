//! Size guard applied before and during a download.
//!
//! A caller-supplied ceiling is a hard contract. When the store declares the
//! object size up front the guard rejects before any body bytes move; when it
//! does not, the body is metered chunk by chunk and rejected as soon as the
//! running count crosses the ceiling.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::client::BodyStream;
use crate::types::{Error, ObjectRef, Result};

/// Decision of [`SizeGuard::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The object fits, or there is no ceiling.
    Admit,
    /// Size is unknown; the body must be metered while streaming.
    Deferred,
    /// The declared size exceeds the ceiling.
    Reject { size: u64, limit: u64 },
}

/// Byte ceiling for a single retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeGuard {
    ceiling: Option<u64>,
}

impl SizeGuard {
    /// Creates a guard; `None` admits everything.
    #[inline]
    pub fn new(ceiling: Option<u64>) -> Self {
        Self { ceiling }
    }

    /// Returns the configured ceiling.
    #[inline]
    pub fn ceiling(&self) -> Option<u64> {
        self.ceiling
    }

    /// Decides on a declared size before any body transfer.
    pub fn admit(&self, declared: Option<u64>) -> Admission {
        match (self.ceiling, declared) {
            (None, _) => Admission::Admit,
            (Some(limit), Some(size)) if size > limit => Admission::Reject { size, limit },
            (Some(_), Some(_)) => Admission::Admit,
            (Some(_), None) => Admission::Deferred,
        }
    }

    /// Checks the running byte count of a body being streamed.
    ///
    /// Returns the rejection once `total` exceeds the ceiling.
    pub fn check_running(&self, total: u64) -> std::result::Result<(), Admission> {
        match self.ceiling {
            Some(limit) if total > limit => Err(Admission::Reject { size: total, limit }),
            _ => Ok(()),
        }
    }

    /// Like [`admit`](Self::admit), as an error for `object` on rejection.
    pub fn admit_object(&self, object: &ObjectRef, declared: Option<u64>) -> Result<Admission> {
        match self.admit(declared) {
            Admission::Reject { size, limit } => Err(Error::too_large(object, size, limit)),
            admission => Ok(admission),
        }
    }

    /// Like [`check_running`](Self::check_running), as an error for `object`.
    pub fn check_object(&self, object: &ObjectRef, total: u64) -> Result<()> {
        self.check_running(total).map_err(|rejection| match rejection {
            Admission::Reject { size, limit } => Error::too_large(object, size, limit),
            _ => Error::too_large(object, total, self.ceiling.unwrap_or_default()),
        })
    }
}

/// Reads a whole body into memory under `guard`.
///
/// On rejection the buffered bytes are dropped; a partial body is never
/// returned.
pub(crate) async fn collect_body(
    mut body: BodyStream,
    guard: SizeGuard,
    object: &ObjectRef,
    size_hint: u64,
) -> Result<Bytes> {
    let capacity = match guard.ceiling() {
        Some(limit) => size_hint.min(limit),
        None => size_hint,
    };
    // Cap the up-front allocation; the buffer grows as chunks arrive.
    let mut buffer = BytesMut::with_capacity(capacity.min(8 * 1024 * 1024) as usize);

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        guard.check_object(object, (buffer.len() + chunk.len()) as u64)?;
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::types::ErrorKind;

    fn body(chunks: &[&'static [u8]]) -> BodyStream {
        let items: Vec<Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        Box::pin(stream::iter(items))
    }

    fn object() -> ObjectRef {
        ObjectRef::new("bucket", "key.bin").unwrap()
    }

    #[test]
    fn no_ceiling_always_admits() {
        let guard = SizeGuard::new(None);
        assert_eq!(guard.admit(Some(u64::MAX)), Admission::Admit);
        assert_eq!(guard.admit(None), Admission::Admit);
        assert!(guard.check_running(u64::MAX).is_ok());
    }

    #[test]
    fn declared_size_is_checked_up_front() {
        let guard = SizeGuard::new(Some(100));
        assert_eq!(guard.admit(Some(100)), Admission::Admit);
        assert_eq!(
            guard.admit(Some(101)),
            Admission::Reject {
                size: 101,
                limit: 100
            }
        );
    }

    #[test]
    fn unknown_size_is_deferred() {
        let guard = SizeGuard::new(Some(10));
        assert_eq!(guard.admit(None), Admission::Deferred);
        assert!(guard.check_running(10).is_ok());
        assert!(guard.check_running(11).is_err());
    }

    #[test]
    fn admit_object_reports_too_large() {
        let guard = SizeGuard::new(Some(1));
        let err = guard.admit_object(&object(), Some(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLarge);
    }

    #[tokio::test]
    async fn collect_within_ceiling() {
        let guard = SizeGuard::new(Some(6));
        let data = collect_body(body(&[b"abc", b"def"]), guard, &object(), 0)
            .await
            .unwrap();
        assert_eq!(&data[..], b"abcdef");
    }

    #[tokio::test]
    async fn collect_rejects_mid_stream() {
        let guard = SizeGuard::new(Some(4));
        let err = collect_body(body(&[b"abc", b"def", b"ghi"]), guard, &object(), 0)
            .await
            .unwrap_err();
        match err {
            Error::TooLarge { size, limit, .. } => {
                assert_eq!(size, 6);
                assert_eq!(limit, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
