use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use spin::Mutex;

use crate::{HdlcFramer, TraceError, TraceHook, MAX_RECORD_LEN};

struct Inner<W> {
    writer: W,
    framer: HdlcFramer,
}

/// Streams framed records into any `Write` implementation (stdout, a TCP
/// stream to a host-side viewer, a file).
pub struct WriterSink<W: Write + Send + 'static> {
    inner: Arc<Mutex<Inner<W>>>,
    epoch: Instant,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                writer,
                framer: HdlcFramer::new(),
            })),
            epoch: Instant::now(),
        }
    }

    pub fn hook(&self) -> TraceHook {
        let inner = Arc::clone(&self.inner);
        let epoch = self.epoch;
        Arc::new(move |record, payload, with_timestamp| {
            if payload.len() > MAX_RECORD_LEN {
                return Err(TraceError::PayloadTooLarge(payload.len()));
            }
            let timestamp = with_timestamp.then(|| epoch.elapsed().as_micros() as u32);
            let mut guard = inner.lock();
            let frame = guard.framer.encode(record, timestamp, payload);
            guard.writer.write_all(&frame)?;
            Ok(())
        })
    }

    /// Flushes and hands back the writer once no hook is alive.
    pub fn into_writer(self) -> Option<W> {
        let inner = Arc::try_unwrap(self.inner).ok()?;
        let mut inner = inner.into_inner();
        inner.writer.flush().ok()?;
        Some(inner.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_writes_flag_terminated_frames() {
        let sink = WriterSink::new(Vec::new());
        let hook = sink.hook();

        hook(crate::records::qf::TICK, &[0], false).unwrap();
        hook(crate::records::qf::TICK, &[0], false).unwrap();
        drop(hook);

        let bytes = sink.into_writer().expect("hook dropped");
        assert_eq!(bytes.iter().filter(|&&b| b == 0x7E).count(), 2);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[5], 2);
    }
}
