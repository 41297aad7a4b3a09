use std::cell::Cell;
use std::io::Read;
use std::rc::Rc;

use crate::alloc;
use crate::cache::BlockCache;
use crate::errors::{ByteSourceError, Result};
use crate::reader::CachingReader;
use crate::source::ByteSource;
use crate::util::skip_bytes;

/// A [`ByteSource`] over a forward-only, read-once channel.
///
/// Bytes are pulled from the channel lazily, in blocks, and cached for the
/// lifetime of the source, so range reads and readers may revisit any
/// offset without the channel being read twice.
pub struct StreamByteSource<R> {
    cache: Rc<BlockCache<R>>,
    length: Cell<Option<u64>>,
    file_name: Option<String>,
}

impl<R: Read> StreamByteSource<R> {
    pub fn new(channel: R, file_name: Option<String>) -> Self {
        let label = file_name.clone().unwrap_or_else(|| "stream".to_owned());
        Self {
            cache: Rc::new(BlockCache::new(label, channel)),
            length: Cell::new(None),
            file_name,
        }
    }

    /// Returns a new reader positioned at the logical start.
    pub fn reader(&self) -> CachingReader<R> {
        CachingReader::new(Rc::clone(&self.cache))
    }

    /// Total length of the source.
    ///
    /// The first call pulls the whole channel into the cache; the result is
    /// memoized.
    pub fn length(&self) -> Result<u64> {
        if let Some(length) = self.length.get() {
            return Ok(length);
        }

        let length = {
            let mut reader = self.reader();
            reader.skip(u64::MAX)?
        };
        log::debug!(
            "byte-source/{}: length is {} bytes",
            self.cache.label(),
            length
        );
        self.length.set(Some(length));
        Ok(length)
    }

    /// Reads exactly `length` bytes starting at `from`.
    pub fn bytes_at(&self, from: u64, length: usize) -> Result<Vec<u8>> {
        let size = self.length()?;
        let in_range = from
            .checked_add(length as u64)
            .map_or(false, |end| end <= size);
        if !in_range {
            log::debug!(
                "byte-source/{}: rejected range {}+{} of {}",
                self.cache.label(),
                from,
                length,
                size
            );
            return Err(ByteSourceError::InvalidRange { from, length, size });
        }

        let mut reader = self.reader();
        skip_bytes(&mut reader, from)?;

        let mut bytes = alloc::byte_array(length)?;
        let mut total = 0;
        while total < length {
            let read = reader.read_into(&mut bytes, total, length - total)?;
            if read < 1 {
                return Err(ByteSourceError::ShortRead {
                    from,
                    length,
                    read: total,
                });
            }
            total += read;
        }
        Ok(bytes)
    }

    /// Lengths of the blocks pulled from the channel so far.
    pub fn cached_blocks(&self) -> Vec<usize> {
        self.cache.cached_blocks()
    }
}

impl<R: Read> ByteSource for StreamByteSource<R> {
    type Reader = CachingReader<R>;

    fn open_reader(&self) -> Result<Self::Reader> {
        Ok(self.reader())
    }

    fn read_range(&self, from: u64, length: usize) -> Result<Vec<u8>> {
        self.bytes_at(from, length)
    }

    fn size(&self) -> Result<u64> {
        self.length()
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use rstest::rstest;
    use std::io::{self, Cursor};

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 253) as u8).collect()
    }

    /// Channel that counts the calls and bytes it serves.
    struct Counting {
        inner: Cursor<Vec<u8>>,
        calls: Rc<Cell<usize>>,
        served: Rc<Cell<usize>>,
    }

    impl Counting {
        fn new(data: Vec<u8>) -> Self {
            Self {
                inner: Cursor::new(data),
                calls: Rc::new(Cell::new(0)),
                served: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Read for Counting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls.set(self.calls.get() + 1);
            let n = self.inner.read(buf)?;
            self.served.set(self.served.get() + n);
            Ok(n)
        }
    }

    /// Fails once when the read position reaches `fail_at`.
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        fail_at: Option<u64>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let pos = self.inner.position();
            match self.fail_at {
                Some(at) if pos == at => {
                    self.fail_at = None;
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
                }
                Some(at) => {
                    let n = buf.len().min((at - pos) as usize);
                    self.inner.read(&mut buf[..n])
                }
                None => self.inner.read(buf),
            }
        }
    }

    fn source_over(len: usize) -> StreamByteSource<Cursor<Vec<u8>>> {
        StreamByteSource::new(Cursor::new(pattern(len)), None)
    }

    #[test]
    fn scenario_2500_bytes() {
        let source = source_over(2500);
        assert_eq!(source.size().unwrap(), 2500);
        assert_eq!(
            source.read_range(1000, 600).unwrap(),
            &pattern(2500)[1000..1600]
        );

        let mut drained = Vec::new();
        source
            .open_reader()
            .unwrap()
            .read_to_end(&mut drained)
            .unwrap();
        assert_eq!(drained, pattern(2500));
        assert_eq!(source.cached_blocks(), vec![1024, 1024, 452]);
    }

    #[rstest]
    #[case(2490, 20)]
    #[case(2501, 0)]
    #[case(0, 2501)]
    #[case(u64::MAX, 10)]
    #[case(u64::MAX - 5, usize::MAX)]
    fn invalid_ranges(#[case] from: u64, #[case] length: usize) {
        let source = source_over(2500);
        match source.read_range(from, length) {
            Err(ByteSourceError::InvalidRange {
                from: f,
                length: l,
                size,
            }) => {
                assert_eq!((f, l, size), (from, length, 2500));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2500, 0)]
    #[case(0, 2500)]
    #[case(1023, 2)]
    #[case(2499, 1)]
    fn edge_ranges(#[case] from: u64, #[case] length: usize) {
        let source = source_over(2500);
        let start = from as usize;
        assert_eq!(
            source.read_range(from, length).unwrap(),
            &pattern(2500)[start..start + length]
        );
    }

    #[test]
    fn single_block_source() {
        let source = source_over(1024);
        assert_eq!(source.size().unwrap(), 1024);
        assert_eq!(source.cached_blocks(), vec![1024]);

        let head = source.cache.head().unwrap().unwrap();
        assert!(head.resolve_next(&source.cache).unwrap().is_none());
        assert!(head.resolve_next(&source.cache).unwrap().is_none());
    }

    #[test]
    fn empty_source() {
        let source = source_over(0);
        assert_eq!(source.size().unwrap(), 0);
        assert!(source.read_range(0, 0).unwrap().is_empty());
        assert!(source.read_range(0, 1).is_err());
    }

    #[test]
    fn length_is_memoized() {
        let channel = Counting::new(pattern(5000));
        let calls = Rc::clone(&channel.calls);
        let source = StreamByteSource::new(channel, None);

        assert_eq!(source.size().unwrap(), 5000);
        let after_first = calls.get();
        assert_eq!(source.size().unwrap(), 5000);
        assert_eq!(calls.get(), after_first);
    }

    #[test]
    fn channel_is_read_at_most_once_per_byte() {
        let data = pattern(10_000);
        let channel = Counting::new(data.clone());
        let calls = Rc::clone(&channel.calls);
        let served = Rc::clone(&channel.served);
        let source = StreamByteSource::new(channel, Some("count".to_owned()));

        for (from, length) in [(9000, 1000), (0, 10), (4000, 3000), (0, 10)] {
            let start = from as usize;
            assert_eq!(
                source.read_range(from, length).unwrap(),
                &data[start..start + length]
            );
        }
        let mut reader = source.open_reader().unwrap();
        let mut all = Vec::new();
        reader.read_to_end(&mut all).unwrap();
        assert_eq!(all, data);

        assert_eq!(served.get(), data.len());
        assert!(calls.get() <= (data.len() + 1023) / 1024 + 1);
    }

    #[test]
    fn prefix_reads_do_not_drain_the_channel() {
        let source = source_over(100_000);
        let mut reader = source.open_reader().unwrap();
        let mut head = [0u8; 10];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(source.cached_blocks(), vec![1024]);
    }

    #[test]
    fn channel_failure_propagates_and_keeps_pulled_bytes() {
        let data = pattern(3000);
        let source = StreamByteSource::new(
            Flaky {
                inner: Cursor::new(data.clone()),
                fail_at: Some(1500),
            },
            None,
        );

        match source.size() {
            Err(ByteSourceError::Io(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::ConnectionReset)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(source.cached_blocks(), vec![1024]);

        assert_eq!(source.size().unwrap(), 3000);
        assert_eq!(source.read_range(1000, 2000).unwrap(), &data[1000..]);
    }

    #[test]
    fn file_name_is_reported() {
        let source =
            StreamByteSource::new(Cursor::new(vec![1u8]), Some("a.png".to_owned()));
        assert_eq!(source.file_name(), Some("a.png"));
        assert_eq!(source.description(), "a.png");
    }

    #[derive(Clone, Debug)]
    struct Payload(Vec<u8>);

    impl Arbitrary for Payload {
        fn arbitrary(g: &mut Gen) -> Self {
            let len = usize::arbitrary(g) % 5000;
            Payload((0..len).map(|_| u8::arbitrary(g)).collect())
        }
    }

    #[quickcheck]
    fn prop_ranges_match_the_channel(
        Payload(data): Payload,
        ranges: Vec<(u16, u16)>,
    ) -> bool {
        let source = StreamByteSource::new(Cursor::new(data.clone()), None);
        ranges.into_iter().all(|(from, length)| {
            let (from, length) = (from as usize, length as usize);
            match source.read_range(from as u64, length) {
                Ok(bytes) => {
                    from + length <= data.len()
                        && bytes == data[from..from + length]
                }
                Err(ByteSourceError::InvalidRange { .. }) => {
                    from + length > data.len()
                }
                Err(_) => false,
            }
        })
    }

    #[quickcheck]
    fn prop_length_matches_the_channel(Payload(data): Payload) -> bool {
        let source = StreamByteSource::new(Cursor::new(data.clone()), None);
        source.size().unwrap() == data.len() as u64
            && source.size().unwrap() == data.len() as u64
    }

    #[quickcheck]
    fn prop_skip_then_read(Payload(data): Payload, n: u16) -> bool {
        let source = StreamByteSource::new(Cursor::new(data.clone()), None);
        let mut reader = source.reader();
        let skipped = reader.skip(n as u64).unwrap() as usize;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        skipped == data.len().min(n as usize) && rest == data[skipped..]
    }
}
