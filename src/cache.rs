use std::cell::RefCell;
use std::io::{self, BufReader, Read};
use std::rc::Rc;

/// Size of every cached block except, possibly, the last one.
pub const BLOCK_SIZE: usize = 1024;

/// Forward link of a [`CacheBlock`] (and of the cache head).
///
/// `End` is only recorded once the channel reported end of data, so a
/// resolved link is never pulled again.
#[derive(Debug, Clone)]
pub(crate) enum Link {
    Unresolved,
    Block(Rc<CacheBlock>),
    End,
}

impl Link {
    /// `None` while unresolved, otherwise the resolved successor.
    fn resolved(&self) -> Option<Option<Rc<CacheBlock>>> {
        match self {
            Link::Unresolved => None,
            Link::Block(block) => Some(Some(Rc::clone(block))),
            Link::End => Some(None),
        }
    }
}

/// An immutable chunk of bytes pulled from the channel.
#[derive(Debug)]
pub(crate) struct CacheBlock {
    bytes: Box<[u8]>,
    next: RefCell<Link>,
}

impl CacheBlock {
    fn new(bytes: Vec<u8>) -> Rc<Self> {
        Rc::new(Self {
            bytes: bytes.into_boxed_slice(),
            next: RefCell::new(Link::Unresolved),
        })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the block following this one, pulling it from the channel
    /// the first time it is asked for.
    pub(crate) fn resolve_next<R: Read>(
        &self,
        cache: &BlockCache<R>,
    ) -> io::Result<Option<Rc<CacheBlock>>> {
        resolve_link(&self.next, || cache.pull_next_block())
    }

    #[cfg(test)]
    pub(crate) fn next_link(&self) -> Link {
        self.next.borrow().clone()
    }
}

fn resolve_link(
    link: &RefCell<Link>,
    pull: impl FnOnce() -> io::Result<Option<Rc<CacheBlock>>>,
) -> io::Result<Option<Rc<CacheBlock>>> {
    let resolved = link.borrow().resolved();
    if let Some(block) = resolved {
        return Ok(block);
    }

    // An error leaves the link unresolved.
    let pulled = pull()?;
    *link.borrow_mut() = match &pulled {
        Some(block) => Link::Block(Rc::clone(block)),
        None => Link::End,
    };
    Ok(pulled)
}

/// Scratch space for the next block.
///
/// `filled` survives a failed pull so bytes already taken from the channel
/// are kept for the retry.
struct PullBuffer {
    bytes: Vec<u8>,
    filled: usize,
}

impl PullBuffer {
    fn new() -> Self {
        Self {
            bytes: vec![0; BLOCK_SIZE],
            filled: 0,
        }
    }
}

/// Append-only chain of blocks over a forward-only channel.
///
/// Blocks are pulled lazily by whichever reader first walks past the
/// frontier and are never discarded. The cache is single-threaded: it
/// relies on `Rc`/`RefCell` and is therefore neither `Send` nor `Sync`.
pub(crate) struct BlockCache<R> {
    label: String,
    channel: RefCell<BufReader<R>>,
    scratch: RefCell<Option<PullBuffer>>,
    head: RefCell<Link>,
}

impl<R: Read> BlockCache<R> {
    pub(crate) fn new(label: String, channel: R) -> Self {
        Self {
            label,
            channel: RefCell::new(BufReader::new(channel)),
            scratch: RefCell::new(None),
            head: RefCell::new(Link::Unresolved),
        }
    }

    /// Returns the first block, pulling it on first demand.
    pub(crate) fn head(&self) -> io::Result<Option<Rc<CacheBlock>>> {
        resolve_link(&self.head, || self.pull_next_block())
    }

    /// Pulls up to [`BLOCK_SIZE`] bytes from the channel into a new block.
    ///
    /// A full pull hands the scratch buffer itself to the block; the next
    /// pull allocates a fresh one. A short pull (the last block) copies the
    /// bytes out and keeps the scratch buffer. `None` means the channel has
    /// no more data.
    fn pull_next_block(&self) -> io::Result<Option<Rc<CacheBlock>>> {
        let mut scratch = self.scratch.borrow_mut();
        let pull = scratch.get_or_insert_with(PullBuffer::new);

        fill(&mut *self.channel.borrow_mut(), pull)?;
        let read = pull.filled;
        pull.filled = 0;

        if read == 0 {
            log::trace!("byte-source/{}: end of channel", self.label);
            return Ok(None);
        }

        if read == BLOCK_SIZE {
            log::trace!("byte-source/{}: pulled full block", self.label);
            return Ok(scratch
                .take()
                .map(|full| CacheBlock::new(full.bytes)));
        }

        log::trace!(
            "byte-source/{}: pulled last block of {} bytes",
            self.label,
            read
        );
        Ok(Some(CacheBlock::new(pull.bytes[..read].to_vec())))
    }

    /// Lengths of the blocks pulled so far, without pulling more.
    pub(crate) fn cached_blocks(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut link = self.head.borrow().clone();
        while let Link::Block(block) = link {
            lengths.push(block.len());
            link = block.next.borrow().clone();
        }
        lengths
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

/// Reads until the pull buffer is full or the channel reports end of data.
fn fill<R: Read>(channel: &mut R, pull: &mut PullBuffer) -> io::Result<()> {
    while pull.filled < pull.bytes.len() {
        match channel.read(&mut pull.bytes[pull.filled..]) {
            Ok(0) => break,
            Ok(n) => pull.filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl<R> Drop for BlockCache<R> {
    // Unlinks the chain iteratively; dropping it recursively would
    // overflow the stack on long sources.
    fn drop(&mut self) {
        let mut link = std::mem::replace(self.head.get_mut(), Link::End);
        while let Link::Block(block) = link {
            link = match Rc::try_unwrap(block) {
                Ok(block) => block.next.into_inner(),
                Err(_) => break,
            };
        }
    }
}
