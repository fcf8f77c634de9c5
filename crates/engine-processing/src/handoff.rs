use model::records::slab::Slab;
use tokio::sync::mpsc;

/// Slabs that may sit between the reader and the writer. With one slot the
/// reader can run at most one slab ahead of the slab being written.
pub const HANDOFF_CAPACITY: usize = 1;

pub type SlabSender = mpsc::Sender<Slab>;
pub type SlabReceiver = mpsc::Receiver<Slab>;

pub fn slab_channel() -> (SlabSender, SlabReceiver) {
    mpsc::channel(HANDOFF_CAPACITY)
}
