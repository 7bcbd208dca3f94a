pub mod evict_list;
pub mod node_arena;
pub mod pause_ticker;

pub use node_arena::NodeId;
pub use pause_ticker::PauseTicker;

pub(crate) use evict_list::EvictList;
pub(crate) use node_arena::{Node, NodeArena};
