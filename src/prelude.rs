pub use crate::cache::{CacheConfig, RawCache};
pub use crate::ds::PauseTicker;
pub use crate::error::{CacheError, Result};
pub use crate::policy::PolicyKind;
pub use crate::store::Store;
pub use crate::typed::Cache;
