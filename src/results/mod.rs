pub mod store;
pub mod view;

pub use store::{parse_record_id, ResultStore, RESULTS_SLOT};
pub use view::{filter_by, LabelFilter, ResultsView, Selection};
