mod cursor;
mod eval;
mod exec;
mod parse;
mod types;

pub use cursor::Cursor;
pub use eval::{compare_bson, compare_docs, eval_filter, project_fields};
pub use exec::{apply_update, shape_results, upsert_seed};
pub(crate) use eval::get_path;
pub use parse::{parse_selector, parse_update};
pub use types::{
    CmpOp, DeleteReport, Filter, FindOptions, IndexOptions, Order, SortSpec, UpdateDoc, UpdateOptions,
    UpdateReport,
};
