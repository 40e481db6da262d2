pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{header, info, item, section, success, summary_row, warn};
pub use table::{count_table, property_table};
pub use theme::{theme, Theme};
