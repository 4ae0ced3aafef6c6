pub mod contrast_file;
pub mod events_table;
