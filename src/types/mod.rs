pub mod date_window;
pub mod gridded_field;
pub mod parameter;
pub mod station;
pub mod station_table;
