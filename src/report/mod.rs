pub mod console;
pub mod csv;
pub mod html;
pub mod report_model;
