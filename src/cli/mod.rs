pub mod command;
pub mod encode;
pub mod progress;
pub mod report;
